//! Typed query keys.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{QueryError, Result};

/// A segment of a query path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment<'a> {
    /// A literal segment.
    Literal(&'a str),
    /// A parameter segment (e.g., `{id}`).
    Param(&'a str),
}

fn segments(path: &str) -> impl Iterator<Item = PathSegment<'_>> {
    path.split('/').filter(|s| !s.is_empty()).map(|part| {
        part.strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .map_or(PathSegment::Literal(part), PathSegment::Param)
    })
}

/// Describes one server query: its cache key, its endpoint and the types
/// of its response (`T`) and parameters (`P`).
///
/// Keys are plain data and can be declared as constants.
///
/// # Example
///
/// ```
/// use oxide_query::QueryKey;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct Post {
///     id: u64,
///     title: String,
/// }
///
/// #[derive(Serialize)]
/// struct PostParams {
///     id: u64,
///     draft: bool,
/// }
///
/// const POST: QueryKey<Post, PostParams> = QueryKey::new("post", "/api/posts/{id}").requires_params();
///
/// let params = PostParams { id: 7, draft: true };
/// assert_eq!(POST.resolve_path(Some(&params)).unwrap(), "/api/posts/7?draft=true");
///
/// let post = POST.decode(r#"{"id": 7, "title": "Hello"}"#).unwrap();
/// assert_eq!(post.title, "Hello");
/// ```
pub struct QueryKey<T, P = ()> {
    key: &'static str,
    path: &'static str,
    requires_params: bool,
    _types: PhantomData<fn() -> (T, P)>,
}

impl<T, P> QueryKey<T, P> {
    /// Declares a query.
    #[must_use]
    pub const fn new(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            requires_params: false,
            _types: PhantomData,
        }
    }

    /// Marks the query as unusable without parameters.
    #[must_use]
    pub const fn requires_params(self) -> Self {
        Self {
            requires_params: true,
            ..self
        }
    }

    /// Returns the cache key name.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Returns the endpoint path template.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Whether parameters are mandatory.
    #[must_use]
    pub const fn params_required(&self) -> bool {
        self.requires_params
    }

    /// Names of the `{name}` segments in the path.
    #[must_use]
    pub fn path_params(&self) -> Vec<&'static str> {
        segments(self.path)
            .filter_map(|segment| match segment {
                PathSegment::Param(name) => Some(name),
                PathSegment::Literal(_) => None,
            })
            .collect()
    }

    fn invalid(&self, reason: impl Into<String>) -> QueryError {
        QueryError::InvalidParams {
            query: self.key.to_string(),
            reason: reason.into(),
        }
    }
}

impl<T, P: Serialize> QueryKey<T, P> {
    /// The cache key without parameters.
    #[must_use]
    pub fn base_key(&self) -> Vec<Value> {
        vec![Value::String(self.key.to_string())]
    }

    /// The cache key for a call with `params`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidParams`] when `params` cannot be
    /// serialised.
    pub fn key_with(&self, params: &P) -> Result<Vec<Value>> {
        let params = serde_json::to_value(params).map_err(|e| self.invalid(e.to_string()))?;
        let mut key = self.base_key();
        if !params.is_null() {
            key.push(params);
        }
        Ok(key)
    }

    /// Builds the request path.
    ///
    /// `{name}` segments are filled from the parameters; the remaining
    /// parameters become a query string in key order. `null` parameters are
    /// left out and arrays repeat their key.
    ///
    /// # Errors
    ///
    /// Fails when required parameters are absent, when a `{name}` segment
    /// has no value, or when a parameter is not a scalar.
    pub fn resolve_path(&self, params: Option<&P>) -> Result<String> {
        let mut remaining = match params {
            None if self.requires_params => {
                return Err(QueryError::MissingParams {
                    query: self.key.to_string(),
                })
            }
            None => BTreeMap::new(),
            Some(params) => self.param_map(params)?,
        };

        let mut path = String::new();
        if self.path.starts_with('/') {
            path.push('/');
        }
        let mut first = true;
        for segment in segments(self.path) {
            if !first {
                path.push('/');
            }
            first = false;
            match segment {
                PathSegment::Literal(part) => path.push_str(part),
                PathSegment::Param(name) => {
                    let value = remaining
                        .remove(name)
                        .filter(|value| !value.is_null())
                        .ok_or_else(|| QueryError::MissingPathParam {
                            query: self.key.to_string(),
                            param: name.to_string(),
                        })?;
                    path.push_str(&url_encode(&self.scalar_text(name, &value)?));
                }
            }
        }
        if self.path.ends_with('/') && !first {
            path.push('/');
        }

        let mut pairs = Vec::new();
        for (name, value) in &remaining {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        pairs.push((name.as_str(), self.scalar_text(name, item)?));
                    }
                }
                _ => pairs.push((name.as_str(), self.scalar_text(name, value)?)),
            }
        }
        if !pairs.is_empty() {
            let query: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
                .collect();
            path.push('?');
            path.push_str(&query.join("&"));
        }
        Ok(path)
    }

    fn param_map(&self, params: &P) -> Result<BTreeMap<String, Value>> {
        match serde_json::to_value(params).map_err(|e| self.invalid(e.to_string()))? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(BTreeMap::new()),
            other => Err(self.invalid(format!(
                "expected an object of named parameters, got {other}"
            ))),
        }
    }

    fn scalar_text(&self, name: &str, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.invalid(format!("parameter {name} is not a scalar"))),
        }
    }
}

impl<T: DeserializeOwned, P> QueryKey<T, P> {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Decode`] when the body does not match `T`.
    pub fn decode(&self, body: &str) -> Result<T> {
        Ok(serde_json::from_str(body)?)
    }
}

impl<T, P> Clone for QueryKey<T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for QueryKey<T, P> {}

impl<T, P> fmt::Debug for QueryKey<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryKey")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("requires_params", &self.requires_params)
            .finish_non_exhaustive()
    }
}

/// Percent-encodes a path segment or query component.
fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Item {
        name: String,
    }

    #[derive(Serialize)]
    struct Search {
        q: String,
        tags: Vec<String>,
        page: Option<u32>,
    }

    #[derive(Serialize)]
    struct ById {
        id: u32,
    }

    const ITEMS: QueryKey<Vec<Item>, Search> = QueryKey::new("items", "/api/items");
    const ITEM: QueryKey<Item, ById> = QueryKey::new("item", "/api/items/{id}/").requires_params();
    const PING: QueryKey<String> = QueryKey::new("ping", "ping");

    #[test]
    fn test_query_string_sorted_and_encoded() {
        let search = Search {
            q: "rust & forms".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            page: None,
        };
        let path = ITEMS.resolve_path(Some(&search)).unwrap();
        assert_eq!(path, "/api/items?q=rust%20%26%20forms&tags=a&tags=b");
    }

    #[test]
    fn test_path_params() {
        assert_eq!(ITEM.path_params(), vec!["id"]);
        assert_eq!(ITEM.resolve_path(Some(&ById { id: 3 })).unwrap(), "/api/items/3/");
        assert!(ITEM.params_required());
    }

    #[test]
    fn test_required_params_missing() {
        let err = ITEM.resolve_path(None).unwrap_err();
        assert!(matches!(err, QueryError::MissingParams { query } if query == "item"));
    }

    #[test]
    fn test_missing_path_param() {
        const USER: QueryKey<Item, Search> = QueryKey::new("user", "/users/{id}");
        let search = Search {
            q: String::new(),
            tags: Vec::new(),
            page: Some(1),
        };
        let err = USER.resolve_path(Some(&search)).unwrap_err();
        assert!(matches!(err, QueryError::MissingPathParam { param, .. } if param == "id"));
    }

    #[test]
    fn test_unit_params() {
        assert_eq!(PING.resolve_path(None).unwrap(), "ping");
        assert_eq!(PING.resolve_path(Some(&())).unwrap(), "ping");
        assert_eq!(PING.key_with(&()).unwrap(), vec![Value::from("ping")]);
    }

    #[test]
    fn test_key_with_params() {
        let key = ITEM.key_with(&ById { id: 9 }).unwrap();
        assert_eq!(key, vec![Value::from("item"), serde_json::json!({"id": 9})]);
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            ITEM.decode(r#"{"name": "bolt"}"#).unwrap(),
            Item {
                name: "bolt".to_string()
            }
        );
        assert!(matches!(ITEM.decode("[]"), Err(QueryError::Decode(_))));
    }
}
