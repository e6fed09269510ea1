//! A named collection of query keys.

use std::collections::btree_map;
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{QueryError, Result};
use crate::key::QueryKey;

/// The untyped description of a registered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Registry name.
    pub name: String,
    /// Cache key name.
    pub key: &'static str,
    /// Endpoint path template.
    pub path: &'static str,
    /// Whether parameters are mandatory.
    pub requires_params: bool,
}

/// Groups the queries of one feature area under stable names.
///
/// # Example
///
/// ```
/// use oxide_query::{QueryKey, QueryRegistry};
///
/// const ALL: QueryKey<Vec<String>> = QueryKey::new("all", "/api/posts");
///
/// let mut registry = QueryRegistry::new();
/// registry.register("all", &ALL).unwrap();
/// assert_eq!(registry.get("all").unwrap().path, "/api/posts");
/// assert!(registry.register("all", &ALL).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    queries: BTreeMap<String, QueryDescriptor>,
}

impl QueryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query under `name`; names must be unique.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::DuplicateQuery`] when `name` is taken.
    pub fn register<T, P>(&mut self, name: &str, query: &QueryKey<T, P>) -> Result<()> {
        if self.queries.contains_key(name) {
            return Err(QueryError::DuplicateQuery(name.to_string()));
        }
        debug!(name, key = query.key(), path = query.path(), "Registering query");
        self.queries.insert(
            name.to_string(),
            QueryDescriptor {
                name: name.to_string(),
                key: query.key(),
                path: query.path(),
                requires_params: query.params_required(),
            },
        );
        Ok(())
    }

    /// Looks up a query by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&QueryDescriptor> {
        self.queries.get(name)
    }

    /// Iterates over queries in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, QueryDescriptor> {
        self.queries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<'a> IntoIterator for &'a QueryRegistry {
    type Item = &'a QueryDescriptor;
    type IntoIter = btree_map::Values<'a, String, QueryDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: QueryKey<Vec<String>, ()> = QueryKey::new("first", "/api/first").requires_params();
    const POSTS: QueryKey<Vec<String>> = QueryKey::new("all", "posts");

    #[test]
    fn test_register_and_iterate() {
        let mut registry = QueryRegistry::new();
        registry.register("posts", &POSTS).unwrap();
        registry.register("first", &FIRST).unwrap();

        let names: Vec<&str> = registry.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["first", "posts"]);
        assert!(registry.get("first").unwrap().requires_params);
        assert_eq!(registry.len(), 2);

        let mut paths = Vec::new();
        for query in &registry {
            paths.push(query.path);
        }
        assert_eq!(paths, vec!["/api/first", "posts"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = QueryRegistry::new();
        registry.register("posts", &POSTS).unwrap();
        let err = registry.register("posts", &FIRST).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateQuery(name) if name == "posts"));
        assert_eq!(registry.get("posts").unwrap().key, "all");
    }
}
