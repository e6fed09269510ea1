//! Field paths into a form's value set.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{FormError, Result};

/// How many `null` slots a write may pad onto the end of a list.
const MAX_INDEX_GAP: usize = 1024;

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// An object key (e.g., `street` in `address.street`).
    Key(String),
    /// An array index (e.g., `0` in `items[0]` or `items.0`).
    Index(usize),
}

/// A parsed, canonical address of one field in a value set.
///
/// Dot and bracket notation are both accepted and normalised to dots, so
/// `items[0].name` and `items.0.name` name the same field.
///
/// # Example
///
/// ```
/// use oxide_forms::FieldPath;
/// use serde_json::json;
///
/// let path = FieldPath::parse("address.lines[1]").unwrap();
/// assert_eq!(path.as_str(), "address.lines.1");
///
/// let mut values = json!({});
/// path.set(&mut values, json!("Suite 4")).unwrap();
/// assert_eq!(values, json!({"address": {"lines": [null, "Suite 4"]}}));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    canonical: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses a dot/bracket path.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidPath`] for an empty path, an empty
    /// segment, a leading index or a malformed bracket index.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FormError::invalid_path(input, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            let (head, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if head.is_empty() && rest.is_empty() {
                return Err(FormError::invalid_path(input, "empty segment"));
            }
            if !head.is_empty() {
                segments.push(Self::segment_from(head));
            } else if segments.is_empty() {
                return Err(FormError::invalid_path(input, "path starts with an index"));
            }

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(FormError::invalid_path(input, "unexpected text after index"));
                };
                let Some(end) = inner.find(']') else {
                    return Err(FormError::invalid_path(input, "unclosed bracket"));
                };
                let index = inner[..end].trim().parse::<usize>().map_err(|_| {
                    FormError::invalid_path(input, format!("non-numeric index {:?}", &inner[..end]))
                })?;
                segments.push(PathSegment::Index(index));
                rest = &inner[end + 1..];
            }
        }

        let canonical = segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => key.clone(),
                PathSegment::Index(index) => index.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");

        Ok(Self {
            canonical,
            segments,
        })
    }

    fn segment_from(part: &str) -> PathSegment {
        match part.parse::<usize>() {
            Ok(index) if part.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(index),
            _ => PathSegment::Key(part.to_string()),
        }
    }

    /// Returns the canonical dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns whether `self` equals `other` or lies underneath it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Returns an id usable as an HTML `id` attribute.
    #[must_use]
    pub fn dom_id(&self) -> String {
        let body: String = self
            .canonical
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("id_{body}")
    }

    /// Looks up the value at this path.
    #[must_use]
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            })
    }

    /// Checks that a write at this path can succeed, without touching `root`.
    fn check_writable(&self, root: &Value) -> Result<()> {
        let mut current = Some(root);
        for segment in &self.segments {
            let list_len = match (segment, current) {
                (PathSegment::Index(_), None | Some(Value::Null)) => Some(0),
                (PathSegment::Index(_), Some(Value::Array(items))) => Some(items.len()),
                (_, None | Some(Value::Null | Value::Object(_))) => None,
                _ => {
                    return Err(FormError::invalid_path(
                        &self.canonical,
                        "cannot descend into a scalar value",
                    ));
                }
            };
            if let (PathSegment::Index(index), Some(len)) = (segment, list_len) {
                if index.saturating_sub(len) >= MAX_INDEX_GAP {
                    return Err(FormError::invalid_path(
                        &self.canonical,
                        "index is too far past the end of the list",
                    ));
                }
            }
            current = current.and_then(|value| match (segment, value) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            });
        }
        Ok(())
    }

    /// Writes `value` at this path, creating intermediate containers.
    ///
    /// Nothing is written when the path cannot be created, e.g. when it
    /// crosses a scalar or pads a list by more than a fixed number of slots.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidPath`] when the path crosses a scalar or
    /// an index lies too far past the end of its list.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        self.check_writable(root)?;
        let mut current = root;
        for segment in &self.segments {
            if current.is_null() {
                *current = match segment {
                    PathSegment::Key(_) => Value::Object(Map::new()),
                    PathSegment::Index(_) => Value::Array(Vec::new()),
                };
            }

            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => {
                    map.entry(key.clone()).or_insert(Value::Null)
                }
                (PathSegment::Index(index), Value::Array(items)) => {
                    if *index >= items.len() {
                        items.resize(*index + 1, Value::Null);
                    }
                    match items.get_mut(*index) {
                        Some(slot) => slot,
                        None => {
                            return Err(FormError::invalid_path(
                                &self.canonical,
                                "index is outside the list",
                            ));
                        }
                    }
                }
                (PathSegment::Index(index), Value::Object(map)) => {
                    map.entry(index.to_string()).or_insert(Value::Null)
                }
                _ => {
                    return Err(FormError::invalid_path(
                        &self.canonical,
                        "cannot descend into a scalar value",
                    ));
                }
            };
        }

        *current = value;
        Ok(())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl std::str::FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Normalises a reported error key, keeping unparsable keys verbatim.
pub fn canonical_key(raw: &str) -> String {
    FieldPath::parse(raw).map_or_else(|_| raw.to_string(), |path| path.canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dot_and_bracket() {
        let dotted = FieldPath::parse("items.0.name").unwrap();
        let bracketed = FieldPath::parse("items[0].name").unwrap();
        assert_eq!(dotted, bracketed);
        assert_eq!(bracketed.as_str(), "items.0.name");
        assert_eq!(
            bracketed.segments(),
            &[
                PathSegment::Key("items".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("name".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("a[x]").is_err());
        assert!(FieldPath::parse("a[1").is_err());
        assert!(FieldPath::parse("[0]").is_err());
    }

    #[test]
    fn test_get() {
        let values = json!({"address": {"street": "Main"}, "tags": ["a", "b"]});
        let street = FieldPath::parse("address.street").unwrap();
        let tag = FieldPath::parse("tags[1]").unwrap();
        let missing = FieldPath::parse("address.zip").unwrap();
        assert_eq!(street.get(&values), Some(&json!("Main")));
        assert_eq!(tag.get(&values), Some(&json!("b")));
        assert_eq!(missing.get(&values), None);
    }

    #[test]
    fn test_set_creates_containers() {
        let mut values = json!({"title": "A"});
        FieldPath::parse("meta.tags[2]")
            .unwrap()
            .set(&mut values, json!("x"))
            .unwrap();
        assert_eq!(
            values,
            json!({"title": "A", "meta": {"tags": [null, null, "x"]}})
        );
    }

    #[test]
    fn test_set_rejects_far_out_indices() {
        let mut values = json!({"tags": ["a"]});
        for raw in ["tags[18446744073709551615]", "tags[1000000000]", "tags.1025"] {
            let err = FieldPath::parse(raw)
                .unwrap()
                .set(&mut values, json!("x"))
                .unwrap_err();
            assert!(matches!(err, FormError::InvalidPath { .. }), "{raw}");
        }
        assert_eq!(values, json!({"tags": ["a"]}));

        let mut fresh = json!({});
        assert!(FieldPath::parse("meta.tags[5000]").unwrap().set(&mut fresh, json!(1)).is_err());
        assert_eq!(fresh, json!({}));

        FieldPath::parse("tags[1024]")
            .unwrap()
            .set(&mut values, json!("z"))
            .unwrap();
        assert_eq!(values["tags"].as_array().map(Vec::len), Some(1025));
    }

    #[test]
    fn test_set_into_scalar_fails() {
        let mut values = json!({"title": "A"});
        let err = FieldPath::parse("title.sub")
            .unwrap()
            .set(&mut values, json!(1))
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidPath { .. }));
    }

    #[test]
    fn test_dom_id_and_prefix() {
        let path = FieldPath::parse("address.street").unwrap();
        let parent = FieldPath::parse("address").unwrap();
        assert_eq!(path.dom_id(), "id_address_street");
        assert!(path.starts_with(&parent));
        assert!(!parent.starts_with(&path));
        assert_eq!(canonical_key("items[3]"), "items.3");
        assert_eq!(canonical_key(""), "");
    }
}
