//! Error types for forms.

use std::collections::BTreeMap;

use thiserror::Error;

/// Key under which errors that do not belong to a single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Form-specific errors.
#[derive(Debug, Error)]
pub enum FormError {
    /// Validation failed with errors.
    #[error("validation errors: {0}")]
    ValidationErrors(ValidationErrors),

    /// A field path could not be parsed or does not fit the value shape.
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The field container is disabled and rejects interaction.
    #[error("field {path} is disabled")]
    Disabled { path: String },

    /// A value set could not be converted to or from its typed shape.
    #[error("failed to convert form values: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FormError {
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Collection of validation errors by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Errors keyed by field path.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates an empty error map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Builder form of [`ValidationErrors::add`].
    #[must_use]
    pub fn with(mut self, field: &str, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Returns whether there are any errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns errors for a specific field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// Returns the first error for a field, the one a field displays.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Removes and returns the errors of a field.
    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        self.errors.remove(field)
    }

    /// Returns the field paths that carry errors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Returns all errors as a flat list.
    #[must_use]
    pub fn all_errors(&self) -> Vec<(&str, &str)> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |msg| (field.as_str(), msg.as_str()))
            })
            .collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, messages) in &self.errors {
            for message in messages {
                writeln!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for ValidationErrors
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut errors = Self::new();
        for (field, message) in iter {
            errors.add(field.as_ref(), message);
        }
        errors
    }
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_first() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "required");
        errors.add("email", "invalid");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first("email"), Some("required"));
        assert_eq!(errors.get("email").map(Vec::len), Some(2));
        assert_eq!(errors.first("name"), None);
    }

    #[test]
    fn test_from_iter_and_display() {
        let errors: ValidationErrors = [("title", "too short"), (NON_FIELD_ERRORS, "bad")]
            .into_iter()
            .collect();
        let text = errors.to_string();
        assert!(text.contains("title: too short"));
        assert!(text.contains("__all__: bad"));
        assert_eq!(errors.all_errors().len(), 2);
    }
}
