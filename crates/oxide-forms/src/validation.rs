//! Field validators used by [`RuleSchema`](crate::RuleSchema).
//!
//! Validators look at the JSON value stored at a field path. Blank values
//! (`null`, whitespace-only strings, empty arrays and objects) are only
//! offered to validators whose [`Validator::checks_empty`] returns `true`, so
//! an optional email field left blank is not reported as malformed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::schema::rules::value_text;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Checks one field value.
pub trait Validator {
    /// Checks `value`.
    ///
    /// # Errors
    ///
    /// Returns the message to show when `value` is rejected.
    fn validate(&self, value: &Value) -> Result<(), String>;

    /// Whether blank values are offered to this validator.
    fn checks_empty(&self) -> bool {
        false
    }
}

/// Whether a value counts as not filled in.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Characters of a string, or items of an array.
fn length_of(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => value_text(other).chars().count(),
    }
}

fn check(ok: bool, message: &str) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

/// Rejects blank values.
#[derive(Debug, Clone)]
pub struct RequiredValidator {
    message: String,
}

impl RequiredValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_message("This field is required.")
    }

    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for RequiredValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for RequiredValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        check(!is_blank(value), &self.message)
    }

    fn checks_empty(&self) -> bool {
        true
    }
}

/// Caps the length of a string or the size of a list.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    max_length: usize,
    message: String,
}

impl MaxLengthValidator {
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        Self::with_message(
            max_length,
            format!("Ensure this value has at most {max_length} characters."),
        )
    }

    #[must_use]
    pub fn with_message(max_length: usize, message: impl Into<String>) -> Self {
        Self {
            max_length,
            message: message.into(),
        }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        check(length_of(value) <= self.max_length, &self.message)
    }
}

/// Requires a minimum string length or list size.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    min_length: usize,
    message: String,
}

impl MinLengthValidator {
    #[must_use]
    pub fn new(min_length: usize) -> Self {
        Self::with_message(
            min_length,
            format!("Ensure this value has at least {min_length} characters."),
        )
    }

    #[must_use]
    pub fn with_message(min_length: usize, message: impl Into<String>) -> Self {
        Self {
            min_length,
            message: message.into(),
        }
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        check(length_of(value) >= self.min_length, &self.message)
    }
}

/// Accepts strings shaped like an email address.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    message: String,
}

impl EmailValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_message("Enter a valid email address.")
    }

    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let ok = value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s.trim()));
        check(ok, &self.message)
    }
}

/// Accepts absolute `http` and `https` URLs.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    message: String,
}

impl UrlValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_message("Enter a valid URL.")
    }

    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for UrlValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let ok = value.as_str().is_some_and(|s| {
            ["http://", "https://"]
                .iter()
                .any(|scheme| s.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
        });
        check(ok, &self.message)
    }
}

/// Matches the textual form of a value against a pattern.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
    message: String,
}

impl RegexValidator {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Fails when `pattern` is not a valid regular expression.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        check(self.pattern.is_match(&value_text(value)), &self.message)
    }
}

/// Bounds a number. Numeric strings, as typed into inputs, are accepted.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
    message: String,
}

impl RangeValidator {
    #[must_use]
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        let message = match (min, max) {
            (Some(min), Some(max)) => format!("Value must be between {min} and {max}."),
            (Some(min), None) => format!("Value must be at least {min}."),
            (None, Some(max)) => format!("Value must be at most {max}."),
            (None, None) => "Invalid value.".to_string(),
        };
        Self::with_message(min, max, message)
    }

    #[must_use]
    pub fn with_message(min: Option<f64>, max: Option<f64>, message: impl Into<String>) -> Self {
        Self {
            min,
            max,
            message: message.into(),
        }
    }
}

impl Validator for RangeValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| "Enter a valid number.".to_string())?;

        let above_min = self.min.is_none_or(|min| number >= min);
        let below_max = self.max.is_none_or(|max| number <= max);
        check(above_min && below_max, &self.message)
    }
}
