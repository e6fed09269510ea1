//! A rule-list schema built from field validators.

use std::fmt;
use std::marker::PhantomData;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, ValidationErrors, NON_FIELD_ERRORS};
use crate::path::FieldPath;
use crate::validation::{is_blank, Validator};

use super::{Schema, Validation};

/// The validators attached to one field path.
pub struct FieldRules {
    /// Field path the rules apply to.
    pub path: FieldPath,
    /// Validators, run in order.
    pub validators: Vec<Box<dyn Validator>>,
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("path", &self.path)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl FieldRules {
    /// Creates an empty rule set for a field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidPath`] when `path` does not parse.
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            path: FieldPath::parse(path)?,
            validators: Vec::new(),
        })
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Runs the validators against the field's value in `values`.
    #[must_use]
    pub fn check(&self, values: &Value) -> Vec<String> {
        let value = self.path.get(values).unwrap_or(&Value::Null);
        let blank = is_blank(value);

        self.validators
            .iter()
            .filter(|validator| !blank || validator.checks_empty())
            .filter_map(|validator| validator.validate(value).err())
            .collect()
    }
}

/// Textual form of a field value as validators see it.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A schema described by per-field validator lists.
///
/// Every rule is checked and all messages are collected. When no rule fails,
/// the value set is deserialised into `T`; a shape mismatch is reported under
/// [`NON_FIELD_ERRORS`].
///
/// # Example
///
/// ```
/// use oxide_forms::RuleSchema;
/// use oxide_forms::fields::email_field;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Signup {
///     email: String,
/// }
///
/// let schema = RuleSchema::<Signup>::new()
///     .field(email_field("email", true).unwrap());
/// assert_eq!(schema.rules().len(), 1);
/// ```
pub struct RuleSchema<T> {
    rules: Vec<FieldRules>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for RuleSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSchema")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<T> Default for RuleSchema<T> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T> RuleSchema<T> {
    /// Creates a schema with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the rules for one field.
    #[must_use]
    pub fn field(mut self, rules: FieldRules) -> Self {
        self.rules.push(rules);
        self
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[FieldRules] {
        &self.rules
    }

    /// Checks every rule and collects the failures.
    #[must_use]
    pub fn field_errors(&self, values: &Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rules in &self.rules {
            for message in rules.check(values) {
                errors.add(rules.path.as_str(), message);
            }
        }
        errors
    }
}

impl<T> Schema for RuleSchema<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Values = T;
    type Output = T;

    fn validate<'a>(&'a self, values: &'a Value) -> LocalBoxFuture<'a, Validation<T>> {
        let mut errors = self.field_errors(values);
        let outcome = if errors.is_empty() {
            match serde_json::from_value::<T>(values.clone()) {
                Ok(data) => Validation::Valid(data),
                Err(e) => {
                    errors.add(NON_FIELD_ERRORS, e.to_string());
                    Validation::Invalid(errors)
                }
            }
        } else {
            Validation::Invalid(errors)
        };
        future::ready(outcome).boxed_local()
    }
}
