//! The validation adapter boundary.
//!
//! A [`Schema`] describes the value shape of a form and checks a candidate
//! value set against it. The controller never evaluates rules itself; it hands
//! the current values to the schema and acts on the [`Validation`] it returns.

pub(crate) mod rules;

pub use rules::{FieldRules, RuleSchema};

use std::marker::PhantomData;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationErrors;

/// Outcome of validating a candidate value set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    /// The values conform; carries the typed, normalised data.
    Valid(T),
    /// The values do not conform; carries messages keyed by field path.
    Invalid(ValidationErrors),
}

impl<T> Validation<T> {
    /// Returns whether the values conformed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<T, ValidationErrors> {
        match self {
            Self::Valid(data) => Ok(data),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// A declarative description of a form's value shape.
///
/// `Values` is the shape the form edits (and seeds defaults from); `Output`
/// is what a successful validation hands to the submit callback. Validation
/// may finish synchronously (`future::ready`) or suspend.
pub trait Schema: 'static {
    /// The value shape edited by the form.
    type Values: Serialize + DeserializeOwned;
    /// The validated data passed to the submit callback.
    type Output: 'static;

    /// Validates a candidate value set.
    fn validate<'a>(&'a self, values: &'a Value) -> LocalBoxFuture<'a, Validation<Self::Output>>;
}

/// A schema backed by a synchronous closure.
///
/// # Example
///
/// ```
/// use oxide_forms::{FnSchema, Validation, ValidationErrors};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Draft {
///     title: String,
/// }
///
/// let schema = FnSchema::<Draft, String, _>::new(|values| {
///     match values["title"].as_str() {
///         Some(title) if !title.is_empty() => Validation::Valid(title.to_string()),
///         _ => Validation::Invalid(ValidationErrors::new().with("title", "required")),
///     }
/// });
/// # let _ = schema;
/// ```
pub struct FnSchema<V, O, F> {
    check: F,
    _marker: PhantomData<fn() -> (V, O)>,
}

impl<V, O, F> FnSchema<V, O, F>
where
    F: Fn(&Value) -> Validation<O>,
{
    /// Wraps a validation closure.
    #[must_use]
    pub const fn new(check: F) -> Self {
        Self {
            check,
            _marker: PhantomData,
        }
    }
}

impl<V, O, F> Schema for FnSchema<V, O, F>
where
    V: Serialize + DeserializeOwned + 'static,
    O: 'static,
    F: Fn(&Value) -> Validation<O> + 'static,
{
    type Values = V;
    type Output = O;

    fn validate<'a>(&'a self, values: &'a Value) -> LocalBoxFuture<'a, Validation<O>> {
        future::ready((self.check)(values)).boxed_local()
    }
}
