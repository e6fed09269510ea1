//! The form state controller.
//!
//! A [`FormController`] owns one form session at a time: the live values,
//! touched flags, validation errors and submission status. Every mutation is
//! synchronous and followed by a [`FormEvent`] to subscribers; the only
//! suspension points are validation and the caller's submit callback.
//!
//! Sessions are numbered. [`FormController::reset`] starts a new generation,
//! and any validation or submit result that arrives for an older generation
//! is discarded instead of being written into the new session.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FormError, Result, ValidationErrors};
use crate::field::FieldHandle;
use crate::observer::{Listeners, Subscription};
use crate::path::{canonical_key, FieldPath};
use crate::schema::{Schema, Validation};
use crate::state::{FormEvent, FormState};

/// How a call to [`FormController::submit`] ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation passed and the callback resolved.
    Submitted,
    /// Validation failed; the callback was not invoked.
    Invalid(ValidationErrors),
    /// Another submit was already running; nothing was done.
    InFlight,
    /// The session was reset while this submit was pending; its result was
    /// not applied.
    Stale,
}

struct Session {
    generation: u64,
    /// Values `reset(None)` returns to.
    defaults: Value,
    /// Values `dirty` is measured against.
    baseline: Value,
    values: Value,
    errors: ValidationErrors,
    touched: BTreeSet<String>,
    validating: bool,
    submitting: bool,
    submit_succeeded: bool,
    submit_count: u32,
}

impl Session {
    fn seeded(generation: u64, defaults: Value) -> Self {
        Self {
            generation,
            baseline: defaults.clone(),
            values: defaults.clone(),
            defaults,
            errors: ValidationErrors::new(),
            touched: BTreeSet::new(),
            validating: false,
            submitting: false,
            submit_succeeded: false,
            submit_count: 0,
        }
    }

    fn dirty(&self) -> bool {
        self.values != self.baseline
    }
}

struct Inner<S: Schema> {
    schema: S,
    session: RefCell<Session>,
    next_generation: Cell<u64>,
    disabled: Cell<bool>,
    listeners: Listeners<FormEvent>,
}

/// Owns the state of a form bound to a [`Schema`].
///
/// The controller is a cheap handle: clones share the same session.
///
/// # Example
///
/// ```
/// use oxide_forms::{FormController, RuleSchema};
/// use oxide_forms::fields::char_field;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Post {
///     title: String,
/// }
///
/// let schema = RuleSchema::<Post>::new().field(char_field("title", 80, true).unwrap());
/// let form = FormController::new(schema, &Post { title: "Draft".into() }).unwrap();
///
/// let title = form.register("title").unwrap();
/// title.change("Final").unwrap();
/// assert!(form.state().dirty);
/// assert_eq!(title.value(), json!("Final"));
/// ```
pub struct FormController<S: Schema> {
    inner: Rc<Inner<S>>,
}

impl<S: Schema> Clone for FormController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Schema> fmt::Debug for FormController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.inner.session.borrow();
        f.debug_struct("FormController")
            .field("generation", &session.generation)
            .field("dirty", &session.dirty())
            .field("submitting", &session.submitting)
            .field("disabled", &self.inner.disabled.get())
            .finish_non_exhaustive()
    }
}

impl<S: Schema> FormController<S> {
    /// Creates a controller seeded with `defaults`.
    ///
    /// # Errors
    ///
    /// Fails when `defaults` cannot be serialised to JSON.
    pub fn new(schema: S, defaults: &S::Values) -> Result<Self> {
        let defaults = serde_json::to_value(defaults)?;
        Ok(Self {
            inner: Rc::new(Inner {
                schema,
                session: RefCell::new(Session::seeded(0, defaults)),
                next_generation: Cell::new(1),
                disabled: Cell::new(false),
                listeners: Listeners::new(),
            }),
        })
    }

    /// Returns the schema the form validates against.
    #[must_use]
    pub fn schema(&self) -> &S {
        &self.inner.schema
    }

    /// Returns whether two handles refer to the same controller.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the current session generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.session.borrow().generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Returns a snapshot of the session.
    #[must_use]
    pub fn state(&self) -> FormState {
        let session = self.inner.session.borrow();
        FormState {
            generation: session.generation,
            values: session.values.clone(),
            errors: session.errors.clone(),
            touched: session.touched.clone(),
            dirty: session.dirty(),
            submitting: session.submitting,
            submit_succeeded: session.submit_succeeded,
            submit_count: session.submit_count,
        }
    }

    /// Returns the current values in their typed shape.
    ///
    /// # Errors
    ///
    /// Fails when the edited values no longer deserialise into `S::Values`.
    pub fn values(&self) -> Result<S::Values> {
        let values = self.inner.session.borrow().values.clone();
        Ok(serde_json::from_value(values)?)
    }

    /// Returns the value at `path`, or `null` when nothing is stored there.
    #[must_use]
    pub fn value(&self, path: &FieldPath) -> Value {
        path.get(&self.inner.session.borrow().values)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Returns a read/write binding for one field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidPath`] when `path` does not parse.
    pub fn register(&self, path: &str) -> Result<FieldHandle<S>> {
        let path = FieldPath::parse(path)?;
        debug!(path = %path, "Registering field");
        Ok(FieldHandle::new(self.clone(), path))
    }

    /// Whether the enclosing field container rejects interaction.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.get()
    }

    /// Enables or disables interaction for every field at once.
    pub fn set_disabled(&self, disabled: bool) {
        self.inner.disabled.set(disabled);
    }

    fn ensure_enabled(&self, path: &FieldPath) -> Result<()> {
        if self.is_disabled() {
            warn!(path = %path, "Rejected interaction with a disabled form");
            return Err(FormError::Disabled {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Writes a field value. `dirty` reflects the change immediately.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Disabled`] while the form is disabled and
    /// [`FormError::InvalidPath`] when the value tree cannot hold the path.
    pub fn set_value(&self, path: &FieldPath, value: Value) -> Result<()> {
        self.ensure_enabled(path)?;
        path.set(&mut self.inner.session.borrow_mut().values, value)?;
        self.emit(&FormEvent::ValueChanged { path: path.clone() });
        Ok(())
    }

    /// Marks a field as touched.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Disabled`] while the form is disabled.
    pub fn blur(&self, path: &FieldPath) -> Result<()> {
        self.ensure_enabled(path)?;
        self.inner
            .session
            .borrow_mut()
            .touched
            .insert(path.to_string());
        self.emit(&FormEvent::Blurred { path: path.clone() });
        Ok(())
    }

    /// Returns the message a field displays, if any.
    #[must_use]
    pub fn error(&self, path: &FieldPath) -> Option<String> {
        self.inner
            .session
            .borrow()
            .errors
            .first(path.as_str())
            .map(str::to_string)
    }

    /// Returns every message recorded for a field.
    #[must_use]
    pub fn field_errors(&self, path: &FieldPath) -> Vec<String> {
        self.inner
            .session
            .borrow()
            .errors
            .get(path.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the field has been blurred in this session.
    #[must_use]
    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.inner.session.borrow().touched.contains(path.as_str())
    }

    /// Whether the field differs from its baseline value.
    #[must_use]
    pub fn is_field_dirty(&self, path: &FieldPath) -> bool {
        let session = self.inner.session.borrow();
        path.get(&session.values) != path.get(&session.baseline)
    }

    /// Records an error for a field, e.g. one reported by a server.
    pub fn set_error(&self, path: &str, message: impl Into<String>) {
        self.inner
            .session
            .borrow_mut()
            .errors
            .add(&canonical_key(path), message);
        self.emit(&FormEvent::ErrorsChanged);
    }

    /// Clears the errors of one field and its children, or of every field.
    pub fn clear_errors(&self, path: Option<&FieldPath>) {
        {
            let mut session = self.inner.session.borrow_mut();
            match path {
                Some(path) => session.errors.errors.retain(|key, _| !key_under(key, path)),
                None => session.errors = ValidationErrors::new(),
            }
        }
        self.emit(&FormEvent::ErrorsChanged);
    }

    /// Starts a new session.
    ///
    /// Values are replaced by `defaults` (or the last defaults when `None`),
    /// and errors, touched flags and submission status are cleared. A submit
    /// still pending from the previous session keeps running but its result
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Fails when `defaults` cannot be serialised to JSON.
    pub fn reset(&self, defaults: Option<&S::Values>) -> Result<()> {
        let defaults = match defaults {
            Some(defaults) => serde_json::to_value(defaults)?,
            None => self.inner.session.borrow().defaults.clone(),
        };

        let generation = self.inner.next_generation.get();
        self.inner.next_generation.set(generation + 1);
        *self.inner.session.borrow_mut() = Session::seeded(generation, defaults);

        debug!(generation, "Form session reset");
        self.emit(&FormEvent::Reset { generation });
        Ok(())
    }

    /// Re-validates the current values and refreshes the error map.
    ///
    /// With a path, only errors at or below that path are replaced. Returns
    /// whether the validated scope is free of errors.
    #[must_use = "futures do nothing unless awaited"]
    pub fn trigger<'a>(&'a self, path: Option<&'a FieldPath>) -> LocalBoxFuture<'a, bool> {
        async move {
            let (generation, values) = {
                let session = self.inner.session.borrow();
                (session.generation, session.values.clone())
            };

            let outcome = self.inner.schema.validate(&values).await;
            if !self.is_current(generation) {
                debug!(generation, "Discarding validation result from a replaced session");
                return false;
            }

            let reported = match outcome {
                Validation::Valid(_) => ValidationErrors::new(),
                Validation::Invalid(errors) => normalize(errors),
            };

            let valid = {
                let mut session = self.inner.session.borrow_mut();
                match path {
                    None => {
                        session.errors = reported;
                        session.errors.is_empty()
                    }
                    Some(path) => {
                        session.errors.errors.retain(|key, _| !key_under(key, path));
                        let mut valid = true;
                        for (key, messages) in reported.errors {
                            if key_under(&key, path) {
                                valid = false;
                                session.errors.errors.insert(key, messages);
                            }
                        }
                        valid
                    }
                }
            };

            self.emit(&FormEvent::ErrorsChanged);
            valid
        }
        .boxed_local()
    }

    /// Validates the values and, if they conform, runs `on_submit`.
    ///
    /// Validation failures are reported through [`SubmitOutcome::Invalid`];
    /// the only `Err` is the callback's own rejection, which is passed
    /// through untouched. `submitting` is true exactly while the callback
    /// runs and is cleared however it ends. A successful submit re-baselines
    /// dirty tracking on the submitted values.
    ///
    /// # Errors
    ///
    /// Resolves to the callback's error when `on_submit` rejects.
    #[must_use = "futures do nothing unless awaited"]
    pub fn submit<'a, F, Fut, E>(
        &'a self,
        on_submit: F,
    ) -> LocalBoxFuture<'a, std::result::Result<SubmitOutcome, E>>
    where
        F: FnOnce(S::Output) -> Fut + 'a,
        Fut: Future<Output = std::result::Result<(), E>> + 'a,
        E: 'a,
    {
        async move {
            let (generation, values) = {
                let mut session = self.inner.session.borrow_mut();
                if session.validating || session.submitting {
                    warn!(generation = session.generation, "Submit already in flight, ignoring");
                    return Ok(SubmitOutcome::InFlight);
                }
                session.validating = true;
                session.submit_count += 1;
                (session.generation, session.values.clone())
            };
            let mut guard = InFlight {
                controller: self,
                generation,
                armed: true,
            };

            let validation = self.inner.schema.validate(&values).await;
            if !self.is_current(generation) {
                guard.disarm();
                debug!(generation, "Discarding validation result from a replaced session");
                return Ok(SubmitOutcome::Stale);
            }

            let data = match validation {
                Validation::Valid(data) => data,
                Validation::Invalid(errors) => {
                    guard.disarm();
                    let errors = normalize(errors);
                    {
                        let mut session = self.inner.session.borrow_mut();
                        session.validating = false;
                        session.submit_succeeded = false;
                        session.errors = errors.clone();
                    }
                    debug!(generation, fields = errors.len(), "Submit blocked by validation errors");
                    self.emit(&FormEvent::ErrorsChanged);
                    return Ok(SubmitOutcome::Invalid(errors));
                }
            };

            let had_errors = {
                let mut session = self.inner.session.borrow_mut();
                session.validating = false;
                session.submitting = true;
                !std::mem::take(&mut session.errors).is_empty()
            };
            if had_errors {
                self.emit(&FormEvent::ErrorsChanged);
            }
            self.emit(&FormEvent::SubmitStarted);

            let result = on_submit(data).await;
            guard.disarm();

            if !self.is_current(generation) {
                debug!(generation, "Discarding submit result from a replaced session");
                return result.map(|()| SubmitOutcome::Stale);
            }

            let succeeded = result.is_ok();
            {
                let mut session = self.inner.session.borrow_mut();
                session.submitting = false;
                session.submit_succeeded = succeeded;
                if succeeded {
                    session.baseline = values;
                }
            }
            if !succeeded {
                warn!(generation, "Submit callback rejected");
            }
            self.emit(&FormEvent::SubmitSettled { succeeded });

            result.map(|()| SubmitOutcome::Submitted)
        }
        .boxed_local()
    }

    /// Registers a callback for every [`FormEvent`].
    pub fn subscribe(&self, callback: impl Fn(&FormEvent) + 'static) -> Subscription {
        self.inner.listeners.add(callback)
    }

    /// Returns how many subscribers are registered.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn emit(&self, event: &FormEvent) {
        self.inner.listeners.emit(event);
    }
}

/// Clears the in-flight flags when a submit future is dropped before it
/// settles, so the session does not stay locked.
struct InFlight<'a, S: Schema> {
    controller: &'a FormController<S>,
    generation: u64,
    armed: bool,
}

impl<S: Schema> InFlight<'_, S> {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<S: Schema> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if !(self.armed && self.controller.is_current(self.generation)) {
            return;
        }
        let was_submitting = {
            let mut session = self.controller.inner.session.borrow_mut();
            session.validating = false;
            std::mem::replace(&mut session.submitting, false)
        };
        debug!(generation = self.generation, "Submit abandoned before settling");
        if was_submitting {
            self.controller
                .emit(&FormEvent::SubmitSettled { succeeded: false });
        }
    }
}

fn key_under(key: &str, path: &FieldPath) -> bool {
    FieldPath::parse(key).is_ok_and(|key| key.starts_with(path))
}

fn normalize(errors: ValidationErrors) -> ValidationErrors {
    let mut normalized = ValidationErrors::new();
    for (key, messages) in errors.errors {
        for message in messages {
            normalized.add(&canonical_key(&key), message);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleSchema;
    use crate::validation::RequiredValidator;
    use crate::FieldRules;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Article {
        title: String,
        body: String,
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            body: String::new(),
        }
    }

    fn controller(title: &str) -> FormController<RuleSchema<Article>> {
        let schema = RuleSchema::new().field(
            FieldRules::new("title")
                .unwrap()
                .validator(RequiredValidator::with_message("required")),
        );
        FormController::new(schema, &article(title)).unwrap()
    }

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn test_new_session_is_clean() {
        let form = controller("A");
        let state = form.state();
        assert_eq!(state.generation, 0);
        assert_eq!(state.values, json!({"title": "A", "body": ""}));
        assert!(!state.dirty);
        assert!(!state.submitting);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_set_value_marks_dirty_synchronously() {
        let form = controller("A");
        let seen_dirty = Rc::new(Cell::new(false));
        let probe = form.clone();
        let flag = Rc::clone(&seen_dirty);
        let _sub = form.subscribe(move |event| {
            if matches!(event, FormEvent::ValueChanged { .. }) {
                flag.set(probe.state().dirty);
            }
        });

        form.set_value(&path("title"), json!("B")).unwrap();
        assert!(seen_dirty.get());
        assert!(form.is_field_dirty(&path("title")));
        assert!(!form.is_field_dirty(&path("body")));
    }

    #[test]
    fn test_blur_marks_touched() {
        let form = controller("A");
        form.blur(&path("title")).unwrap();
        assert!(form.is_touched(&path("title")));
        assert!(!form.is_touched(&path("body")));
    }

    #[test]
    fn test_disabled_rejects_interaction() {
        let form = controller("A");
        form.set_disabled(true);
        let err = form.set_value(&path("title"), json!("B")).unwrap_err();
        assert!(matches!(err, FormError::Disabled { .. }));
        assert!(form.blur(&path("title")).is_err());
        assert!(!form.state().dirty);

        form.set_disabled(false);
        assert!(form.set_value(&path("title"), json!("B")).is_ok());
    }

    #[test]
    fn test_reset_replaces_session() {
        let form = controller("A");
        form.set_value(&path("title"), json!("B")).unwrap();
        form.set_error("title", "server says no");

        form.reset(Some(&article("C"))).unwrap();
        let state = form.state();
        assert_eq!(state.generation, 1);
        assert_eq!(state.values["title"], json!("C"));
        assert!(!state.dirty);
        assert!(state.errors.is_empty());

        form.set_value(&path("title"), json!("D")).unwrap();
        form.reset(None).unwrap();
        assert_eq!(form.state().values["title"], json!("C"));
        assert_eq!(form.generation(), 2);
    }

    #[test]
    fn test_set_error_normalises_path() {
        let form = controller("A");
        form.set_error("items[0]", "bad");
        assert_eq!(form.error(&path("items.0")), Some("bad".to_string()));
        form.clear_errors(Some(&path("items")));
        assert!(form.state().errors.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_scoped_to_field() {
        let form = controller("");
        form.set_error("body", "kept");
        assert!(!form.trigger(Some(&path("title"))).await);
        let errors = form.state().errors;
        assert_eq!(errors.first("title"), Some("required"));
        assert_eq!(errors.first("body"), Some("kept"));

        form.set_value(&path("title"), json!("ok")).unwrap();
        assert!(form.trigger(None).await);
        assert!(form.state().errors.is_empty());
    }

    #[tokio::test]
    async fn test_submit_invalid_skips_callback() {
        let form = controller("");
        let called = Cell::new(false);
        let outcome = form
            .submit(|_| {
                called.set(true);
                async { Ok::<(), ()>(()) }
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Invalid(ValidationErrors::new().with("title", "required"))
        );
        assert!(!called.get());
        assert!(!form.state().submitting);
        assert_eq!(form.state().submit_count, 1);
    }

    #[tokio::test]
    async fn test_submit_success_clears_dirty() {
        let form = controller("A");
        form.set_value(&path("title"), json!("B")).unwrap();

        let outcome = form
            .submit(|data: Article| async move {
                assert_eq!(data.title, "B");
                Ok::<(), ()>(())
            })
            .await;

        assert_eq!(outcome, Ok(SubmitOutcome::Submitted));
        let state = form.state();
        assert!(!state.dirty);
        assert!(state.submit_succeeded);
        assert!(!state.submitting);
        assert!(!state.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_submit_rejection_propagates() {
        let form = controller("A");
        form.set_value(&path("title"), json!("B")).unwrap();

        let outcome = form.submit(|_| async { Err::<(), _>("offline") }).await;

        assert_eq!(outcome, Err("offline"));
        let state = form.state();
        assert!(!state.submitting);
        assert!(!state.submit_succeeded);
        assert!(state.dirty);
    }

    #[tokio::test]
    async fn test_dropped_submit_releases_flags() {
        let form = controller("A");
        let (_tx, rx) = tokio::sync::oneshot::channel::<()>();
        {
            let mut pending = Box::pin(form.submit(|_| async move {
                let _ = rx.await;
                Ok::<(), ()>(())
            }));
            assert!(futures::poll!(&mut pending).is_pending());
            assert!(form.state().submitting);
        }
        assert!(!form.state().submitting);
        assert_eq!(
            form.submit(|_| async { Ok::<(), ()>(()) }).await,
            Ok(SubmitOutcome::Submitted)
        );
    }
}
