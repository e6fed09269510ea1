//! The schema-bound form: controller, components, lifecycle and markup.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use ironhtml::typed::Element;
use ironhtml_elements::{Div, Fieldset, Form, HtmlElement, Li, Ul};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::FormComponents;
use crate::controller::{FormController, SubmitOutcome};
use crate::error::{Result, NON_FIELD_ERRORS};
use crate::lifecycle::{FormKey, KeyTracker, UnsavedChangesGuard};
use crate::page::PageEvents;
use crate::schema::Schema;
use crate::widgets::WidgetAttrs;

/// Warning shown when leaving a page with unsaved edits.
pub const DEFAULT_UNSAVED_CHANGES_MESSAGE: &str =
    "You have unsaved changes. Are you sure you want to leave?";

/// Form-level configuration.
///
/// Every field has a default, so options can be loaded from partial JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Disables the field container.
    pub disabled: bool,
    /// Wraps the fields in a `<fieldset>`; a `<div>` otherwise.
    pub use_fieldset: bool,
    /// Identity of the record being edited.
    pub form_key: Option<FormKey>,
    /// Asks for confirmation before leaving with unsaved edits.
    pub warn_on_unsaved_changes: bool,
    /// The confirmation message.
    pub unsaved_changes_message: String,
    /// Extra classes for the `<form>`.
    pub form_class: Option<String>,
    /// Classes for the field container.
    pub fieldset_class: Option<String>,
    /// Extra `<form>` attributes.
    pub form_attrs: WidgetAttrs,
    /// Extra field container attributes.
    pub fieldset_attrs: WidgetAttrs,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            disabled: false,
            use_fieldset: true,
            form_key: None,
            warn_on_unsaved_changes: false,
            unsaved_changes_message: DEFAULT_UNSAVED_CHANGES_MESSAGE.to_string(),
            form_class: None,
            fieldset_class: None,
            form_attrs: WidgetAttrs::new(),
            fieldset_attrs: WidgetAttrs::new(),
        }
    }
}

impl FormOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::Serialize`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub const fn use_fieldset(mut self, use_fieldset: bool) -> Self {
        self.use_fieldset = use_fieldset;
        self
    }

    #[must_use]
    pub fn form_key(mut self, key: impl Into<FormKey>) -> Self {
        self.form_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn warn_on_unsaved_changes(mut self, warn: bool) -> Self {
        self.warn_on_unsaved_changes = warn;
        self
    }

    #[must_use]
    pub fn unsaved_changes_message(mut self, message: impl Into<String>) -> Self {
        self.unsaved_changes_message = message.into();
        self
    }

    #[must_use]
    pub fn form_class(mut self, class: impl Into<String>) -> Self {
        self.form_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn fieldset_class(mut self, class: impl Into<String>) -> Self {
        self.fieldset_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn form_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_attrs.set(key, value);
        self
    }

    #[must_use]
    pub fn fieldset_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fieldset_attrs.set(key, value);
        self
    }

    /// Whether field interaction is blocked.
    ///
    /// Only a fieldset disables its descendants, so the flag has no effect
    /// on a `<div>` container.
    const fn blocks_interaction(&self) -> bool {
        self.disabled && self.use_fieldset
    }
}

/// The platform's form-submit event.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: Cell<bool>,
}

impl SubmitEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the browser's own submission.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    #[must_use]
    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// What the children closure of [`SchemaForm::render`] receives.
pub struct FormContext<'a, S: Schema> {
    /// The form's controller.
    pub controller: &'a FormController<S>,
    /// Components bound to the controller.
    pub components: &'a FormComponents<S>,
}

type SubmitHandler<O, E> = Rc<dyn Fn(O) -> LocalBoxFuture<'static, std::result::Result<(), E>>>;

/// A form bound to a schema.
///
/// Owns one [`FormController`] for its whole life. A change of identity
/// key starts a new session on that controller rather than replacing it, so
/// the component set stays the same object and late results from the old
/// session are dropped by generation.
///
/// # Example
///
/// ```
/// use oxide_forms::{FieldProps, FormOptions, PageEvents, RuleSchema, SchemaForm};
/// use oxide_forms::fields::email_field;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Invite {
///     email: String,
/// }
///
/// let schema = RuleSchema::<Invite>::new().field(email_field("email", true).unwrap());
/// let form = SchemaForm::new(
///     schema,
///     &Invite { email: String::new() },
///     |invite: Invite| async move {
///         println!("inviting {}", invite.email);
///         Ok::<(), std::io::Error>(())
///     },
///     FormOptions::new(),
///     PageEvents::new(),
/// )
/// .unwrap();
///
/// let html = form.render(|ctx| {
///     ctx.components
///         .input(FieldProps::new("email").label("Email").attr("type", "email"))
///         .map(|field| field.render())
///         .unwrap_or_default()
/// });
/// assert!(html.starts_with("<form novalidate"));
/// ```
pub struct SchemaForm<S: Schema, E> {
    controller: FormController<S>,
    components: Rc<FormComponents<S>>,
    on_submit: SubmitHandler<S::Output, E>,
    options: RefCell<FormOptions>,
    keys: RefCell<KeyTracker>,
    guard: UnsavedChangesGuard,
}

impl<S: Schema, E: 'static> SchemaForm<S, E> {
    /// Builds the form and seeds it with `defaults`.
    ///
    /// # Errors
    ///
    /// Fails when `defaults` cannot be serialised to JSON.
    pub fn new<F, Fut>(
        schema: S,
        defaults: &S::Values,
        on_submit: F,
        options: FormOptions,
        page: PageEvents,
    ) -> Result<Self>
    where
        F: Fn(S::Output) -> Fut + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + 'static,
    {
        let controller = FormController::new(schema, defaults)?;
        controller.set_disabled(options.blocks_interaction());

        let components = Rc::new(FormComponents::new(controller.clone()));
        let guard = UnsavedChangesGuard::attach(
            &controller,
            page,
            options.warn_on_unsaved_changes,
            options.unsaved_changes_message.clone(),
        );
        let keys = KeyTracker::new(options.form_key.clone());

        Ok(Self {
            controller,
            components,
            on_submit: Rc::new(move |output| on_submit(output).boxed_local()),
            options: RefCell::new(options),
            keys: RefCell::new(keys),
            guard,
        })
    }

    #[must_use]
    pub const fn controller(&self) -> &FormController<S> {
        &self.controller
    }

    /// Returns the component set; the same instance for the form's life.
    #[must_use]
    pub fn components(&self) -> Rc<FormComponents<S>> {
        Rc::clone(&self.components)
    }

    /// Returns a copy of the current options.
    #[must_use]
    pub fn options(&self) -> FormOptions {
        self.options.borrow().clone()
    }

    /// Disables or enables the field container.
    pub fn set_disabled(&self, disabled: bool) {
        let mut options = self.options.borrow_mut();
        options.disabled = disabled;
        self.controller.set_disabled(options.blocks_interaction());
    }

    /// Turns unsaved-changes protection on or off.
    pub fn set_warn_on_unsaved_changes(&self, warn: bool) {
        self.options.borrow_mut().warn_on_unsaved_changes = warn;
        self.guard.set_enabled(warn);
    }

    /// Replaces the unsaved-changes warning.
    pub fn set_unsaved_changes_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.guard.set_message(message.clone());
        self.options.borrow_mut().unsaved_changes_message = message;
    }

    /// Applies the identity key of the record being edited.
    ///
    /// A key that differs from the last one resets the form to `defaults`
    /// and returns `true`. An absent or unchanged key leaves the session
    /// alone.
    ///
    /// # Errors
    ///
    /// Fails when `defaults` cannot be serialised to JSON.
    pub fn sync_key(&self, key: Option<FormKey>, defaults: &S::Values) -> Result<bool> {
        if !self.keys.borrow_mut().observe(key.as_ref()) {
            return Ok(false);
        }
        if let Some(key) = &key {
            debug!(key = %key, "Form identity changed");
        }
        self.options.borrow_mut().form_key = key;
        self.controller.reset(Some(defaults))?;
        Ok(true)
    }

    /// Handles the platform submit event: the default submission is
    /// prevented and the values go through validation and the submit
    /// handler.
    ///
    /// # Errors
    ///
    /// Resolves to the submit handler's error when it rejects.
    #[must_use = "futures do nothing unless awaited"]
    pub fn handle_submit(
        &self,
        event: &SubmitEvent,
    ) -> LocalBoxFuture<'_, std::result::Result<SubmitOutcome, E>> {
        event.prevent_default();
        let on_submit = Rc::clone(&self.on_submit);
        self.controller.submit(move |output| on_submit(output))
    }

    /// Renders the form; `children` renders the fields.
    ///
    /// With a fieldset the fields sit in an unstyled `<div>` inside it; the
    /// plain container holds them directly.
    #[must_use]
    pub fn render<F>(&self, children: F) -> String
    where
        F: FnOnce(&FormContext<'_, S>) -> String,
    {
        let options = self.options();
        let context = FormContext {
            controller: &self.controller,
            components: &self.components,
        };
        let body = format!("{}{}", self.render_non_field_errors(), children(&context));

        let mut container_attrs = options.fieldset_attrs;
        container_attrs.remove("class");
        container_attrs.remove("disabled");
        let container_class = options.fieldset_class.unwrap_or_default();
        let container_class = container_class.trim();

        let mut form_attrs = options.form_attrs;
        form_attrs.remove("class");
        form_attrs.remove("novalidate");
        let form = with_attrs(
            Element::<Form>::new()
                .bool_attr("novalidate")
                .class(form_class(options.form_class.as_deref())),
            &form_attrs,
        );

        let form = if options.use_fieldset {
            form.child::<Fieldset, _>(|fieldset| {
                with_attrs(
                    fieldset.when(!container_class.is_empty(), |f| f.class(container_class)),
                    &container_attrs,
                )
                .when(options.disabled, |f| f.bool_attr("disabled"))
                .child::<Div, _>(|fields| fields.raw(body))
            })
        } else {
            form.child::<Div, _>(|div| {
                with_attrs(
                    div.when(!container_class.is_empty(), |d| d.class(container_class)),
                    &container_attrs,
                )
                .raw(body)
            })
        };
        form.render()
    }

    fn render_non_field_errors(&self) -> String {
        let errors = self.controller.state().errors;
        let Some(messages) = errors.get(NON_FIELD_ERRORS) else {
            return String::new();
        };
        Element::<Div>::new()
            .class("alert alert-danger")
            .attr("role", "alert")
            .child::<Ul, _>(|ul| {
                ul.class("mb-0")
                    .children(messages.iter(), |message, li: Element<Li>| li.text(message))
            })
            .render()
    }
}

fn form_class(extra: Option<&str>) -> String {
    match extra.map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("w-full {extra}"),
        _ => "w-full".to_string(),
    }
}

/// Copies every attribute in `attrs` onto `element`, in key order.
fn with_attrs<E: HtmlElement>(element: Element<E>, attrs: &WidgetAttrs) -> Element<E> {
    attrs
        .attrs
        .iter()
        .fold(element, |element, (name, value)| element.attr(name.clone(), value.as_str()))
}

impl<S: Schema, E> fmt::Debug for SchemaForm<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaForm")
            .field("controller", &self.controller)
            .field("options", &self.options.borrow())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FieldProps;
    use crate::fields::char_field;
    use crate::schema::RuleSchema;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Topic {
        title: String,
    }

    fn topic(title: &str) -> Topic {
        Topic {
            title: title.to_string(),
        }
    }

    fn form(options: FormOptions) -> SchemaForm<RuleSchema<Topic>, String> {
        let schema = RuleSchema::new().field(char_field("title", 20, true).unwrap());
        SchemaForm::new(
            schema,
            &topic("Hello"),
            |_topic: Topic| async { Ok(()) },
            options,
            PageEvents::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options = FormOptions::from_json(r#"{"warn_on_unsaved_changes": true, "form_key": 3}"#).unwrap();
        assert!(options.warn_on_unsaved_changes);
        assert!(options.use_fieldset);
        assert!(!options.disabled);
        assert_eq!(options.form_key, Some(FormKey::Number(3)));
        assert_eq!(options.unsaved_changes_message, DEFAULT_UNSAVED_CHANGES_MESSAGE);
        assert!(FormOptions::from_json("[]").is_err());
    }

    #[test]
    fn test_render_fieldset() {
        let form = form(
            FormOptions::new()
                .disabled(true)
                .form_class("mt-2")
                .fieldset_class("row")
                .form_attr("id", "topic"),
        );
        let html = form.render(|ctx| {
            ctx.components
                .input(FieldProps::new("title"))
                .unwrap()
                .render()
        });
        assert!(html.starts_with(r#"<form novalidate class="w-full mt-2" id="topic">"#));
        assert!(html.contains(r#"<fieldset class="row" disabled><div>"#));
        assert!(html.contains(r#"value="Hello""#));
        assert!(html.ends_with("</div></fieldset></form>"));
        assert!(form.controller().is_disabled());
    }

    #[test]
    fn test_render_div_container() {
        let form = form(FormOptions::new().use_fieldset(false).disabled(true));
        let html = form.render(|_| "<p>fields</p>".to_string());
        assert!(html.contains("<div><p>fields</p></div>"));
        assert!(!html.contains("fieldset"));
        assert!(!form.controller().is_disabled());
    }

    #[test]
    fn test_shell_attrs_are_escaped_and_owned_ones_dropped() {
        let options = FormOptions::new()
            .form_attr("data-note", r#"say "hi""#)
            .form_attr("class", "ignored")
            .fieldset_attr("aria-label", "Topic")
            .fieldset_attr("disabled", "");
        let html = form(options).render(|_| String::new());
        assert!(html.starts_with(
            r#"<form novalidate class="w-full" data-note="say &quot;hi&quot;">"#
        ));
        assert!(html.contains(r#"<fieldset aria-label="Topic"><div>"#));
        assert!(!html.contains("ignored"));
    }

    #[test]
    fn test_set_disabled_toggles_controller() {
        let form = form(FormOptions::new());
        form.set_disabled(true);
        assert!(form.controller().is_disabled());
        assert!(form.options().disabled);
        form.set_disabled(false);
        assert!(!form.controller().is_disabled());
    }

    #[test]
    fn test_non_field_errors_rendered() {
        let form = form(FormOptions::new());
        form.controller().set_error(NON_FIELD_ERRORS, "Title already taken");
        let html = form.render(|_| String::new());
        assert!(html.contains("alert alert-danger"));
        assert!(html.contains("<li>Title already taken</li>"));
    }

    #[test]
    fn test_components_are_stable() {
        let form = form(FormOptions::new().form_key("a"));
        let before = form.components();
        assert!(form.sync_key(Some("b".into()), &topic("B")).unwrap());
        assert!(Rc::ptr_eq(&before, &form.components()));
        assert_eq!(form.options().form_key, Some(FormKey::from("b")));
        assert!(!form.sync_key(None, &topic("C")).unwrap());
        assert_eq!(form.controller().state().values["title"], "B");
    }

    #[tokio::test]
    async fn test_handle_submit_prevents_default() {
        let form = form(FormOptions::new());
        let event = SubmitEvent::new();
        let outcome = form.handle_submit(&event).await;
        assert!(event.is_default_prevented());
        assert_eq!(outcome, Ok(SubmitOutcome::Submitted));
    }
}
