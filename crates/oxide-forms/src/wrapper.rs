//! The field binding wrapper: label, control, description and error slot.

use ironhtml::typed::Element;
use ironhtml_elements::{Div, Label, P};
use serde::{Deserialize, Serialize};

use crate::controller::FormController;
use crate::error::Result;
use crate::field::FieldHandle;
use crate::schema::Schema;
use crate::widgets::WidgetAttrs;

/// Presentation options shared by every bound field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLayout {
    /// Label text; no label is rendered when absent.
    pub label: Option<String>,
    /// Help text shown under the control.
    pub description: Option<String>,
    /// Extra classes for the field block.
    pub item_class: Option<String>,
    /// Extra classes for the label.
    pub label_class: Option<String>,
    /// Extra classes for the description.
    pub description_class: Option<String>,
}

impl FieldLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets extra classes for the field block.
    #[must_use]
    pub fn item_class(mut self, class: impl Into<String>) -> Self {
        self.item_class = Some(class.into());
        self
    }

    /// Sets extra classes for the label.
    #[must_use]
    pub fn label_class(mut self, class: impl Into<String>) -> Self {
        self.label_class = Some(class.into());
        self
    }

    /// Sets extra classes for the description.
    #[must_use]
    pub fn description_class(mut self, class: impl Into<String>) -> Self {
        self.description_class = Some(class.into());
        self
    }
}

fn classes(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .copied()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn description_id<S: Schema>(field: &FieldHandle<S>) -> String {
    format!("{}_description", field.path().dom_id())
}

fn message_id<S: Schema>(field: &FieldHandle<S>) -> String {
    format!("{}_message", field.path().dom_id())
}

/// Attributes a control needs to be wired to its field block: `id`,
/// `aria-describedby` and, while the field has an error, `aria-invalid` and
/// the `is-invalid` class.
#[must_use]
pub fn control_attrs<S: Schema>(field: &FieldHandle<S>, layout: &FieldLayout) -> WidgetAttrs {
    let mut attrs = WidgetAttrs::new().with("id", field.path().dom_id());
    let has_error = field.error().is_some();

    let mut described_by = Vec::new();
    if layout.description.is_some() {
        described_by.push(description_id(field));
    }
    if has_error {
        described_by.push(message_id(field));
        attrs.set("aria-invalid", "true");
        attrs.add_class("is-invalid");
    }
    if !described_by.is_empty() {
        attrs.set("aria-describedby", described_by.join(" "));
    }
    attrs
}

/// Renders a field block around already-rendered control markup.
///
/// The error slot holds the field's first error and is omitted entirely
/// when there is none.
#[must_use]
pub fn render_field<S: Schema>(field: &FieldHandle<S>, layout: &FieldLayout, control: &str) -> String {
    let control_id = field.path().dom_id();
    let error = field.error();

    let mut item = Element::<Div>::new().class(classes(&[Some("mb-3"), layout.item_class.as_deref()]));

    if let Some(label) = &layout.label {
        let label_class = classes(&[
            Some("form-label text-muted"),
            error.as_ref().map(|_| "text-danger"),
            layout.label_class.as_deref(),
        ]);
        item = item.child::<Label, _>(|l| l.attr("for", &control_id).class(label_class).text(label));
    }

    item = item.raw(control);

    if let Some(description) = &layout.description {
        let description_id = description_id(field);
        let description_class = classes(&[
            Some("form-text text-muted"),
            layout.description_class.as_deref(),
        ]);
        item = item.child::<P, _>(|p| {
            p.attr("id", &description_id)
                .class(description_class)
                .text(description)
        });
    }

    if let Some(message) = &error {
        let message_id = message_id(field);
        item = item.child::<P, _>(|p| {
            p.attr("id", &message_id)
                .class("invalid-feedback d-block")
                .text(message)
        });
    }

    item.render()
}

/// Binds a caller-supplied control to one field of a form.
///
/// # Example
///
/// ```
/// use oxide_forms::{FieldLayout, FieldWrapper, FormController, RuleSchema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Prefs {
///     newsletter: bool,
/// }
///
/// let form = FormController::new(RuleSchema::<Prefs>::new(), &Prefs { newsletter: true }).unwrap();
/// let html = FieldWrapper::new(&form, "newsletter")
///     .unwrap()
///     .layout(FieldLayout::new().label("Newsletter"))
///     .render_with(|field| {
///         let checked = if field.value() == serde_json::json!(true) { " checked" } else { "" };
///         format!(r#"<input type="checkbox" name="{}"{checked}>"#, field.name())
///     });
/// assert!(html.contains("checked"));
/// ```
pub struct FieldWrapper<S: Schema> {
    field: FieldHandle<S>,
    layout: FieldLayout,
}

impl<S: Schema> FieldWrapper<S> {
    /// Registers `path` on the controller and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidPath`] when `path` does not parse.
    pub fn new(controller: &FormController<S>, path: &str) -> Result<Self> {
        Ok(Self::from_handle(controller.register(path)?))
    }

    /// Wraps an existing field handle.
    #[must_use]
    pub fn from_handle(field: FieldHandle<S>) -> Self {
        Self {
            field,
            layout: FieldLayout::new(),
        }
    }

    /// Sets the layout options.
    #[must_use]
    pub fn layout(mut self, layout: FieldLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the wrapped field.
    #[must_use]
    pub const fn field(&self) -> &FieldHandle<S> {
        &self.field
    }

    /// Returns attributes for wiring a custom control to this block.
    #[must_use]
    pub fn control_attrs(&self) -> WidgetAttrs {
        control_attrs(&self.field, &self.layout)
    }

    /// Renders the block; `control` receives the field handle and returns
    /// the control markup.
    #[must_use]
    pub fn render_with<F>(&self, control: F) -> String
    where
        F: FnOnce(&FieldHandle<S>) -> String,
    {
        let control = control(&self.field);
        render_field(&self.field, &self.layout, &control)
    }

    /// Renders the block around fixed control markup.
    #[must_use]
    pub fn render_static(&self, control: &str) -> String {
        render_field(&self.field, &self.layout, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleSchema;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Profile {
        bio: String,
    }

    fn wrapper() -> FieldWrapper<RuleSchema<Profile>> {
        let form = FormController::new(RuleSchema::new(), &Profile { bio: String::new() }).unwrap();
        FieldWrapper::new(&form, "bio").unwrap()
    }

    #[test]
    fn test_bare_field_has_no_label_or_error() {
        let html = wrapper().render_static("<input>");
        assert!(html.contains("<input>"));
        assert!(!html.contains("<label"));
        assert!(!html.contains("invalid-feedback"));
        assert!(!html.contains("form-text"));
    }

    #[test]
    fn test_label_and_description() {
        let html = wrapper()
            .layout(
                FieldLayout::new()
                    .label("Bio")
                    .description("Tell us about yourself")
                    .item_class("col-6")
                    .label_class("fw-bold"),
            )
            .render_with(|field| format!(r#"<textarea name="{}"></textarea>"#, field.name()));
        assert!(html.contains(r#"for="id_bio""#));
        assert!(html.contains("form-label text-muted fw-bold"));
        assert!(html.contains("Tell us about yourself"));
        assert!(html.contains("mb-3 col-6"));
        assert!(html.contains(r#"name="bio""#));
    }

    #[test]
    fn test_single_error_message() {
        let wrapper = wrapper().layout(FieldLayout::new().label("Bio"));
        wrapper.field().controller().set_error("bio", "too short");
        wrapper.field().controller().set_error("bio", "too dull");

        let html = wrapper.render_static("<textarea></textarea>");
        assert_eq!(html.matches("invalid-feedback").count(), 1);
        assert!(html.contains("too short"));
        assert!(!html.contains("too dull"));
        assert!(html.contains("text-danger"));

        let attrs = wrapper.control_attrs();
        assert_eq!(attrs.get("aria-invalid").map(String::as_str), Some("true"));
        assert_eq!(
            attrs.get("aria-describedby").map(String::as_str),
            Some("id_bio_message")
        );
    }
}
