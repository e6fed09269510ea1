//! Pre-bound field components derived from a controller.
//!
//! [`FormComponents`] hands out [`BoundField`]s that already know how to read
//! their value, report changes and blurs, and display errors. Callers only
//! choose a path, a layout and any extra native attributes.

use std::fmt;

use crate::controller::FormController;
use crate::error::Result;
use crate::field::FieldHandle;
use crate::schema::Schema;
use crate::widgets::{BootstrapTextInput, BootstrapTextarea, Widget, WidgetAttrs};
use crate::wrapper::{control_attrs, render_field, FieldLayout};

/// Attributes owned by the binding; passthrough attributes never set them.
const BOUND_ATTRS: &[&str] = &["name", "value"];

/// Options accepted by every bound component.
#[derive(Debug, Clone, Default)]
pub struct FieldProps {
    /// Field path.
    pub name: String,
    /// Label, description and class options.
    pub layout: FieldLayout,
    /// Native attributes passed through to the control.
    pub attrs: WidgetAttrs,
}

impl FieldProps {
    /// Creates props for the field at `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.layout.label = Some(label.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.layout.description = Some(description.into());
        self
    }

    /// Replaces the whole layout.
    #[must_use]
    pub fn layout(mut self, layout: FieldLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Adds a native attribute for the control.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }
}

/// Renders the control inside a bound field.
///
/// `attrs` already carries the wiring the field block expects (`id`, ARIA
/// attributes, `disabled`) merged with the caller's passthrough attributes.
pub trait FieldControl<S: Schema> {
    /// Renders the control markup for `field`.
    fn render(&self, field: &FieldHandle<S>, attrs: &WidgetAttrs) -> String;
}

impl<S, F> FieldControl<S> for F
where
    S: Schema,
    F: Fn(&FieldHandle<S>, &WidgetAttrs) -> String,
{
    fn render(&self, field: &FieldHandle<S>, attrs: &WidgetAttrs) -> String {
        self(field, attrs)
    }
}

/// Adapts a [`Widget`] into a field control fed from the field's value.
#[derive(Debug, Clone)]
pub struct WidgetControl<W>(pub W);

impl<S: Schema, W: Widget> FieldControl<S> for WidgetControl<W> {
    fn render(&self, field: &FieldHandle<S>, attrs: &WidgetAttrs) -> String {
        self.0.render(field.name(), &field.text(), attrs)
    }
}

/// Fixed markup; the control manages its own wiring.
#[derive(Debug, Clone)]
pub struct StaticControl(pub String);

impl<S: Schema> FieldControl<S> for StaticControl {
    fn render(&self, _field: &FieldHandle<S>, _attrs: &WidgetAttrs) -> String {
        self.0.clone()
    }
}

/// A control bound to one field of a form.
pub struct BoundField<S: Schema, C> {
    field: FieldHandle<S>,
    layout: FieldLayout,
    attrs: WidgetAttrs,
    control: C,
}

impl<S: Schema, C> fmt::Debug for BoundField<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("field", &self.field)
            .field("layout", &self.layout)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl<S: Schema, C: FieldControl<S>> BoundField<S, C> {
    fn new(field: FieldHandle<S>, props: FieldProps, control: C) -> Self {
        let mut attrs = props.attrs;
        for key in BOUND_ATTRS {
            attrs.remove(key);
        }
        Self {
            field,
            layout: props.layout,
            attrs,
            control,
        }
    }

    /// Returns the underlying field handle.
    #[must_use]
    pub const fn handle(&self) -> &FieldHandle<S> {
        &self.field
    }

    /// Returns the layout options.
    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Attributes handed to the control on the next render.
    #[must_use]
    pub fn control_attrs(&self) -> WidgetAttrs {
        let mut attrs = self.attrs.clone();
        let wiring = control_attrs(&self.field, &self.layout);
        for (key, value) in wiring.attrs {
            if key == "class" {
                attrs.add_class(&value);
            } else {
                attrs.set(key, value);
            }
        }
        if self.field.is_disabled() {
            attrs.set("disabled", "");
        }
        attrs
    }

    /// Renders the field block with the control in it.
    #[must_use]
    pub fn render(&self) -> String {
        let control = self.control.render(&self.field, &self.control_attrs());
        render_field(&self.field, &self.layout, &control)
    }

    /// Forwards text typed into the control.
    ///
    /// # Errors
    ///
    /// Same as [`FieldHandle::change`].
    pub fn change(&self, text: &str) -> Result<()> {
        self.field.change(text)
    }

    /// Forwards a blur from the control.
    ///
    /// # Errors
    ///
    /// Same as [`FieldHandle::blur`].
    pub fn blur(&self) -> Result<()> {
        self.field.blur()
    }
}

/// Factory for components bound to one controller.
///
/// # Example
///
/// ```
/// use oxide_forms::{FieldProps, FormComponents, FormController, RuleSchema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Note {
///     title: String,
///     body: String,
/// }
///
/// let form = FormController::new(
///     RuleSchema::<Note>::new(),
///     &Note { title: "Todo".into(), body: String::new() },
/// )
/// .unwrap();
/// let components = FormComponents::new(form);
///
/// let title = components
///     .input(FieldProps::new("title").label("Title").attr("maxlength", "80"))
///     .unwrap();
/// title.change("Groceries").unwrap();
/// assert!(title.render().contains(r#"value="Groceries""#));
///
/// let body = components.textarea(FieldProps::new("body")).unwrap();
/// assert!(body.render().contains("<textarea"));
/// ```
pub struct FormComponents<S: Schema> {
    controller: FormController<S>,
}

impl<S: Schema> fmt::Debug for FormComponents<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormComponents")
            .field("controller", &self.controller)
            .finish()
    }
}

impl<S: Schema> FormComponents<S> {
    /// Creates the component set for `controller`.
    #[must_use]
    pub const fn new(controller: FormController<S>) -> Self {
        Self { controller }
    }

    /// Returns the controller the components are bound to.
    #[must_use]
    pub const fn controller(&self) -> &FormController<S> {
        &self.controller
    }

    /// A single-line text input. A `type` attribute selects the input type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidPath`] when `props.name` does not parse.
    pub fn input(&self, props: FieldProps) -> Result<BoundField<S, WidgetControl<BootstrapTextInput>>> {
        let widget = props
            .attrs
            .get("type")
            .map_or_else(BootstrapTextInput::new, |input_type| {
                BootstrapTextInput::of_type(input_type.as_str())
            });
        self.field(props, WidgetControl(widget))
    }

    /// A multi-line text input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidPath`] when `props.name` does not parse.
    pub fn textarea(&self, props: FieldProps) -> Result<BoundField<S, WidgetControl<BootstrapTextarea>>> {
        self.field(props, WidgetControl(BootstrapTextarea::default()))
    }

    /// Binds an arbitrary control.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidPath`] when `props.name` does not parse.
    pub fn field<C: FieldControl<S>>(&self, props: FieldProps, control: C) -> Result<BoundField<S, C>> {
        let field = self.controller.register(&props.name)?;
        Ok(BoundField::new(field, props, control))
    }
}
