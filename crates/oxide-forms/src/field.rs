//! Per-field bindings handed out by [`FormController::register`].

use std::fmt;

use serde_json::Value;

use crate::controller::FormController;
use crate::error::Result;
use crate::observer::Subscription;
use crate::path::FieldPath;
use crate::schema::rules::value_text;
use crate::schema::Schema;
use crate::state::FormEvent;

/// A read/write binding for one field of a form.
///
/// The handle holds no state of its own; every read goes to the controller.
pub struct FieldHandle<S: Schema> {
    controller: FormController<S>,
    path: FieldPath,
}

impl<S: Schema> Clone for FieldHandle<S> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            path: self.path.clone(),
        }
    }
}

impl<S: Schema> fmt::Debug for FieldHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<S: Schema> FieldHandle<S> {
    /// Binds an already parsed `path`; see [`FormController::register`].
    #[must_use]
    pub const fn new(controller: FormController<S>, path: FieldPath) -> Self {
        Self { controller, path }
    }

    /// Returns the controller this field is bound to.
    #[must_use]
    pub const fn controller(&self) -> &FormController<S> {
        &self.controller
    }

    /// Returns the field path.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the `name` attribute for the field's control.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.controller.value(&self.path)
    }

    /// Returns the current value as text for an input control.
    #[must_use]
    pub fn text(&self) -> String {
        value_text(&self.value())
    }

    /// Writes a new value.
    ///
    /// # Errors
    ///
    /// Fails when the form is disabled or the value does not fit the path.
    pub fn set(&self, value: Value) -> Result<()> {
        self.controller.set_value(&self.path, value)
    }

    /// Writes text typed into an input control.
    ///
    /// # Errors
    ///
    /// Same as [`FieldHandle::set`].
    pub fn change(&self, text: &str) -> Result<()> {
        self.set(Value::String(text.to_string()))
    }

    /// Notifies the controller that the control lost focus.
    ///
    /// # Errors
    ///
    /// Fails when the form is disabled.
    pub fn blur(&self) -> Result<()> {
        self.controller.blur(&self.path)
    }

    /// Returns the message the field displays, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.controller.error(&self.path)
    }

    /// Returns every message recorded for the field.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.controller.field_errors(&self.path)
    }

    /// Whether the field has been blurred.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.controller.is_touched(&self.path)
    }

    /// Whether the field differs from its baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.controller.is_field_dirty(&self.path)
    }

    /// Whether interaction is currently rejected.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.controller.is_disabled()
    }

    /// Registers a callback for events that concern this field: its own
    /// value and blur events plus form-wide events.
    pub fn subscribe(&self, callback: impl Fn(&FormEvent) + 'static) -> Subscription {
        let path = self.path.clone();
        self.controller.subscribe(move |event| match event.path() {
            Some(changed) if *changed != path => {}
            _ => callback(event),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Serialize, Deserialize)]
    struct Address {
        street: String,
        city: String,
        zip: Option<u32>,
    }

    fn controller() -> FormController<RuleSchema<Address>> {
        let defaults = Address {
            street: "Main".to_string(),
            city: "Ghent".to_string(),
            zip: Some(9000),
        };
        FormController::new(RuleSchema::new(), &defaults).unwrap()
    }

    #[test]
    fn test_read_write() {
        let form = controller();
        let street = form.register("street").unwrap();
        assert_eq!(street.name(), "street");
        assert_eq!(street.text(), "Main");

        street.change("High").unwrap();
        assert_eq!(street.value(), json!("High"));
        assert!(street.is_dirty());

        let zip = form.register("zip").unwrap();
        assert_eq!(zip.text(), "9000");
    }

    #[test]
    fn test_error_is_first_message() {
        let form = controller();
        let city = form.register("city").unwrap();
        assert_eq!(city.error(), None);
        form.set_error("city", "unknown city");
        form.set_error("city", "second");
        assert_eq!(city.error(), Some("unknown city".to_string()));
        assert_eq!(city.errors().len(), 2);
    }

    #[test]
    fn test_subscribe_filters_other_fields() {
        let form = controller();
        let street = form.register("street").unwrap();
        let city = form.register("city").unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let _sub = street.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        city.change("Bruges").unwrap();
        street.change("Dam").unwrap();
        street.blur().unwrap();
        form.reset(None).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], FormEvent::ValueChanged { .. }));
        assert!(matches!(events[1], FormEvent::Blurred { .. }));
        assert_eq!(events[2], FormEvent::Reset { generation: 1 });
    }
}
