//! # oxide-forms
//!
//! Schema-bound forms with Bootstrap 5 controls.
//!
//! This crate provides:
//! - A form state controller tracking values, touched and dirty flags,
//!   validation errors and submission status
//! - Field bindings and pre-bound input/textarea components
//! - Identity-key resets and unsaved-changes protection
//! - A rule-based validation schema and field presets
//! - Error and empty-state cards for data views
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_forms::{FieldProps, FormOptions, PageEvents, RuleSchema, SchemaForm};
//! use oxide_forms::fields::{char_field, email_field};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Contact {
//!     name: String,
//!     email: String,
//! }
//!
//! let schema = RuleSchema::<Contact>::new()
//!     .field(char_field("name", 100, true).unwrap())
//!     .field(email_field("email", true).unwrap());
//!
//! let form = SchemaForm::new(
//!     schema,
//!     &Contact { name: String::new(), email: String::new() },
//!     |contact: Contact| async move {
//!         println!("saving {}", contact.name);
//!         Ok::<(), std::io::Error>(())
//!     },
//!     FormOptions::new().warn_on_unsaved_changes(true),
//!     PageEvents::current(),
//! )
//! .unwrap();
//!
//! let html = form.render(|ctx| {
//!     let name = ctx.components.input(FieldProps::new("name").label("Name"));
//!     let email = ctx
//!         .components
//!         .input(FieldProps::new("email").label("Email").attr("type", "email"));
//!     [name, email]
//!         .into_iter()
//!         .filter_map(Result::ok)
//!         .map(|field| field.render())
//!         .collect()
//! });
//! assert!(html.contains(r#"name="email""#));
//! ```
//!
//! ## Submitting
//!
//! ```rust
//! use oxide_forms::{FieldPath, FormController, RuleSchema, SubmitOutcome};
//! use oxide_forms::fields::email_field;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Login {
//!     email: String,
//! }
//!
//! # futures::executor::block_on(async {
//! let schema = RuleSchema::<Login>::new().field(email_field("email", true).unwrap());
//! let form = FormController::new(schema, &Login { email: String::new() }).unwrap();
//!
//! let outcome = form.submit(|_| async { Ok::<(), ()>(()) }).await.unwrap();
//! assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
//!
//! form.set_value(&FieldPath::parse("email").unwrap(), "ada@example.com".into())
//!     .unwrap();
//! let outcome = form.submit(|login: Login| async move {
//!     assert_eq!(login.email, "ada@example.com");
//!     Ok::<(), ()>(())
//! });
//! assert_eq!(outcome.await, Ok(SubmitOutcome::Submitted));
//! assert!(!form.state().dirty);
//! # });
//! ```
//!
//! ## Widgets
//!
//! Available Bootstrap 5 widgets:
//! - `BootstrapTextInput` - Text, email, password, number inputs
//! - `BootstrapTextarea` - Multi-line text input
//!
//! Any other control can be bound with [`FormComponents::field`].

mod components;
mod controller;
mod error;
mod field;
pub mod fields;
mod form;
mod lifecycle;
mod observer;
mod page;
mod path;
pub mod schema;
mod state;
pub mod status;
pub mod validation;
pub mod widgets;
mod wrapper;

pub use components::{BoundField, FieldControl, FieldProps, FormComponents, StaticControl, WidgetControl};
pub use controller::{FormController, SubmitOutcome};
pub use error::{FormError, Result, ValidationErrors, NON_FIELD_ERRORS};
pub use field::FieldHandle;
pub use form::{
    FormContext, FormOptions, SchemaForm, SubmitEvent, DEFAULT_UNSAVED_CHANGES_MESSAGE,
};
pub use lifecycle::{FormKey, KeyTracker, UnsavedChangesGuard};
pub use observer::Subscription;
pub use page::{BeforeUnloadEvent, PageEvents};
pub use path::{FieldPath, PathSegment};
pub use schema::{FieldRules, FnSchema, RuleSchema, Schema, Validation};
pub use state::{FormEvent, FormState};
pub use wrapper::{control_attrs, render_field, FieldLayout, FieldWrapper};
