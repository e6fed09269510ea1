//! Ready-made rule sets for common text fields.

mod text;

pub use text::{char_field, email_field, password_field, text_field, url_field};
