//! Text field rule presets.

use crate::error::Result;
use crate::schema::FieldRules;
use crate::validation::{
    EmailValidator, MaxLengthValidator, MinLengthValidator, RequiredValidator, UrlValidator,
};

fn with_required(rules: FieldRules, required: bool) -> FieldRules {
    if required {
        rules.validator(RequiredValidator::new())
    } else {
        rules
    }
}

/// Rules for a single-line text field with a maximum length.
///
/// # Errors
///
/// Fails when `path` does not parse.
pub fn char_field(path: &str, max_length: usize, required: bool) -> Result<FieldRules> {
    let rules = FieldRules::new(path)?;
    Ok(with_required(rules, required).validator(MaxLengthValidator::new(max_length)))
}

/// Rules for a multi-line text field.
///
/// # Errors
///
/// Fails when `path` does not parse.
pub fn text_field(path: &str, required: bool) -> Result<FieldRules> {
    Ok(with_required(FieldRules::new(path)?, required))
}

/// Rules for an email field.
///
/// # Errors
///
/// Fails when `path` does not parse.
pub fn email_field(path: &str, required: bool) -> Result<FieldRules> {
    let rules = FieldRules::new(path)?;
    Ok(with_required(rules, required).validator(EmailValidator::new()))
}

/// Rules for a password field, which is always required.
///
/// # Errors
///
/// Fails when `path` does not parse.
pub fn password_field(path: &str, min_length: Option<usize>) -> Result<FieldRules> {
    let mut rules = FieldRules::new(path)?.validator(RequiredValidator::new());

    if let Some(min) = min_length {
        rules = rules.validator(MinLengthValidator::new(min));
    }

    Ok(rules)
}

/// Rules for a URL field.
///
/// # Errors
///
/// Fails when `path` does not parse.
pub fn url_field(path: &str, required: bool) -> Result<FieldRules> {
    let rules = FieldRules::new(path)?;
    Ok(with_required(rules, required).validator(UrlValidator::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_char_field() {
        let rules = char_field("username", 150, true).unwrap();
        assert_eq!(rules.path.as_str(), "username");
        assert_eq!(rules.validators.len(), 2); // Required + MaxLength
    }

    #[test]
    fn test_email_field() {
        let rules = email_field("contact.email", true).unwrap();
        assert_eq!(
            rules.check(&json!({"contact": {"email": "nope"}})),
            vec!["Enter a valid email address.".to_string()]
        );
        assert!(rules
            .check(&json!({"contact": {"email": "a@b.io"}}))
            .is_empty());
    }

    #[test]
    fn test_password_field() {
        let rules = password_field("password", Some(8)).unwrap();
        assert_eq!(rules.validators.len(), 2); // Required + MinLength
        assert_eq!(
            rules.check(&json!({"password": ""})),
            vec!["This field is required.".to_string()]
        );
    }

    #[test]
    fn test_optional_url_may_be_blank() {
        let rules = url_field("homepage", false).unwrap();
        assert!(rules.check(&json!({"homepage": ""})).is_empty());
        assert_eq!(rules.check(&json!({"homepage": "ftp://x"})).len(), 1);
    }

    #[test]
    fn test_invalid_path() {
        assert!(text_field("a..b", false).is_err());
    }
}
