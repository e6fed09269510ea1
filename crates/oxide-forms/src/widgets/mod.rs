//! Input controls rendered inside bound fields.

mod bootstrap;

pub use bootstrap::{BootstrapTextInput, BootstrapTextarea};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extra HTML attributes for a control, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetAttrs {
    pub attrs: BTreeMap<String, String>,
}

impl WidgetAttrs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attrs: BTreeMap::new(),
        }
    }

    /// Inserts or replaces an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.attrs.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attrs.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Appends classes to the `class` attribute.
    pub fn add_class(&mut self, class: &str) {
        let class = class.trim();
        if class.is_empty() {
            return;
        }
        let merged = match self.attrs.get("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.attrs.insert("class".to_string(), merged);
    }

    /// Space-separated `key="value"` pairs. An empty value renders as a
    /// bare boolean attribute such as `disabled`.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.attrs
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!(r#"{k}="{}""#, html_escape(v))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

/// A control that renders the HTML for one field.
pub trait Widget {
    /// Renders the control. `name` is the field path and `value` its text.
    fn render(&self, name: &str, value: &str, attrs: &WidgetAttrs) -> String;

    /// The `type` the control renders with, or the tag name.
    fn input_type(&self) -> &str {
        "text"
    }
}

/// Escapes text for use in HTML content and quoted attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_covers_markup_and_quotes() {
        assert_eq!(html_escape(r#"<a href='x'>"#), "&lt;a href=&#x27;x&#x27;&gt;");
        assert_eq!(html_escape("Tom & Jerry"), "Tom &amp; Jerry");
    }

    #[test]
    fn test_attrs_render_sorted_with_bare_flags() {
        let mut attrs = WidgetAttrs::new().with("required", "").with("autocomplete", "email");
        attrs.set("data-field", "email");
        assert_eq!(attrs.to_html(), r#"autocomplete="email" data-field="email" required"#);
        assert_eq!(attrs.remove("required").as_deref(), Some(""));
        assert!(!attrs.is_empty());
    }

    #[test]
    fn test_add_class() {
        let mut attrs = WidgetAttrs::new();
        attrs.add_class("w-full");
        attrs.add_class(" ");
        attrs.add_class("mt-2");
        assert_eq!(attrs.get("class").map(String::as_str), Some("w-full mt-2"));
    }

    #[test]
    fn test_attr_values_are_escaped() {
        let attrs = WidgetAttrs::new().with("title", r#"say "hi""#);
        assert_eq!(attrs.to_html(), r#"title="say &quot;hi&quot;""#);
    }

    #[test]
    fn test_deserialize_from_map() {
        let attrs: WidgetAttrs =
            serde_json::from_str(r#"{"data-test": "signup", "autocomplete": "off"}"#).unwrap();
        assert_eq!(attrs.get("autocomplete").map(String::as_str), Some("off"));
    }
}
