//! Bootstrap 5 text controls.

use super::{html_escape, Widget, WidgetAttrs};

/// Attributes the widget writes itself. Passthrough values for these are
/// ignored, except `class` (merged) and `id` (kept when given).
const OWNED: &[&str] = &["name", "value", "type"];

/// Collects the attributes of a `form-control` element.
///
/// Passthrough attributes come first so the widget's own values win.
fn control_attrs(name: &str, attrs: &WidgetAttrs, placeholder: Option<&str>) -> WidgetAttrs {
    let mut out = WidgetAttrs::new();
    for (key, value) in attrs.attrs.iter().filter(|(k, _)| !OWNED.contains(&k.as_str())) {
        out.set(key.as_str(), value.as_str());
    }

    out.remove("class");
    out.add_class("form-control");
    if let Some(extra) = attrs.get("class") {
        out.add_class(extra);
    }
    if out.get("id").is_none() {
        out.set("id", format!("id_{name}"));
    }
    if let Some(text) = placeholder {
        if out.get("placeholder").is_none() {
            out.set("placeholder", text);
        }
    }
    out.set("name", name);
    out
}

/// A single-line `<input>` styled with `form-control`.
#[derive(Debug, Clone)]
pub struct BootstrapTextInput {
    /// Value of the `type` attribute.
    pub input_type: String,
    pub placeholder: Option<String>,
}

impl Default for BootstrapTextInput {
    fn default() -> Self {
        Self::of_type("text")
    }
}

impl BootstrapTextInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An input of any HTML type, e.g. `"tel"` or `"date"`.
    #[must_use]
    pub fn of_type(input_type: impl Into<String>) -> Self {
        Self {
            input_type: input_type.into(),
            placeholder: None,
        }
    }

    #[must_use]
    pub fn password() -> Self {
        Self::of_type("password")
    }

    #[must_use]
    pub fn email() -> Self {
        Self::of_type("email")
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of_type("number")
    }

    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }
}

impl Widget for BootstrapTextInput {
    fn render(&self, name: &str, value: &str, attrs: &WidgetAttrs) -> String {
        let attrs = control_attrs(name, attrs, self.placeholder.as_deref())
            .with("type", self.input_type.as_str());
        // Written separately: an empty value must not render as a bare attribute.
        format!(r#"<input {} value="{}">"#, attrs.to_html(), html_escape(value))
    }

    fn input_type(&self) -> &str {
        &self.input_type
    }
}

/// A multi-line `<textarea>` styled with `form-control`.
#[derive(Debug, Clone)]
pub struct BootstrapTextarea {
    /// Default `rows`; a passthrough `rows` attribute overrides it.
    pub rows: usize,
    pub placeholder: Option<String>,
}

impl Default for BootstrapTextarea {
    fn default() -> Self {
        Self::new(4)
    }
}

impl BootstrapTextarea {
    #[must_use]
    pub const fn new(rows: usize) -> Self {
        Self {
            rows,
            placeholder: None,
        }
    }

    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }
}

impl Widget for BootstrapTextarea {
    fn render(&self, name: &str, value: &str, attrs: &WidgetAttrs) -> String {
        let mut attrs = control_attrs(name, attrs, self.placeholder.as_deref());
        if attrs.get("rows").is_none() {
            attrs.set("rows", self.rows.to_string());
        }
        format!("<textarea {}>{}</textarea>", attrs.to_html(), html_escape(value))
    }

    fn input_type(&self) -> &str {
        "textarea"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let html = BootstrapTextInput::new().render("username", "", &WidgetAttrs::new());
        assert_eq!(
            html,
            r#"<input class="form-control" id="id_username" name="username" type="text" value="">"#
        );
    }

    #[test]
    fn test_input_placeholder_yields_to_passthrough() {
        let widget = BootstrapTextInput::email().placeholder("you@example.com");
        let html = widget.render("email", "a@b.co", &WidgetAttrs::new());
        assert!(html.contains(r#"placeholder="you@example.com""#));
        assert!(html.contains(r#"type="email""#));

        let attrs = WidgetAttrs::new().with("placeholder", "Work address");
        let html = widget.render("email", "", &attrs);
        assert!(html.contains(r#"placeholder="Work address""#));
        assert!(!html.contains("you@example.com"));
    }

    #[test]
    fn test_owned_attrs_cannot_be_overridden() {
        let attrs = WidgetAttrs::new()
            .with("name", "hijack")
            .with("value", "hijack")
            .with("type", "hidden")
            .with("maxlength", "10")
            .with("class", "is-invalid");
        let html = BootstrapTextInput::new().render("title", "Real", &attrs);
        assert!(!html.contains("hijack"));
        assert!(!html.contains("hidden"));
        assert!(html.contains(r#"value="Real""#));
        assert!(html.contains(r#"maxlength="10""#));
        assert!(html.contains(r#"class="form-control is-invalid""#));
    }

    #[test]
    fn test_custom_id_is_kept() {
        let attrs = WidgetAttrs::new().with("id", "login-user");
        let html = BootstrapTextInput::number().render("age", "3", &attrs);
        assert!(html.contains(r#"id="login-user""#));
        assert!(html.contains(r#"type="number""#));
    }

    #[test]
    fn test_textarea_rows_and_escaping() {
        let html = BootstrapTextarea::new(6).render(
            "content",
            "Hello <b>",
            &WidgetAttrs::new().with("readonly", ""),
        );
        assert!(html.starts_with("<textarea "));
        assert!(html.contains(r#"rows="6""#));
        assert!(html.contains(" readonly"));
        assert!(html.ends_with(">Hello &lt;b&gt;</textarea>"));

        let html = BootstrapTextarea::default().render("notes", "", &WidgetAttrs::new().with("rows", "2"));
        assert!(html.contains(r#"rows="2""#));
        assert!(!html.contains(r#"rows="4""#));
    }
}
