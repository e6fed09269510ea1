//! Status cards shown in place of data: error and empty states.

use std::error::Error;
use std::fmt;

use ironhtml::typed::Element;
use ironhtml_elements::{Button, Div, H5, I, P};
use oxide_query::QueryError;
use tracing::debug;

/// Message for transport errors that carry no server message.
pub const SERVER_ERROR_MESSAGE: &str = "An error occurred while communicating with the server.";
/// Message for errors that describe nothing.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";
/// Text of the empty-state card.
pub const EMPTY_MESSAGE: &str = "No data available";

/// How an error is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server rejected the credentials (HTTP 401).
    Unauthorized,
    /// No response arrived at all.
    Network,
    /// Anything else.
    Generic,
}

/// The action button an error card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Logout,
    Retry { label: &'static str },
}

impl ErrorAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Logout => "Logout",
            Self::Retry { label } => label,
        }
    }
}

fn find_query_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a QueryError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(query) = err.downcast_ref::<QueryError>() {
            return Some(query);
        }
        current = err.source();
    }
    None
}

/// Displays a failed load with a message and, where it helps, an action.
///
/// # Example
///
/// ```
/// use oxide_forms::status::{ErrorAction, ErrorCard, ErrorKind};
/// use oxide_query::QueryError;
///
/// let card = ErrorCard::new(&QueryError::network()).on_retry(|| println!("retrying"));
/// assert_eq!(card.kind(), ErrorKind::Network);
/// assert_eq!(card.action().map(ErrorAction::label), Some("No Network – Try Again"));
/// assert!(card.activate());
/// ```
pub struct ErrorCard {
    kind: ErrorKind,
    message: String,
    is_loading: bool,
    on_retry: Option<Box<dyn Fn()>>,
    on_logout: Option<Box<dyn Fn()>>,
}

impl ErrorCard {
    /// Classifies `error` and extracts its message.
    #[must_use]
    pub fn new(error: &(dyn Error + 'static)) -> Self {
        let query = find_query_error(error);

        let kind = match query {
            Some(err) if err.status() == Some(401) => ErrorKind::Unauthorized,
            Some(err) if err.is_network() => ErrorKind::Network,
            _ => ErrorKind::Generic,
        };

        let message = match query {
            Some(err) if err.is_transport() => err
                .server_message()
                .unwrap_or(SERVER_ERROR_MESSAGE)
                .to_string(),
            _ => {
                let text = error.to_string();
                if text.trim().is_empty() {
                    UNEXPECTED_ERROR_MESSAGE.to_string()
                } else {
                    text
                }
            }
        };

        Self {
            kind,
            message,
            is_loading: false,
            on_retry: None,
            on_logout: None,
        }
    }

    /// Sets the callback run by the retry button.
    #[must_use]
    pub fn on_retry(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_retry = Some(Box::new(callback));
        self
    }

    /// Sets the callback run by the logout button.
    #[must_use]
    pub fn on_logout(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_logout = Some(Box::new(callback));
        self
    }

    /// Marks a retry as running; the action is inert meanwhile.
    #[must_use]
    pub const fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The button the card shows. Retry buttons only appear when a retry
    /// callback was given; logout always does for unauthorized errors.
    #[must_use]
    pub fn action(&self) -> Option<ErrorAction> {
        match self.kind {
            ErrorKind::Unauthorized => Some(ErrorAction::Logout),
            ErrorKind::Network => self.on_retry.as_ref().map(|_| ErrorAction::Retry {
                label: "No Network – Try Again",
            }),
            ErrorKind::Generic => self
                .on_retry
                .as_ref()
                .map(|_| ErrorAction::Retry { label: "Try Again" }),
        }
    }

    /// Presses the action button. Returns whether a callback ran.
    #[must_use]
    pub fn activate(&self) -> bool {
        if self.is_loading {
            debug!(kind = ?self.kind, "Ignoring error card action while loading");
            return false;
        }
        let callback = match self.action() {
            Some(ErrorAction::Logout) => self.on_logout.as_ref(),
            Some(ErrorAction::Retry { .. }) => self.on_retry.as_ref(),
            None => None,
        };
        let Some(callback) = callback else {
            return false;
        };
        callback();
        true
    }

    #[must_use]
    pub fn render(&self) -> String {
        let action = self.action();
        let is_loading = self.is_loading;

        Element::<Div>::new()
            .class("card")
            .child::<Div, _>(|header| {
                header
                    .class("card-header")
                    .child::<H5, _>(|title| {
                        title
                            .class("card-title d-flex align-items-center text-danger")
                            .child::<I, _>(|icon| icon.class("bi bi-exclamation-circle me-2"))
                            .text("Error")
                    })
                    .child::<P, _>(|p| p.class("card-text text-muted").text(&self.message))
            })
            .child::<Div, _>(|footer| {
                let footer = footer.class("card-footer d-flex align-items-center justify-content-center gap-3");
                match action {
                    Some(action) => footer.child::<Button, _>(|button| {
                        let spin = if is_loading { " spin" } else { "" };
                        button
                            .attr("type", "button")
                            .class("btn btn-outline-secondary btn-lg")
                            .when(is_loading, |b| b.bool_attr("disabled"))
                            .when(matches!(action, ErrorAction::Retry { .. }), |b| {
                                b.child::<I, _>(|icon| {
                                    icon.class(format!("bi bi-arrow-clockwise me-2{spin}"))
                                })
                            })
                            .text(action.label())
                    }),
                    None => footer,
                }
            })
            .render()
    }
}

impl fmt::Debug for ErrorCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCard")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("is_loading", &self.is_loading)
            .field("action", &self.action())
            .finish_non_exhaustive()
    }
}

/// Placeholder shown when a query returned nothing.
#[derive(Debug, Clone, Default)]
pub struct EmptyCard;

impl EmptyCard {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EmptyCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let html = Element::<Div>::new()
            .class("card w-100")
            .child::<Div, _>(|body| {
                body.class("card-body d-flex flex-column align-items-center justify-content-center px-4 py-5 text-center")
                    .child::<Div, _>(|d| d.class("mb-3").child::<I, _>(|i| i.class("bi bi-inbox fs-1 text-muted")))
                    .child::<P, _>(|p| p.class("fs-5 fw-medium text-muted").text(EMPTY_MESSAGE))
            })
            .render();
        f.write_str(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("loading posts failed")]
    struct LoadFailed(#[source] QueryError);

    #[derive(Debug, Error)]
    #[error("")]
    struct Silent;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, move || inner.set(inner.get() + 1))
    }

    #[test]
    fn test_unauthorized_offers_logout() {
        let err = QueryError::Response {
            status: 401,
            message: None,
        };
        let (logouts, on_logout) = counter();
        let card = ErrorCard::new(&err).on_logout(on_logout);
        assert_eq!(card.kind(), ErrorKind::Unauthorized);
        assert_eq!(card.action(), Some(ErrorAction::Logout));
        assert_eq!(card.message(), SERVER_ERROR_MESSAGE);
        assert!(card.activate());
        assert_eq!(logouts.get(), 1);
        assert!(card.render().contains("Logout"));
    }

    #[test]
    fn test_network_needs_retry_callback() {
        let card = ErrorCard::new(&QueryError::network());
        assert_eq!(card.kind(), ErrorKind::Network);
        assert_eq!(card.action(), None);
        assert!(!card.activate());
        assert!(!card.render().contains("<button"));
    }

    #[test]
    fn test_generic_uses_server_message() {
        let err = QueryError::Response {
            status: 500,
            message: Some("Database unavailable".to_string()),
        };
        let (retries, on_retry) = counter();
        let card = ErrorCard::new(&err).on_retry(on_retry);
        assert_eq!(card.kind(), ErrorKind::Generic);
        assert_eq!(card.message(), "Database unavailable");
        assert_eq!(card.action().map(ErrorAction::label), Some("Try Again"));
        assert!(card.activate());
        assert_eq!(retries.get(), 1);
    }

    #[test]
    fn test_loading_makes_action_inert() {
        let (retries, on_retry) = counter();
        let card = ErrorCard::new(&QueryError::network()).on_retry(on_retry).loading(true);
        assert!(!card.activate());
        assert_eq!(retries.get(), 0);
        let html = card.render();
        assert!(html.contains("disabled"));
        assert!(html.contains("spin"));
    }

    #[test]
    fn test_wrapped_query_error_is_found() {
        let err = LoadFailed(QueryError::Response {
            status: 401,
            message: None,
        });
        assert_eq!(ErrorCard::new(&err).kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_plain_error_messages() {
        let io = std::io::Error::other("disk full");
        assert_eq!(ErrorCard::new(&io).message(), "disk full");
        assert_eq!(ErrorCard::new(&Silent).message(), UNEXPECTED_ERROR_MESSAGE);

        let decode = serde_json::from_str::<u8>("x").map_err(QueryError::from).unwrap_err();
        let card = ErrorCard::new(&decode);
        assert_eq!(card.kind(), ErrorKind::Generic);
        assert!(card.message().starts_with("failed to decode response"));
    }

    #[test]
    fn test_empty_card() {
        let html = EmptyCard::new().render();
        assert!(html.contains(EMPTY_MESSAGE));
        assert!(html.contains("bi-inbox"));
    }
}
