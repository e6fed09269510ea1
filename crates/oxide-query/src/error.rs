//! Error types for query keys and data fetching.

use thiserror::Error;

/// Error code reported when a request never reached the server.
pub const NETWORK_ERROR_CODE: &str = "ERR_NETWORK";

/// Query-specific errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query needs parameters but none were given.
    #[error("query {query} requires parameters")]
    MissingParams { query: String },

    /// A `{name}` segment of the path has no matching parameter.
    #[error("query {query} is missing path parameter {param}")]
    MissingPathParam { query: String, param: String },

    /// Parameters could not be turned into a path or key.
    #[error("invalid parameters for query {query}: {reason}")]
    InvalidParams { query: String, reason: String },

    /// A query name was registered twice.
    #[error("query already registered: {0}")]
    DuplicateQuery(String),

    /// A response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered with an error status.
    #[error("server responded with status {status}")]
    Response {
        status: u16,
        message: Option<String>,
    },

    /// The request never got a response.
    #[error("network error: {code}")]
    Network { code: String },
}

impl QueryError {
    /// A connectivity failure with the standard network error code.
    #[must_use]
    pub fn network() -> Self {
        Self::Network {
            code: NETWORK_ERROR_CODE.to_string(),
        }
    }

    /// The HTTP status of a server response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed before any response arrived.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { code } if code == NETWORK_ERROR_CODE)
    }

    /// Whether the error came from talking to a server.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Response { .. } | Self::Network { .. })
    }

    /// The message sent by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Response {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
