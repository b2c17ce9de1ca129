//! Errors returned by the Qlik Cloud API client

use thiserror::Error;

/// Errors that can occur when calling the Qlik Cloud APIs
///
/// Response bodies are kept verbatim so callers can show the platform's own
/// explanation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The platform answered with a non-success status
    #[error("{method} {path} returned {status}: {message}")]
    Http {
        status: u16,
        method: String,
        path: String,
        message: String,
    },

    /// The addressed entity does not exist (HTTP 404)
    #[error("{method} {path} returned 404: {message}")]
    NotFound {
        method: String,
        path: String,
        message: String,
    },

    /// The request never produced a response
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not match the expected shape
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// The client credentials were rejected
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether this error means the entity is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// HTTP status, when the platform answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } | ClientError::Auth { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Result type for client calls
pub type ClientResult<T> = Result<T, ClientError>;
