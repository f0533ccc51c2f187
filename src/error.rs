//! Error types for the portal client.

use std::time::Duration;

use reqwest::StatusCode;

/// Error types for HTTP operations performed through [`HttpClient`].
///
/// [`HttpClient`]: crate::client::HttpClient
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, connection refused, reset, TLS)
    #[error("Network request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server answered 401 Unauthorized
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request URL could not be built from the base URL and path
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Builds the error for a non-success status, classifying 401 separately.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized { message }
        } else {
            Self::Http { status, message }
        }
    }

    /// Returns the HTTP status associated with this error, if the server responded.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns true for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Error types for durable storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No storage backend is available (e.g. `localStorage` disabled)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the storage contents failed
    #[error("Failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),
}
