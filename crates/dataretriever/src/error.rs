//! Error types for data clients.

use helio_common::HelioError;
use thiserror::Error;

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The client does not serve this query; a dispatcher may try another.
    #[error("{client} cannot handle query: {reason}")]
    CannotHandle { client: String, reason: String },

    /// The requested cadence is not offered by any era active in range.
    #[error("Resolution '{requested}' is not available for {range}; available: {available}")]
    InvalidResolution {
        requested: String,
        range: String,
        available: String,
    },

    #[error("No client can handle query: {0}")]
    NoClient(String),

    #[error(transparent)]
    Common(#[from] HelioError),
}

impl ClientError {
    pub fn cannot_handle(client: &str, reason: impl Into<String>) -> Self {
        ClientError::CannotHandle {
            client: client.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a dispatcher should move on to the next client.
    pub fn is_cannot_handle(&self) -> bool {
        matches!(self, ClientError::CannotHandle { .. })
    }
}
