//! Error types for the client crate.

use bingo_types::ErrorCode;

/// Errors surfaced by the session driver and the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The `WebSocket` could not be opened or broke mid-stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// The HTTP request itself failed.
    #[error("http error: {0}")]
    Http(String),

    /// The server answered with a failure body.
    #[error("{code}: {message}")]
    Api {
        /// Wire code from the failure body.
        code: ErrorCode,
        /// Message from the failure body.
        message: String,
    },

    /// A payload could not be encoded or decoded.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The session task has stopped.
    #[error("session closed")]
    Closed,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
