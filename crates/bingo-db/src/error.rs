//! Error types for the persistence layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`fred`] and [`serde_json`] errors.

use bingo_types::SnapshotError;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored snapshot could not be decoded into a room.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// A key was not found.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The backend is refusing writes.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
