//! Error types for room operations.

use bingo_grid::GridError;
use bingo_types::ErrorCode;

/// Failure of a room operation.
///
/// Every variant except [`RoomError::Internal`] is caused by the caller and
/// leaves room state untouched. `Internal` also leaves state untouched: the
/// actor only commits after a successful persistence write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    InvalidRequest(String),

    /// No live room has the given code.
    #[error("Room not found")]
    RoomNotFound,

    /// The roster is at capacity.
    #[error("Room is full")]
    RoomFull,

    /// Another member already uses the name (case-insensitively).
    #[error("Player name already taken in this room")]
    PlayerExists,

    /// A host-only action attempted by someone else.
    #[error("{0}")]
    Unauthorized(String),

    /// Card size is not a perfect square of at least 9.
    #[error("Card size must be a perfect square of at least 9")]
    InvalidSize,

    /// Persistence or another server-side failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The room actor has shut down.
    #[error("Room is closed")]
    Closed,
}

impl RoomError {
    /// The stable wire code reported to clients.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::RoomNotFound | Self::Closed => ErrorCode::RoomNotFound,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::PlayerExists => ErrorCode::PlayerExists,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::InvalidSize => ErrorCode::InvalidSize,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message shown to clients. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => String::from("Internal server error"),
            other => other.to_string(),
        }
    }
}

impl From<GridError> for RoomError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidSize { .. } => Self::InvalidSize,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<bingo_db::DbError> for RoomError {
    fn from(err: bingo_db::DbError) -> Self {
        Self::Internal(err.to_string())
    }
}
