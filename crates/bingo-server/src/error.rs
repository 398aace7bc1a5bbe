//! Error types for the REST surface.
//!
//! [`ApiError`] renders as the shared failure body
//! `{success: false, error, code}` with the HTTP status implied by the
//! code.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bingo_core::RoomError;
use bingo_types::{ApiErrorBody, ErrorCode};
use tracing::error;

/// A failed REST call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The request body or query could not be decoded.
    #[error("{0}")]
    Malformed(String),
}

impl ApiError {
    /// Wire code of this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Room(err) => err.code(),
            Self::Malformed(_) => ErrorCode::InvalidRequest,
        }
    }
}

/// HTTP status for a wire code.
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::InvalidSize => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
        ErrorCode::RoomNotFound => StatusCode::NOT_FOUND,
        ErrorCode::RoomFull | ErrorCode::PlayerExists => StatusCode::CONFLICT,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            Self::Room(err) => {
                if let RoomError::Internal(detail) = err {
                    error!(detail = %detail, "Internal error serving request");
                }
                err.public_message()
            }
            Self::Malformed(msg) => msg.clone(),
        };
        (status_for(code), axum::Json(ApiErrorBody::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_codes() {
        assert_eq!(status_for(ErrorCode::InvalidSize), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorCode::PlayerExists), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(RoomError::Closed).code(), ErrorCode::RoomNotFound);
    }

    #[test]
    fn internal_detail_is_not_rendered() {
        let response = ApiError::from(RoomError::Internal(String::from("disk on fire"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
