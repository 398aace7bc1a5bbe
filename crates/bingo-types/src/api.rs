//! REST request and response bodies.
//!
//! Success bodies carry `success: true`; failures share [`ApiErrorBody`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{PlayerId, RoomId};
use crate::structs::{RoomSettings, RoomSettingsPatch, RoomStatus};

/// Machine-readable failure code returned alongside an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ErrorCode {
    /// Malformed or out-of-range input.
    InvalidRequest,
    /// No live room with that code.
    RoomNotFound,
    /// The room is at capacity.
    RoomFull,
    /// The display name is already taken in the room.
    PlayerExists,
    /// The caller is not allowed to do that.
    Unauthorized,
    /// The card size is not a positive perfect square.
    InvalidSize,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// The wire spelling of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::PlayerExists => "PLAYER_EXISTS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidSize => "INVALID_SIZE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of every failed REST call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ApiErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: ErrorCode,
}

impl ApiErrorBody {
    /// Build a failure body.
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }
}

/// `POST /api/bingo/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreateRoomRequest {
    /// Room display name.
    pub room_name: String,
    /// Host display name.
    pub player_name: String,
    /// Capacity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    /// Initial settings overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RoomSettingsPatch>,
}

/// Successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreateRoomResponse {
    /// Always `true`.
    pub success: bool,
    /// Code other players join with.
    pub room_code: String,
    /// Room identity.
    pub room_id: RoomId,
    /// The host's player id, used to attach.
    pub player_id: PlayerId,
}

/// `POST /api/bingo/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct JoinRoomRequest {
    /// Code of the room to join (case-insensitive).
    pub room_code: String,
    /// Display name.
    pub player_name: String,
}

/// Successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct JoinRoomResponse {
    /// Always `true`.
    pub success: bool,
    /// Canonical room code.
    pub room_code: String,
    /// Room identity.
    pub room_id: RoomId,
    /// The new player's id, used to attach.
    pub player_id: PlayerId,
}

/// `POST /api/bingo/room/{code}/leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LeaveRoomRequest {
    /// The leaving player.
    pub player_id: PlayerId,
}

/// `POST /api/bingo/room/{code}/kick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct KickPlayerRequest {
    /// Must be the current host.
    pub host_id: PlayerId,
    /// Player to remove.
    pub player_id: PlayerId,
    /// Shown to the removed player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `PUT /api/bingo/room/{code}/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UpdateSettingsRequest {
    /// Must be the current host.
    pub host_id: PlayerId,
    /// Fields to change.
    pub settings: RoomSettingsPatch,
}

/// Successful settings update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpdateSettingsResponse {
    /// Always `true`.
    pub success: bool,
    /// The full settings after the change.
    pub settings: RoomSettings,
}

/// Bare acknowledgement for leave and kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ack {
    /// Always `true`.
    pub success: bool,
}

impl Ack {
    /// A successful acknowledgement.
    pub const OK: Self = Self { success: true };
}

/// Query string of `GET /api/bingo/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    /// Room code (case-insensitive).
    pub room_code: String,
}

/// Successful status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusResponse {
    /// Always `true`.
    pub success: bool,
    /// The room.
    pub room: RoomStatus,
}

/// `GET /api/bingo/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomListResponse {
    /// Always `true`.
    pub success: bool,
    /// Every live room.
    pub rooms: Vec<RoomStatus>,
}

/// `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthResponse {
    /// `healthy`.
    pub status: String,
    /// Server time.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Crate version.
    pub version: String,
}
