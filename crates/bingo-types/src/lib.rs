//! Shared type definitions for the Buzzword Bingo coordinator.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate or process boundary. Wire types flow to `TypeScript` via `ts-rs`
//! for browser clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for rooms, players, votes, connections
//! - [`enums`] -- Enumeration types (patterns, ballots, phases, events)
//! - [`limits`] -- Fixed limits and defaults
//! - [`structs`] -- Core entity structs (room, player, grid, voting, settings)
//! - [`protocol`] -- `WebSocket` message envelopes in both directions
//! - [`api`] -- REST request and response bodies
//! - [`snapshot`] -- Versioned persisted form of a room

pub mod api;
pub mod enums;
pub mod ids;
pub mod limits;
pub mod protocol;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use api::{
    Ack, ApiErrorBody, CreateRoomRequest, CreateRoomResponse, ErrorCode, HealthResponse,
    JoinRoomRequest, JoinRoomResponse, KickPlayerRequest, LeaveRoomRequest, RoomListResponse,
    StatusQuery, StatusResponse, UpdateSettingsRequest, UpdateSettingsResponse,
};
pub use enums::{
    Difficulty, LeaveReason, RoomEventType, RoomPhase, Theme, Vote, VoteResult, VotingStatus,
    WinPattern,
};
pub use ids::{ConnectionId, PlayerId, RoomId, VotingSessionId};
pub use protocol::{ClientMessage, ServerMessage};
pub use snapshot::{PlayerEntry, RoomSnapshot, SNAPSHOT_SCHEMA_VERSION, SnapshotError};
pub use structs::{
    GameState, GridCell, Player, PlayerSummary, Room, RoomEvent, RoomSettings, RoomSettingsPatch,
    RoomStatistics, RoomStatus, VotingSession, WinPatternCounts, WinRecord,
};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::RoomId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::VotingSessionId::export_all();
        let _ = crate::ids::ConnectionId::export_all();

        let _ = crate::enums::WinPattern::export_all();
        let _ = crate::enums::Difficulty::export_all();
        let _ = crate::enums::Theme::export_all();
        let _ = crate::enums::Vote::export_all();
        let _ = crate::enums::VotingStatus::export_all();
        let _ = crate::enums::VoteResult::export_all();
        let _ = crate::enums::LeaveReason::export_all();
        let _ = crate::enums::RoomPhase::export_all();
        let _ = crate::enums::RoomEventType::export_all();

        let _ = crate::structs::GridCell::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::PlayerSummary::export_all();
        let _ = crate::structs::WinRecord::export_all();
        let _ = crate::structs::GameState::export_all();
        let _ = crate::structs::VotingSession::export_all();
        let _ = crate::structs::RoomSettings::export_all();
        let _ = crate::structs::RoomSettingsPatch::export_all();
        let _ = crate::structs::WinPatternCounts::export_all();
        let _ = crate::structs::RoomStatistics::export_all();
        let _ = crate::structs::RoomEvent::export_all();
        let _ = crate::structs::RoomStatus::export_all();

        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::ClientMessage::export_all();

        let _ = crate::api::ErrorCode::export_all();
        let _ = crate::api::ApiErrorBody::export_all();
        let _ = crate::api::CreateRoomRequest::export_all();
        let _ = crate::api::CreateRoomResponse::export_all();
        let _ = crate::api::JoinRoomRequest::export_all();
        let _ = crate::api::JoinRoomResponse::export_all();
        let _ = crate::api::LeaveRoomRequest::export_all();
        let _ = crate::api::KickPlayerRequest::export_all();
        let _ = crate::api::UpdateSettingsRequest::export_all();
        let _ = crate::api::UpdateSettingsResponse::export_all();
        let _ = crate::api::Ack::export_all();
        let _ = crate::api::StatusResponse::export_all();
        let _ = crate::api::RoomListResponse::export_all();
        let _ = crate::api::HealthResponse::export_all();

        let _ = crate::snapshot::PlayerEntry::export_all();
        let _ = crate::snapshot::RoomSnapshot::export_all();
    }
}
