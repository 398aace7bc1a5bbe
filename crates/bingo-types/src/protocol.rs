//! `WebSocket` wire protocol.
//!
//! One JSON object per frame, discriminated by a `SCREAMING_SNAKE_CASE`
//! `type` field. Every server message carries a `timestamp`; client
//! commands may carry one and it is ignored by the server.
//!
//! | Direction | Types |
//! |-----------|-------|
//! | server -> client | `PLAYER_JOIN`, `PLAYER_LEAVE`, `SQUARE_MARKED`, `SQUARE_UNMARKED`, `BINGO_CLAIM`, `WIN_VOTE`, `VOTING_START`, `VOTING_END`, `NEW_GAME`, `PLAYER_KICK`, `ROOM_SETTINGS_UPDATE`, `PLAYER_LIST_UPDATE`, `GAME_STATE_UPDATE`, `CHAT_MESSAGE`, `ERROR`, `HEARTBEAT` |
//! | client -> server | `MARK_SQUARE`, `CLAIM_BINGO`, `VOTE`, `NEW_GAME`, `CHAT_MESSAGE`, `HEARTBEAT` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{LeaveReason, Vote, VoteResult, WinPattern};
use crate::ids::{PlayerId, VotingSessionId};
use crate::structs::{GameState, GridCell, PlayerSummary, RoomSettings, VotingSession};

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// A message pushed from a room to its attached connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// A player joined the roster.
    #[serde(rename_all = "camelCase")]
    PlayerJoin {
        /// The new player.
        player_id: PlayerId,
        /// Their display name.
        player_name: String,
        /// Whether they are host.
        is_host: bool,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A player left, disconnected, or was removed.
    #[serde(rename_all = "camelCase")]
    PlayerLeave {
        /// The departing player.
        player_id: PlayerId,
        /// Their display name.
        player_name: String,
        /// Why they left.
        reason: LeaveReason,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A player marked a cell on their own card.
    #[serde(rename_all = "camelCase")]
    SquareMarked {
        /// Cell id.
        square_id: String,
        /// Cell text.
        square_text: String,
        /// Who marked it.
        player_id: PlayerId,
        /// Their display name.
        player_name: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A player unmarked a cell on their own card.
    #[serde(rename_all = "camelCase")]
    SquareUnmarked {
        /// Cell id.
        square_id: String,
        /// Cell text.
        square_text: String,
        /// Who unmarked it.
        player_id: PlayerId,
        /// Their display name.
        player_name: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A verified win claim.
    #[serde(rename_all = "camelCase")]
    BingoClaim {
        /// Claimant.
        player_id: PlayerId,
        /// Claimant name.
        player_name: String,
        /// Claimed pattern.
        winning_pattern: WinPattern,
        /// Claimed cell indices.
        winning_cells: Vec<usize>,
        /// Whether the claim went to a vote.
        requires_voting: bool,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A ballot was cast.
    #[serde(rename_all = "camelCase")]
    WinVote {
        /// Session the ballot belongs to.
        voting_session_id: VotingSessionId,
        /// Voter.
        player_id: PlayerId,
        /// Voter name.
        player_name: String,
        /// The ballot.
        vote: Vote,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A voting session opened.
    #[serde(rename_all = "camelCase")]
    VotingStart {
        /// The new session.
        voting_session: Box<VotingSession>,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A voting session resolved.
    #[serde(rename_all = "camelCase")]
    VotingEnd {
        /// The resolved session.
        voting_session_id: VotingSessionId,
        /// Outcome.
        result: VoteResult,
        /// Claimant name when approved.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner_name: Option<String>,
        /// Ballots for.
        votes_for: u32,
        /// Ballots against.
        votes_against: u32,
        /// Abstentions.
        abstained: u32,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// A new round started with a fresh grid.
    #[serde(rename_all = "camelCase")]
    NewGame {
        /// The new shared grid.
        shared_card: Vec<GridCell>,
        /// Name of the initiator, or `System`.
        initiated_by: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// The host removed a player.
    #[serde(rename_all = "camelCase")]
    PlayerKick {
        /// Removed player.
        kicked_player_id: PlayerId,
        /// Removed player's name.
        kicked_player_name: String,
        /// Host name.
        kicked_by: String,
        /// Reason given by the host.
        reason: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// The host changed the settings.
    #[serde(rename_all = "camelCase")]
    RoomSettingsUpdate {
        /// The full new settings.
        settings: RoomSettings,
        /// Host name.
        updated_by: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Full roster, in join order.
    #[serde(rename_all = "camelCase")]
    PlayerListUpdate {
        /// Roster.
        players: Vec<PlayerSummary>,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Round state plus a grid (the recipient's own card when sent on attach).
    #[serde(rename_all = "camelCase")]
    GameStateUpdate {
        /// Round state.
        game_state: GameState,
        /// Grid.
        shared_card: Vec<GridCell>,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Relayed chat.
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        /// Sender.
        player_id: PlayerId,
        /// Sender name.
        player_name: String,
        /// Trimmed, truncated text.
        message: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// An error for the receiving connection only.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Short description.
        error: String,
        /// Optional detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Keep-alive.
    #[serde(rename_all = "camelCase")]
    Heartbeat {
        /// Send time.
        timestamp: DateTime<Utc>,
    },
}

impl ServerMessage {
    /// Every `type` discriminant a server may send.
    pub const TYPES: [&'static str; 16] = [
        "PLAYER_JOIN",
        "PLAYER_LEAVE",
        "SQUARE_MARKED",
        "SQUARE_UNMARKED",
        "BINGO_CLAIM",
        "WIN_VOTE",
        "VOTING_START",
        "VOTING_END",
        "NEW_GAME",
        "PLAYER_KICK",
        "ROOM_SETTINGS_UPDATE",
        "PLAYER_LIST_UPDATE",
        "GAME_STATE_UPDATE",
        "CHAT_MESSAGE",
        "ERROR",
        "HEARTBEAT",
    ];

    /// Whether `kind` is a recognized server message type.
    pub fn is_known_type(kind: &str) -> bool {
        Self::TYPES.contains(&kind)
    }

    /// Build an `ERROR` message stamped now.
    pub fn error(error: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            error: error.into(),
            details,
            timestamp: Utc::now(),
        }
    }

    /// The wire discriminant of this message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoin { .. } => "PLAYER_JOIN",
            Self::PlayerLeave { .. } => "PLAYER_LEAVE",
            Self::SquareMarked { .. } => "SQUARE_MARKED",
            Self::SquareUnmarked { .. } => "SQUARE_UNMARKED",
            Self::BingoClaim { .. } => "BINGO_CLAIM",
            Self::WinVote { .. } => "WIN_VOTE",
            Self::VotingStart { .. } => "VOTING_START",
            Self::VotingEnd { .. } => "VOTING_END",
            Self::NewGame { .. } => "NEW_GAME",
            Self::PlayerKick { .. } => "PLAYER_KICK",
            Self::RoomSettingsUpdate { .. } => "ROOM_SETTINGS_UPDATE",
            Self::PlayerListUpdate { .. } => "PLAYER_LIST_UPDATE",
            Self::GameStateUpdate { .. } => "GAME_STATE_UPDATE",
            Self::ChatMessage { .. } => "CHAT_MESSAGE",
            Self::Error { .. } => "ERROR",
            Self::Heartbeat { .. } => "HEARTBEAT",
        }
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// A command sent by a participant over their connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Mark or unmark a cell on the sender's card.
    #[serde(rename_all = "camelCase")]
    MarkSquare {
        /// Cell id.
        square_id: String,
        /// New marked state.
        is_marked: bool,
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Claim a win.
    #[serde(rename_all = "camelCase")]
    ClaimBingo {
        /// Claimed pattern.
        winning_pattern: WinPattern,
        /// Claimed cell indices.
        winning_cells: Vec<usize>,
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Vote on the outstanding claim.
    #[serde(rename_all = "camelCase")]
    Vote {
        /// Session being voted on.
        voting_session_id: VotingSessionId,
        /// The ballot.
        vote: Vote,
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Start a new round (host only).
    #[serde(rename_all = "camelCase")]
    NewGame {
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Send chat to the room.
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        /// Message text.
        message: String,
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Keep-alive; refreshes activity only.
    #[serde(rename_all = "camelCase")]
    Heartbeat {
        /// Client send time.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

impl ClientMessage {
    /// The wire discriminant of this command.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MarkSquare { .. } => "MARK_SQUARE",
            Self::ClaimBingo { .. } => "CLAIM_BINGO",
            Self::Vote { .. } => "VOTE",
            Self::NewGame { .. } => "NEW_GAME",
            Self::ChatMessage { .. } => "CHAT_MESSAGE",
            Self::Heartbeat { .. } => "HEARTBEAT",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn server_message_uses_type_tag_and_camel_case_fields() {
        let msg = ServerMessage::SquareMarked {
            square_id: String::from("square-3"),
            square_text: String::from("Synergy"),
            player_id: PlayerId::new(),
            player_name: String::from("Ada"),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SQUARE_MARKED");
        assert_eq!(json["squareId"], "square-3");
        assert_eq!(json["squareText"], "Synergy");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn error_details_are_optional() {
        let json = serde_json::to_value(ServerMessage::error("Invalid bingo claim", None)).unwrap();
        assert_eq!(json["type"], "ERROR");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn client_message_parses_without_timestamp() {
        let raw = r#"{"type":"CLAIM_BINGO","winningPattern":"row","winningCells":[0,1,2,3,4]}"#;
        let parsed: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed,
            ClientMessage::ClaimBingo {
                winning_pattern: WinPattern::Row,
                winning_cells: vec![0, 1, 2, 3, 4],
                timestamp: None,
            }
        );
    }

    #[test]
    fn unit_like_commands_accept_a_timestamp() {
        let raw = r#"{"type":"HEARTBEAT","timestamp":"2026-01-01T00:00:00Z"}"#;
        let parsed: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.kind(), "HEARTBEAT");
    }

    #[test]
    fn unknown_client_type_is_rejected() {
        let raw = r#"{"type":"TELEPORT"}"#;
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let msg = ServerMessage::Heartbeat { timestamp: Utc::now() };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.kind());
        assert!(ServerMessage::is_known_type(msg.kind()));
        assert!(!ServerMessage::is_known_type("ROOM_UPDATE"));
    }
}
