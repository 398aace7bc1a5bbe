//! Core entity structs for rooms, players, grids and voting.
//!
//! Everything here that crosses the wire is `camelCase` JSON and exported
//! to `TypeScript`. [`Room`] itself is deliberately not serializable: its
//! persisted form is the explicit schema in [`crate::snapshot`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Difficulty, RoomEventType, RoomPhase, Theme, VotingStatus, WinPattern};
use crate::ids::{ConnectionId, PlayerId, RoomId, VotingSessionId};
use crate::limits;

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// One cell of a bingo grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GridCell {
    /// Stable cell id, `square-{index}`.
    pub id: String,
    /// Content text shown on the cell.
    pub text: String,
    /// Whether the cell is marked.
    pub is_marked: bool,
    /// Whether this is the free center cell (always marked).
    #[serde(default)]
    pub is_free: bool,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Player identity (also the per-room session id).
    pub id: PlayerId,
    /// Display name, unique within the room (case-insensitive).
    pub name: String,
    /// Currently attached connection, if any.
    #[serde(default)]
    pub connection_id: Option<ConnectionId>,
    /// Whether this player is the host.
    pub is_host: bool,
    /// Whether a live connection is attached.
    pub is_connected: bool,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
    /// Last inbound activity from this player.
    pub last_activity: DateTime<Utc>,
    /// The player's private copy of the shared grid.
    pub card: Vec<GridCell>,
    /// Whether the player has a claim outstanding this round.
    pub has_claimed_bingo: bool,
    /// Cumulative approved wins.
    pub win_count: u32,
}

impl Player {
    /// Roster projection broadcast in `PLAYER_LIST_UPDATE`.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            is_host: self.is_host,
            is_connected: self.is_connected,
            has_claimed_bingo: self.has_claimed_bingo,
            win_count: self.win_count,
        }
    }
}

/// Public roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSummary {
    /// Player identity.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Host flag.
    pub is_host: bool,
    /// Connection status.
    pub is_connected: bool,
    /// Outstanding claim flag.
    pub has_claimed_bingo: bool,
    /// Cumulative approved wins.
    pub win_count: u32,
}

// ---------------------------------------------------------------------------
// Rounds and wins
// ---------------------------------------------------------------------------

/// A resolved claim, approved or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct WinRecord {
    /// The claimant.
    pub player_id: PlayerId,
    /// The claimant's name at resolution time.
    pub player_name: String,
    /// When the claim was resolved.
    pub timestamp: DateTime<Utc>,
    /// Claimed pattern.
    pub winning_pattern: WinPattern,
    /// Claimed cell indices.
    pub winning_cells: Vec<usize>,
    /// Ballots in favour (0 when no vote was held).
    pub votes_for: u32,
    /// Ballots against (0 when no vote was held).
    pub votes_against: u32,
    /// Whether the win counted.
    pub was_approved: bool,
}

/// Round bookkeeping for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Current round number, starting at 1.
    pub current_round: u32,
    /// When the current round started.
    pub round_start_time: Option<DateTime<Utc>>,
    /// Number of rounds started so far.
    pub total_rounds: u32,
    /// Whether the current round accepts claims.
    pub is_round_active: bool,
    /// Append-only history of resolved claims across all rounds.
    pub winner_history: Vec<WinRecord>,
}

impl GameState {
    /// State for a room whose first round starts at `now`.
    pub const fn first_round(now: DateTime<Utc>) -> Self {
        Self {
            current_round: 1,
            round_start_time: Some(now),
            total_rounds: 1,
            is_round_active: true,
            winner_history: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// The single outstanding consensus vote on a claim.
///
/// The three ballot lists are disjoint: a player appears in at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct VotingSession {
    /// Session identity; timers and ballots must match it.
    pub id: VotingSessionId,
    /// The claimant (never eligible to vote).
    pub claimant_id: PlayerId,
    /// The claimant's display name.
    pub claimant_name: String,
    /// Claimed pattern.
    pub winning_pattern: WinPattern,
    /// Claimed cell indices.
    pub winning_cells: Vec<usize>,
    /// Players voting for.
    pub votes_for: Vec<PlayerId>,
    /// Players voting against.
    pub votes_against: Vec<PlayerId>,
    /// Players abstaining.
    pub abstained: Vec<PlayerId>,
    /// When the vote timer fires.
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, on resolution.
    pub is_completed: bool,
    /// Stored outcome.
    pub result: VotingStatus,
}

// ---------------------------------------------------------------------------
// Settings and statistics
// ---------------------------------------------------------------------------

/// Host-controlled room settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct RoomSettings {
    /// Whether claims go to a vote when other players are connected.
    pub require_majority_for_win: bool,
    /// Vote timeout.
    pub vote_timeout_seconds: u32,
    /// Room capacity.
    pub max_players_per_room: u32,
    /// Inactivity window before an empty room is torn down.
    pub auto_cleanup_minutes: u32,
    /// Reserved for spectator connections.
    pub allow_spectators: bool,
    /// Fraction of eligible voters that must vote for a claim.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub democratic_win_threshold: Decimal,
    /// Outcome of a timed-out vote with nobody eligible to vote.
    pub approve_when_no_voters: bool,
    /// Number of cells on the card; must be a perfect square.
    pub card_size: u32,
    /// Themed content selection.
    pub theme: Theme,
    /// Difficulty policy for unthemed selection.
    pub difficulty: Difficulty,
    /// Categories never drawn from.
    pub exclude_categories: Vec<String>,
    /// Categories that make up 70% of an unthemed card.
    pub favor_categories: Vec<String>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            require_majority_for_win: true,
            vote_timeout_seconds: limits::DEFAULT_VOTE_TIMEOUT_SECONDS,
            max_players_per_room: limits::DEFAULT_MAX_PLAYERS,
            auto_cleanup_minutes: limits::DEFAULT_CLEANUP_MINUTES,
            allow_spectators: false,
            democratic_win_threshold: Decimal::new(limits::DEFAULT_WIN_THRESHOLD_PERCENT, 2),
            approve_when_no_voters: true,
            card_size: limits::DEFAULT_CARD_SIZE,
            theme: Theme::Mixed,
            difficulty: Difficulty::Normal,
            exclude_categories: Vec::new(),
            favor_categories: Vec::new(),
        }
    }
}

/// Partial settings update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct RoomSettingsPatch {
    /// See [`RoomSettings::require_majority_for_win`].
    pub require_majority_for_win: Option<bool>,
    /// See [`RoomSettings::vote_timeout_seconds`].
    pub vote_timeout_seconds: Option<u32>,
    /// See [`RoomSettings::max_players_per_room`].
    pub max_players_per_room: Option<u32>,
    /// See [`RoomSettings::auto_cleanup_minutes`].
    pub auto_cleanup_minutes: Option<u32>,
    /// See [`RoomSettings::allow_spectators`].
    pub allow_spectators: Option<bool>,
    /// See [`RoomSettings::democratic_win_threshold`].
    #[serde(with = "rust_decimal::serde::float_option")]
    #[ts(type = "number | null")]
    pub democratic_win_threshold: Option<Decimal>,
    /// See [`RoomSettings::approve_when_no_voters`].
    pub approve_when_no_voters: Option<bool>,
    /// See [`RoomSettings::card_size`].
    pub card_size: Option<u32>,
    /// See [`RoomSettings::theme`].
    pub theme: Option<Theme>,
    /// See [`RoomSettings::difficulty`].
    pub difficulty: Option<Difficulty>,
    /// See [`RoomSettings::exclude_categories`].
    pub exclude_categories: Option<Vec<String>>,
    /// See [`RoomSettings::favor_categories`].
    pub favor_categories: Option<Vec<String>>,
}

impl RoomSettings {
    /// Return a copy with every field present in `patch` replaced.
    pub fn merged(&self, patch: &RoomSettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = patch.require_majority_for_win {
            next.require_majority_for_win = v;
        }
        if let Some(v) = patch.vote_timeout_seconds {
            next.vote_timeout_seconds = v;
        }
        if let Some(v) = patch.max_players_per_room {
            next.max_players_per_room = v;
        }
        if let Some(v) = patch.auto_cleanup_minutes {
            next.auto_cleanup_minutes = v;
        }
        if let Some(v) = patch.allow_spectators {
            next.allow_spectators = v;
        }
        if let Some(v) = patch.democratic_win_threshold {
            next.democratic_win_threshold = v;
        }
        if let Some(v) = patch.approve_when_no_voters {
            next.approve_when_no_voters = v;
        }
        if let Some(v) = patch.card_size {
            next.card_size = v;
        }
        if let Some(v) = patch.theme {
            next.theme = v;
        }
        if let Some(v) = patch.difficulty {
            next.difficulty = v;
        }
        if let Some(v) = &patch.exclude_categories {
            next.exclude_categories.clone_from(v);
        }
        if let Some(v) = &patch.favor_categories {
            next.favor_categories.clone_from(v);
        }
        next
    }
}

/// Approved-win counts per pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WinPatternCounts {
    /// Row wins.
    pub row: u32,
    /// Column wins.
    pub column: u32,
    /// Diagonal wins.
    pub diagonal: u32,
}

impl WinPatternCounts {
    /// Increment the counter for `pattern`, saturating.
    pub const fn record(&mut self, pattern: WinPattern) {
        match pattern {
            WinPattern::Row => self.row = self.row.saturating_add(1),
            WinPattern::Column => self.column = self.column.saturating_add(1),
            WinPattern::Diagonal => self.diagonal = self.diagonal.saturating_add(1),
        }
    }
}

/// Cumulative room counters. Non-decreasing for the life of the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct RoomStatistics {
    /// Rounds that ended with an approved win.
    pub games_played: u32,
    /// Approved wins.
    pub total_wins: u32,
    /// Mean length of completed rounds, in seconds.
    pub average_game_duration: u64,
    /// Sum of completed round lengths, in seconds.
    pub total_game_seconds: u64,
    /// Name of the player with the most marks.
    pub most_active_player: String,
    /// Mark counts per content text.
    pub popular_squares: BTreeMap<String, u32>,
    /// Mark counts per player.
    pub player_marks: BTreeMap<PlayerId, u32>,
    /// Approved wins per pattern.
    pub win_pattern_counts: WinPatternCounts,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// One diagnostic event log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoomEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: RoomEventType,
    /// Room the event belongs to.
    pub room_id: RoomId,
    /// Player the event concerns, if any.
    pub player_id: Option<PlayerId>,
    /// Free-form payload.
    pub data: serde_json::Value,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Room aggregate
// ---------------------------------------------------------------------------

/// The complete mutable state of one room.
///
/// Owned exclusively by the room's actor. Players are keyed by their
/// time-ordered id, so iteration follows join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Room identity.
    pub id: RoomId,
    /// Human-entry code, unique among live rooms.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Current host.
    pub host_id: PlayerId,
    /// Whether the room is live (false once torn down).
    pub is_game_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last committed mutation.
    pub last_activity: DateTime<Utc>,
    /// Roster.
    pub players: BTreeMap<PlayerId, Player>,
    /// The round's shared grid.
    pub shared_card: Vec<GridCell>,
    /// Round bookkeeping.
    pub game_state: GameState,
    /// The outstanding vote, if any.
    pub voting_session: Option<VotingSession>,
    /// Host-controlled settings.
    pub settings: RoomSettings,
    /// Cumulative counters.
    pub statistics: RoomStatistics,
}

impl Room {
    /// Room capacity.
    pub const fn capacity(&self) -> u32 {
        self.settings.max_players_per_room
    }

    /// Roster size.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of players with a live connection.
    pub fn connected_count(&self) -> usize {
        self.players.values().filter(|p| p.is_connected).count()
    }

    /// Look up a player by display name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        let wanted = name.to_lowercase();
        self.players.values().find(|p| p.name.to_lowercase() == wanted)
    }

    /// Current lifecycle phase (never `Closed`; the actor tracks that).
    pub fn phase(&self) -> RoomPhase {
        if self.voting_session.as_ref().is_some_and(|s| !s.is_completed) {
            RoomPhase::Voting
        } else if self.game_state.is_round_active {
            RoomPhase::Active
        } else {
            RoomPhase::Forming
        }
    }

    /// Roster projection in join order.
    pub fn roster(&self) -> Vec<PlayerSummary> {
        self.players.values().map(Player::summary).collect()
    }

    /// Status projection served by the REST surface.
    pub fn status(&self) -> RoomStatus {
        RoomStatus {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            player_count: self.players.len(),
            max_players: self.capacity(),
            is_game_active: self.is_game_active,
            phase: self.phase(),
            current_round: self.game_state.current_round,
            players: self.roster(),
        }
    }
}

/// Room status returned by `GET /api/bingo/status` and the room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoomStatus {
    /// Room identity.
    pub id: RoomId,
    /// Room code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Roster size.
    pub player_count: usize,
    /// Capacity.
    pub max_players: u32,
    /// Whether the room is live.
    pub is_game_active: bool,
    /// Lifecycle phase.
    pub phase: RoomPhase,
    /// Current round number.
    pub current_round: u32,
    /// Roster.
    pub players: Vec<PlayerSummary>,
}
