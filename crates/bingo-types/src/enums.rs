//! Enumeration types for the bingo coordinator.
//!
//! Wire spellings follow the JSON protocol: lowercase for pattern, vote
//! and reason values, `scope:action` for event log entries.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Grid and claims
// ---------------------------------------------------------------------------

/// The shape of a claimed win on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum WinPattern {
    /// A full horizontal line.
    Row,
    /// A full vertical line.
    Column,
    /// One of the two corner-to-corner diagonals.
    Diagonal,
}

/// Content selection policy used when no theme is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Difficulty {
    /// Popular, low-pain content only.
    Easy,
    /// No filtering.
    #[default]
    Normal,
    /// Niche or high-pain content only.
    Hard,
}

/// Themed content selection. `Mixed` means "use the difficulty policy".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Theme {
    /// Meeting classics, communication and project terms.
    Meetings,
    /// Technology and agile terms.
    Technology,
    /// Agile and project terms.
    Agile,
    /// Strategy and business terms.
    Strategy,
    /// No theme.
    #[default]
    Mixed,
}

impl Theme {
    /// The content categories a theme draws from. Empty for `Mixed`.
    pub const fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Meetings => &["meetings", "communication", "project"],
            Self::Technology => &["technology", "agile"],
            Self::Agile => &["agile", "project"],
            Self::Strategy => &["strategy", "business"],
            Self::Mixed => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// A single ballot on a win claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Vote {
    /// The claim is valid.
    For,
    /// The claim is not valid.
    Against,
    /// No opinion. Counts as having voted.
    Abstain,
}

/// Stored outcome of a voting session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum VotingStatus {
    /// Still collecting ballots.
    #[default]
    Pending,
    /// The claim was accepted.
    Approved,
    /// The claim was rejected.
    Denied,
}

/// Outcome reported in a `VOTING_END` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum VoteResult {
    /// Resolved early or on full turnout with enough support.
    Approved,
    /// Resolved early or on full turnout without enough support.
    Denied,
    /// Resolved by the vote timer.
    Timeout,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Why a player left the room (or its live connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LeaveReason {
    /// The connection dropped; the player stays on the roster.
    Disconnect,
    /// The host removed the player.
    Kick,
    /// The player left, or was evicted for inactivity.
    Left,
}

/// Lifecycle phase of a room, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum RoomPhase {
    /// Between rounds: no round is active.
    Forming,
    /// A round is in progress.
    Active,
    /// A win claim is under review.
    Voting,
    /// Torn down; terminal.
    Closed,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Kind of a diagnostic event log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RoomEventType {
    /// Room created with its host.
    #[serde(rename = "room:created")]
    RoomCreated,
    /// Room torn down.
    #[serde(rename = "room:destroyed")]
    RoomDestroyed,
    /// Player joined the roster.
    #[serde(rename = "player:joined")]
    PlayerJoined,
    /// Player removed from the roster.
    #[serde(rename = "player:left")]
    PlayerLeft,
    /// Player's connection dropped.
    #[serde(rename = "player:disconnected")]
    PlayerDisconnected,
    /// A new round started.
    #[serde(rename = "game:started")]
    GameStarted,
    /// A round ended with an approved win.
    #[serde(rename = "game:ended")]
    GameEnded,
    /// A verified claim was made.
    #[serde(rename = "bingo:claimed")]
    BingoClaimed,
    /// A voting session opened.
    #[serde(rename = "vote:started")]
    VoteStarted,
    /// A voting session resolved.
    #[serde(rename = "vote:ended")]
    VoteEnded,
    /// A cell was marked.
    #[serde(rename = "square:marked")]
    SquareMarked,
    /// A cell was unmarked.
    #[serde(rename = "square:unmarked")]
    SquareUnmarked,
    /// Host changed the room settings.
    #[serde(rename = "settings:updated")]
    SettingsUpdated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_spellings() {
        assert_eq!(serde_json::to_string(&WinPattern::Diagonal).ok().as_deref(), Some("\"diagonal\""));
        assert_eq!(serde_json::to_string(&Vote::Abstain).ok().as_deref(), Some("\"abstain\""));
        assert_eq!(
            serde_json::to_string(&RoomEventType::SquareUnmarked).ok().as_deref(),
            Some("\"square:unmarked\"")
        );
    }

    #[test]
    fn theme_category_mapping() {
        assert_eq!(Theme::Meetings.categories(), &["meetings", "communication", "project"]);
        assert_eq!(Theme::Strategy.categories(), &["strategy", "business"]);
        assert!(Theme::Mixed.categories().is_empty());
    }
}
