//! Versioned persisted form of a [`Room`].
//!
//! The roster is stored as an explicit ordered list of `(id, player)`
//! entries so the schema does not depend on how the in-memory map
//! iterates or serializes. [`RoomSnapshot::from_room`] and
//! [`RoomSnapshot::into_room`] are the only conversion points.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{PlayerId, RoomId};
use crate::structs::{GameState, GridCell, Player, Room, RoomSettings, RoomStatistics, VotingSession};

/// Schema version written by this build.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Errors produced while decoding a snapshot back into a [`Room`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The snapshot was written by an unknown schema.
    #[error("unsupported snapshot schema version {found} (expected {SNAPSHOT_SCHEMA_VERSION})")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,
    },

    /// A roster entry's key disagrees with the player record it holds.
    #[error("roster entry {entry} holds player {player}")]
    MismatchedEntry {
        /// The entry key.
        entry: PlayerId,
        /// The id inside the player record.
        player: PlayerId,
    },

    /// The same player appears twice in the roster.
    #[error("duplicate roster entry {0}")]
    DuplicatePlayer(PlayerId),
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerEntry {
    /// Player id (must equal `player.id`).
    pub id: PlayerId,
    /// The player record.
    pub player: Player,
}

/// Persisted room state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoomSnapshot {
    /// Schema version.
    pub schema_version: u32,
    /// Room identity.
    pub id: RoomId,
    /// Room code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Host.
    pub host_id: PlayerId,
    /// Lifecycle flag.
    pub is_game_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last committed mutation.
    pub last_activity: DateTime<Utc>,
    /// Roster in join order.
    pub players: Vec<PlayerEntry>,
    /// Shared grid.
    pub shared_card: Vec<GridCell>,
    /// Round bookkeeping.
    pub game_state: GameState,
    /// Outstanding vote.
    pub voting_session: Option<VotingSession>,
    /// Settings.
    pub settings: RoomSettings,
    /// Counters.
    pub statistics: RoomStatistics,
}

impl RoomSnapshot {
    /// Encode a room.
    pub fn from_room(room: &Room) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            id: room.id,
            code: room.code.clone(),
            name: room.name.clone(),
            host_id: room.host_id,
            is_game_active: room.is_game_active,
            created_at: room.created_at,
            last_activity: room.last_activity,
            players: room
                .players
                .iter()
                .map(|(id, player)| PlayerEntry {
                    id: *id,
                    player: player.clone(),
                })
                .collect(),
            shared_card: room.shared_card.clone(),
            game_state: room.game_state.clone(),
            voting_session: room.voting_session.clone(),
            settings: room.settings.clone(),
            statistics: room.statistics.clone(),
        }
    }

    /// Decode back into a room.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] for an unknown schema version or an
    /// inconsistent roster.
    pub fn into_room(self) -> Result<Room, SnapshotError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
            });
        }

        let mut players = BTreeMap::new();
        for entry in self.players {
            if entry.id != entry.player.id {
                return Err(SnapshotError::MismatchedEntry {
                    entry: entry.id,
                    player: entry.player.id,
                });
            }
            if players.insert(entry.id, entry.player).is_some() {
                return Err(SnapshotError::DuplicatePlayer(entry.id));
            }
        }

        Ok(Room {
            id: self.id,
            code: self.code,
            name: self.name,
            host_id: self.host_id,
            is_game_active: self.is_game_active,
            created_at: self.created_at,
            last_activity: self.last_activity,
            players,
            shared_card: self.shared_card,
            game_state: self.game_state,
            voting_session: self.voting_session,
            settings: self.settings,
            statistics: self.statistics,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::enums::WinPattern;
    use crate::structs::WinRecord;

    fn player(name: &str, is_host: bool) -> Player {
        let now = Utc::now();
        Player {
            id: PlayerId::new(),
            name: name.to_owned(),
            connection_id: None,
            is_host,
            is_connected: false,
            joined_at: now,
            last_activity: now,
            card: vec![GridCell {
                id: String::from("square-0"),
                text: String::from("FREE SPACE"),
                is_marked: true,
                is_free: true,
            }],
            has_claimed_bingo: false,
            win_count: 2,
        }
    }

    fn room() -> Room {
        let now = Utc::now();
        let host = player("Ada", true);
        let guest = player("Grace", false);
        let mut game_state = GameState::first_round(now);
        game_state.winner_history.push(WinRecord {
            player_id: guest.id,
            player_name: guest.name.clone(),
            timestamp: now,
            winning_pattern: WinPattern::Column,
            winning_cells: vec![0],
            votes_for: 1,
            votes_against: 0,
            was_approved: true,
        });
        Room {
            id: RoomId::new(),
            code: String::from("ABC123"),
            name: String::from("Standup"),
            host_id: host.id,
            is_game_active: true,
            created_at: now,
            last_activity: now,
            players: [(host.id, host.clone()), (guest.id, guest)].into_iter().collect(),
            shared_card: host.card,
            game_state,
            voting_session: None,
            settings: RoomSettings::default(),
            statistics: RoomStatistics::default(),
        }
    }

    #[test]
    fn round_trip_through_json_reproduces_room() {
        let original = room();
        let json = serde_json::to_string(&RoomSnapshot::from_room(&original)).unwrap();
        let decoded: RoomSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.into_room().unwrap(), original);
    }

    #[test]
    fn players_are_an_explicit_list() {
        let json = serde_json::to_value(RoomSnapshot::from_room(&room())).unwrap();
        let players = json["players"].as_array().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0]["player"]["name"], "Ada");
        assert_eq!(json["schemaVersion"], SNAPSHOT_SCHEMA_VERSION);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = RoomSnapshot::from_room(&room());
        snapshot.schema_version = 99;
        assert_eq!(
            snapshot.into_room(),
            Err(SnapshotError::UnsupportedVersion { found: 99 })
        );
    }

    #[test]
    fn mismatched_entry_is_rejected() {
        let mut snapshot = RoomSnapshot::from_room(&room());
        snapshot.players[0].id = PlayerId::new();
        assert!(matches!(snapshot.into_room(), Err(SnapshotError::MismatchedEntry { .. })));
    }

    #[test]
    fn duplicate_entry_is_rejected() {
        let mut snapshot = RoomSnapshot::from_room(&room());
        let dup = snapshot.players[0].clone();
        snapshot.players.push(dup);
        assert!(matches!(snapshot.into_room(), Err(SnapshotError::DuplicatePlayer(_))));
    }
}
