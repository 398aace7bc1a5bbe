//! Backend-agnostic room store.
//!
//! [`RoomStore`] dispatches to either backend with a plain `match`; the
//! set of backends is closed, so there is no trait object.

use bingo_types::{RoomEvent, RoomId, RoomSnapshot};

use crate::dragonfly::DragonflyPool;
use crate::error::DbError;
use crate::memory::MemoryStore;

/// Persistence for room snapshots and their event logs.
#[derive(Clone)]
pub enum RoomStore {
    /// Process-local, lost on restart.
    Memory(MemoryStore),
    /// `Dragonfly`-backed, survives restarts.
    Dragonfly(DragonflyPool),
}

impl core::fmt::Debug for RoomStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Memory(_) => f.write_str("RoomStore::Memory"),
            Self::Dragonfly(_) => f.write_str("RoomStore::Dragonfly"),
        }
    }
}

impl RoomStore {
    /// A fresh in-memory store.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Connect to `Dragonfly` at `url`.
    pub async fn dragonfly(url: &str) -> Result<Self, DbError> {
        Ok(Self::Dragonfly(DragonflyPool::connect(url).await?))
    }

    /// Short backend name for logs.
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Dragonfly(_) => "dragonfly",
        }
    }

    /// Store (overwrite) a room snapshot.
    pub async fn save_snapshot(&self, snapshot: &RoomSnapshot) -> Result<(), DbError> {
        match self {
            Self::Memory(s) => s.save_snapshot(snapshot).await,
            Self::Dragonfly(s) => s.save_snapshot(snapshot).await,
        }
    }

    /// Load a room snapshot, if one is stored.
    pub async fn load_snapshot(&self, room_id: RoomId) -> Result<Option<RoomSnapshot>, DbError> {
        match self {
            Self::Memory(s) => s.load_snapshot(room_id).await,
            Self::Dragonfly(s) => s.load_snapshot(room_id).await,
        }
    }

    /// Remove everything stored for a room.
    pub async fn delete_room(&self, room_id: RoomId) -> Result<(), DbError> {
        match self {
            Self::Memory(s) => s.delete_room(room_id).await,
            Self::Dragonfly(s) => s.delete_room(room_id).await,
        }
    }

    /// Ids of every stored room.
    pub async fn list_room_ids(&self) -> Result<Vec<RoomId>, DbError> {
        match self {
            Self::Memory(s) => s.list_room_ids().await,
            Self::Dragonfly(s) => s.list_room_ids().await,
        }
    }

    /// Append to a room's event log, keeping the newest `max_len` entries.
    pub async fn append_events(
        &self,
        room_id: RoomId,
        events: &[RoomEvent],
        max_len: usize,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(s) => s.append_events(room_id, events, max_len).await,
            Self::Dragonfly(s) => s.append_events(room_id, events, max_len).await,
        }
    }

    /// The newest `limit` events of a room, oldest first.
    pub async fn recent_events(&self, room_id: RoomId, limit: usize) -> Result<Vec<RoomEvent>, DbError> {
        match self {
            Self::Memory(s) => s.recent_events(room_id, limit).await,
            Self::Dragonfly(s) => s.recent_events(room_id, limit).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bingo_types::{
        GameState, GridCell, Player, PlayerId, Room, RoomEventType, RoomSettings, RoomStatistics,
    };
    use chrono::Utc;

    use super::*;

    fn room() -> Room {
        let now = Utc::now();
        let host = Player {
            id: PlayerId::new(),
            name: String::from("Ada"),
            connection_id: None,
            is_host: true,
            is_connected: true,
            joined_at: now,
            last_activity: now,
            card: vec![GridCell {
                id: String::from("square-0"),
                text: String::from("FREE SPACE"),
                is_marked: true,
                is_free: true,
            }],
            has_claimed_bingo: false,
            win_count: 0,
        };
        Room {
            id: RoomId::new(),
            code: String::from("QWERTY"),
            name: String::from("Retro"),
            host_id: host.id,
            is_game_active: true,
            created_at: now,
            last_activity: now,
            shared_card: host.card.clone(),
            players: [(host.id, host)].into_iter().collect(),
            game_state: GameState::first_round(now),
            voting_session: None,
            settings: RoomSettings::default(),
            statistics: RoomStatistics::default(),
        }
    }

    fn event(room_id: RoomId, n: u32) -> RoomEvent {
        RoomEvent {
            event_type: RoomEventType::SquareMarked,
            room_id,
            player_id: None,
            data: serde_json::json!({ "n": n }),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_snapshot_round_trip() {
        let store = RoomStore::memory();
        let original = room();
        store.save_snapshot(&RoomSnapshot::from_room(&original)).await.unwrap();

        let loaded = store.load_snapshot(original.id).await.unwrap().unwrap();
        assert_eq!(loaded.into_room().unwrap(), original);
        assert_eq!(store.list_room_ids().await.unwrap(), vec![original.id]);
    }

    #[tokio::test]
    async fn memory_missing_snapshot_is_none() {
        let store = RoomStore::memory();
        assert!(store.load_snapshot(RoomId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_event_log_is_bounded() {
        let store = RoomStore::memory();
        let id = RoomId::new();
        let batch: Vec<RoomEvent> = (0..8).map(|n| event(id, n)).collect();
        store.append_events(id, &batch, 5).await.unwrap();

        let recent = store.recent_events(id, 100).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].data["n"], 3);
        assert_eq!(recent[4].data["n"], 7);

        let last_two = store.recent_events(id, 2).await.unwrap();
        assert_eq!(last_two[0].data["n"], 6);
    }

    #[tokio::test]
    async fn memory_delete_room_clears_everything() {
        let store = RoomStore::memory();
        let original = room();
        store.save_snapshot(&RoomSnapshot::from_room(&original)).await.unwrap();
        store.append_events(original.id, &[event(original.id, 1)], 10).await.unwrap();

        store.delete_room(original.id).await.unwrap();
        assert!(store.load_snapshot(original.id).await.unwrap().is_none());
        assert!(store.recent_events(original.id, 10).await.unwrap().is_empty());
        assert!(store.list_room_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = RoomStore::memory();
        let clone = store.clone();
        let original = room();
        clone.save_snapshot(&RoomSnapshot::from_room(&original)).await.unwrap();
        assert!(store.load_snapshot(original.id).await.unwrap().is_some());
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn read_only_memory_store_refuses_writes_but_serves_reads() {
        let memory = MemoryStore::new();
        let store = RoomStore::Memory(memory.clone());
        let original = room();
        store.save_snapshot(&RoomSnapshot::from_room(&original)).await.unwrap();

        memory.set_read_only(true);
        let mut renamed = original.clone();
        renamed.name = String::from("Planning");
        assert!(matches!(
            store.save_snapshot(&RoomSnapshot::from_room(&renamed)).await,
            Err(DbError::Unavailable(_))
        ));
        assert!(store.append_events(original.id, &[event(original.id, 1)], 10).await.is_err());
        assert!(store.delete_room(original.id).await.is_err());
        let loaded = store.load_snapshot(original.id).await.unwrap().unwrap();
        assert_eq!(loaded.into_room().unwrap().name, "Retro");

        memory.set_read_only(false);
        store.save_snapshot(&RoomSnapshot::from_room(&renamed)).await.unwrap();
    }
}
