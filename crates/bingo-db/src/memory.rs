//! In-process room persistence.
//!
//! Snapshots are held as their JSON encoding so a memory-backed run
//! exercises the same serialization path as `Dragonfly`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bingo_types::{RoomEvent, RoomId, RoomSnapshot};
use tokio::sync::RwLock;

use crate::error::DbError;

#[derive(Debug, Default)]
struct Inner {
    snapshots: BTreeMap<RoomId, String>,
    events: BTreeMap<RoomId, VecDeque<RoomEvent>>,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every write with [`DbError::Unavailable`] until switched
    /// back. Reads keep working. Shared by all clones.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(String::from("memory store is read-only")));
        }
        Ok(())
    }

    /// Store a room snapshot.
    pub async fn save_snapshot(&self, snapshot: &RoomSnapshot) -> Result<(), DbError> {
        self.check_writable()?;
        let json = serde_json::to_string(snapshot)?;
        self.inner.write().await.snapshots.insert(snapshot.id, json);
        Ok(())
    }

    /// Load a room snapshot, if one is stored.
    pub async fn load_snapshot(&self, room_id: RoomId) -> Result<Option<RoomSnapshot>, DbError> {
        let guard = self.inner.read().await;
        guard
            .snapshots
            .get(&room_id)
            .map(|json| serde_json::from_str(json))
            .transpose()
            .map_err(DbError::from)
    }

    /// Remove a room's snapshot and event log.
    pub async fn delete_room(&self, room_id: RoomId) -> Result<(), DbError> {
        self.check_writable()?;
        let mut guard = self.inner.write().await;
        guard.snapshots.remove(&room_id);
        guard.events.remove(&room_id);
        Ok(())
    }

    /// Ids of every room with a stored snapshot.
    pub async fn list_room_ids(&self) -> Result<Vec<RoomId>, DbError> {
        Ok(self.inner.read().await.snapshots.keys().copied().collect())
    }

    /// Append events, keeping only the newest `max_len`.
    pub async fn append_events(
        &self,
        room_id: RoomId,
        events: &[RoomEvent],
        max_len: usize,
    ) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }
        self.check_writable()?;
        let mut guard = self.inner.write().await;
        let log = guard.events.entry(room_id).or_default();
        log.extend(events.iter().cloned());
        while log.len() > max_len {
            log.pop_front();
        }
        Ok(())
    }

    /// The newest `limit` events, oldest first.
    pub async fn recent_events(&self, room_id: RoomId, limit: usize) -> Result<Vec<RoomEvent>, DbError> {
        let guard = self.inner.read().await;
        Ok(guard.events.get(&room_id).map_or_else(Vec::new, |log| {
            log.iter()
                .skip(log.len().saturating_sub(limit))
                .cloned()
                .collect()
        }))
    }
}
