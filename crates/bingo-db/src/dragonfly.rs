//! `Dragonfly` (Redis-compatible) room persistence.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `room:{id}:snapshot` | JSON | Latest [`RoomSnapshot`] |
//! | `room:{id}:events` | List | Most recent N [`RoomEvent`]s, oldest first |
//! | `rooms:active` | Set | Ids of rooms with a stored snapshot |

use bingo_types::{RoomEvent, RoomId, RoomSnapshot};
use fred::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DbError;

/// Set of rooms with a stored snapshot.
const ACTIVE_ROOMS_KEY: &str = "rooms:active";

fn snapshot_key(room_id: RoomId) -> String {
    format!("room:{room_id}:snapshot")
}

fn events_key(room_id: RoomId) -> String {
    format!("room:{room_id}:events")
}

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL
    /// (`redis://host:port` or `redis://host:port/db`).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    // =========================================================================
    // Generic JSON get/set/delete
    // =========================================================================

    /// Serialize `value` as JSON and store it at `key`.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON, if present.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value.map(|s| serde_json::from_str(&s)).transpose().map_err(DbError::from)
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    // =========================================================================
    // Snapshots -- room:{id}:snapshot, rooms:active
    // =========================================================================

    /// Store a room snapshot and index the room as active.
    pub async fn save_snapshot(&self, snapshot: &RoomSnapshot) -> Result<(), DbError> {
        self.set_json(&snapshot_key(snapshot.id), snapshot).await?;
        let _: u32 = self
            .client
            .sadd(ACTIVE_ROOMS_KEY, snapshot.id.to_string().as_str())
            .await?;
        Ok(())
    }

    /// Load a room snapshot, if one is stored.
    pub async fn load_snapshot(&self, room_id: RoomId) -> Result<Option<RoomSnapshot>, DbError> {
        self.get_json(&snapshot_key(room_id)).await
    }

    /// Remove a room's snapshot, its event log and its index entry.
    pub async fn delete_room(&self, room_id: RoomId) -> Result<(), DbError> {
        self.delete(&snapshot_key(room_id)).await?;
        self.delete(&events_key(room_id)).await?;
        let _: u32 = self
            .client
            .srem(ACTIVE_ROOMS_KEY, room_id.to_string().as_str())
            .await?;
        Ok(())
    }

    /// Ids of every room in `rooms:active`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the set holds a malformed id.
    pub async fn list_room_ids(&self) -> Result<Vec<RoomId>, DbError> {
        let members: Vec<String> = self.client.smembers(ACTIVE_ROOMS_KEY).await?;
        let mut ids = Vec::with_capacity(members.len());
        for m in &members {
            let id = m
                .parse::<Uuid>()
                .map_err(|e| DbError::Config(format!("Invalid UUID in {ACTIVE_ROOMS_KEY}: {e}")))?;
            ids.push(RoomId::from(id));
        }
        Ok(ids)
    }

    // =========================================================================
    // Event log -- room:{id}:events (list)
    // =========================================================================

    /// Append events (RPUSH) and trim the list to the newest `max_len`.
    pub async fn append_events(
        &self,
        room_id: RoomId,
        events: &[RoomEvent],
        max_len: usize,
    ) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }
        let key = events_key(room_id);
        let encoded = events
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<String>, _>>()?;
        let _: u64 = self.client.rpush(&key, encoded).await?;

        let keep = i64::try_from(max_len)
            .map_err(|e| DbError::Config(format!("event log capacity out of range: {e}")))?;
        let _: () = self.client.ltrim(&key, keep.saturating_neg(), -1).await?;
        Ok(())
    }

    /// The newest `limit` events, oldest first.
    pub async fn recent_events(&self, room_id: RoomId, limit: usize) -> Result<Vec<RoomEvent>, DbError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let start = i64::try_from(limit)
            .map_err(|e| DbError::Config(format!("event limit out of range: {e}")))?
            .saturating_neg();
        let values: Vec<String> = self.client.lrange(events_key(room_id), start, -1).await?;
        let mut events = Vec::with_capacity(values.len());
        for v in &values {
            events.push(serde_json::from_str(v)?);
        }
        Ok(events)
    }

    /// Flush all keys from the instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }
}
