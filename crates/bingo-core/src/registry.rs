//! Live rooms by code.
//!
//! The registry is the only place rooms are created or looked up. It
//! hands out [`RoomHandle`]s and forgets handles whose actor has shut
//! down.

use std::collections::BTreeMap;
use std::sync::Arc;

use bingo_db::RoomStore;
use bingo_grid::GridEngine;
use bingo_types::limits::ROOM_CODE_ALPHABET;
use bingo_types::{CreateRoomRequest, PlayerId, RoomEvent, RoomSnapshot, RoomStatus};
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::actor::{RoomActor, RoomHandle, RoomServices};
use crate::clock::Clock;
use crate::config::CoordinatorConfig;
use crate::error::RoomError;
use crate::room::{self, Ctx};

/// Attempts at drawing an unused code before giving up.
const MAX_CODE_ATTEMPTS: usize = 32;

/// A room just created and its host.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    /// Handle to the new room.
    pub handle: RoomHandle,
    /// The host's player id.
    pub player_id: PlayerId,
}

/// Registry of live rooms keyed by code.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<BTreeMap<String, RoomHandle>>,
    services: RoomServices,
}

impl RoomRegistry {
    /// An empty registry.
    pub fn new(store: RoomStore, engine: Arc<GridEngine>, config: Arc<CoordinatorConfig>) -> Self {
        Self {
            rooms: RwLock::new(BTreeMap::new()),
            services: RoomServices {
                store,
                engine,
                config,
                clock: Clock::start(),
            },
        }
    }

    /// Shared configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.services.config
    }

    /// Storage backend in use.
    pub const fn store(&self) -> &RoomStore {
        &self.services.store
    }

    /// Create a room with `request.player_name` as host.
    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<CreatedRoom, RoomError> {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, handle| !handle.is_closed());
        let code = self.unused_code(&rooms)?;

        let ctx = Ctx {
            engine: &self.services.engine,
            config: &self.services.config.rooms,
            now: self.services.clock.now(),
        };
        let (room, effects) = room::create(
            &ctx,
            code.clone(),
            &request.room_name,
            &request.player_name,
            request.max_players,
            request.settings.as_ref(),
        )?;
        let player_id = room.host_id;

        self.services.store.save_snapshot(&RoomSnapshot::from_room(&room)).await?;
        let capacity = self.services.config.storage.event_log_capacity;
        if let Err(err) = self.services.store.append_events(room.id, &effects.events, capacity).await {
            warn!(room_code = %code, error = %err, "Failed to append room events");
        }

        let handle = RoomActor::spawn(room, self.services.clone(), &effects.timers);
        rooms.insert(code, handle.clone());
        Ok(CreatedRoom { handle, player_id })
    }

    /// Join the room with `code` (any case) as `player_name`.
    pub async fn join_room(&self, code: &str, player_name: &str) -> Result<(RoomHandle, PlayerId), RoomError> {
        let handle = self.get(code).await?;
        let player_id = handle.join(player_name).await?;
        Ok((handle, player_id))
    }

    /// The live room with `code` (any case).
    pub async fn get(&self, code: &str) -> Result<RoomHandle, RoomError> {
        let code = code.trim().to_ascii_uppercase();
        self.rooms
            .read()
            .await
            .get(&code)
            .filter(|handle| !handle.is_closed())
            .cloned()
            .ok_or(RoomError::RoomNotFound)
    }

    /// Status of every live room, ordered by code. Closed rooms are
    /// pruned first.
    pub async fn list(&self) -> Vec<RoomStatus> {
        let pruned = self.prune().await;
        if pruned > 0 {
            debug!(pruned, "Dropped closed rooms");
        }
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(status) = handle.status().await {
                statuses.push(status);
            }
        }
        statuses
    }

    /// The newest `limit` log entries of the room with `code`.
    pub async fn recent_events(&self, code: &str, limit: usize) -> Result<Vec<RoomEvent>, RoomError> {
        let handle = self.get(code).await?;
        Ok(self.services.store.recent_events(handle.room_id(), limit).await?)
    }

    /// Drop handles of rooms that have shut down. Returns how many.
    pub async fn prune(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, handle| !handle.is_closed());
        before.saturating_sub(rooms.len())
    }

    /// Respawn every room found in storage. Returns how many came back.
    ///
    /// Snapshots that fail to decode are logged and skipped.
    pub async fn restore(&self) -> Result<usize, RoomError> {
        let ids = self.services.store.list_room_ids().await?;
        let mut rooms = self.rooms.write().await;
        let mut restored = 0_usize;
        for id in ids {
            let Some(snapshot) = self.services.store.load_snapshot(id).await? else {
                continue;
            };
            let mut room = match snapshot.into_room() {
                Ok(room) => room,
                Err(err) => {
                    warn!(room_id = %id, error = %err, "Skipping unreadable room snapshot");
                    continue;
                }
            };
            if rooms.contains_key(&room.code) {
                warn!(room_id = %id, room_code = %room.code, "Skipping room with a duplicate code");
                continue;
            }
            let ctx = Ctx {
                engine: &self.services.engine,
                config: &self.services.config.rooms,
                now: self.services.clock.now(),
            };
            let effects = room::restore(&mut room, &ctx);
            self.services.store.save_snapshot(&RoomSnapshot::from_room(&room)).await?;

            let code = room.code.clone();
            let handle = RoomActor::spawn(room, self.services.clone(), &effects.timers);
            rooms.insert(code, handle);
            restored = restored.saturating_add(1);
        }
        info!(restored, backend = self.services.store.backend_name(), "Rooms restored");
        Ok(restored)
    }

    fn unused_code(&self, rooms: &BTreeMap<String, RoomHandle>) -> Result<String, RoomError> {
        let length = self.services.config.rooms.code_length;
        let mut rng = rand::rng();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code: String = (0..length)
                .filter_map(|_| ROOM_CODE_ALPHABET.choose(&mut rng).map(|b| char::from(*b)))
                .collect();
            if !rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::Internal(String::from("could not allocate a room code")))
    }
}
