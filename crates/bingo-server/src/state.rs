//! Shared application state for the HTTP and `WebSocket` handlers.

use std::sync::Arc;

use bingo_core::{CoordinatorConfig, RoomRegistry};
use bingo_db::RoomStore;
use bingo_grid::GridEngine;

/// State handed to every handler behind an [`Arc`].
#[derive(Debug)]
pub struct AppState {
    /// Live rooms.
    pub registry: RoomRegistry,
}

impl AppState {
    /// Build state over `store` with the embedded content pool.
    pub fn new(store: RoomStore, engine: GridEngine, config: CoordinatorConfig) -> Self {
        Self {
            registry: RoomRegistry::new(store, Arc::new(engine), Arc::new(config)),
        }
    }

    /// Configuration the registry was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        self.registry.config()
    }
}
