//! Buzzword Bingo coordinator binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `bingo-config.yaml` (or `BINGO_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the room store (memory or `Dragonfly`)
//! 4. Load the embedded buzzword content
//! 5. Restore persisted rooms
//! 6. Serve HTTP and `WebSocket` traffic until `Ctrl-C`

use std::sync::Arc;

use bingo_core::{CoordinatorConfig, StorageBackend};
use bingo_db::RoomStore;
use bingo_grid::GridEngine;
use bingo_server::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = CoordinatorConfig::load()?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!(
        bind = %config.server.bind_address(),
        backend = ?config.storage.backend,
        "bingo-server starting"
    );

    // 3. Open the room store.
    let store = match config.storage.backend {
        StorageBackend::Memory => RoomStore::memory(),
        StorageBackend::Dragonfly => {
            info!(url = %config.storage.dragonfly_url, "Connecting to Dragonfly");
            RoomStore::dragonfly(&config.storage.dragonfly_url).await?
        }
    };
    info!(backend = store.backend_name(), "Room store ready");

    // 4. Load content.
    let engine = GridEngine::with_embedded_content()?;
    info!("Buzzword content loaded");

    // 5. Restore persisted rooms.
    let address = config.server.bind_address();
    let state = Arc::new(AppState::new(store, engine, config));
    match state.registry.restore().await {
        Ok(count) => info!(rooms = count, "Persisted rooms restored"),
        Err(err) => warn!(error = %err, "Room restore failed; starting empty"),
    }

    // 6. Serve.
    let listener = bingo_server::bind(&address).await?;
    bingo_server::serve(listener, state, shutdown_signal()).await?;
    info!("bingo-server stopped");
    Ok(())
}

fn init_logging(config: &CoordinatorConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
