//! Room coordination for Buzzword Bingo.
//!
//! Each live room is owned by a single tokio task (the room actor) that
//! serializes every mutation, persists before broadcasting, and drives
//! the room's timers. The registry maps room codes to actor handles.
//!
//! # Modules
//!
//! - [`actor`] -- The per-room task, its mailbox commands and handle.
//! - [`clock`] -- Wall-clock timestamps that follow the tokio timer.
//! - [`config`] -- Configuration loading from `bingo-config.yaml`.
//! - [`error`] -- [`RoomError`] and its mapping to wire codes.
//! - [`outbound`] -- Frames pushed to live connections.
//! - [`registry`] -- Code allocation, lookup and restore of rooms.
//! - [`room`] -- Pure state transitions and the effects they request.
//! - [`voting`] -- Eligibility, thresholds and early resolution of votes.

pub mod actor;
pub mod clock;
pub mod config;
pub mod error;
pub mod outbound;
pub mod registry;
pub mod room;
pub mod voting;

pub use actor::{RoomActor, RoomCommand, RoomHandle, RoomServices, RoomStatsReport};
pub use clock::Clock;
pub use config::{ConfigError, CoordinatorConfig, StorageBackend};
pub use error::RoomError;
pub use outbound::{CLOSE_NORMAL, ConnectionSink, Outgoing};
pub use registry::{CreatedRoom, RoomRegistry};
