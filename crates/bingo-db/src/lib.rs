//! Persistence for the Buzzword Bingo coordinator.
//!
//! Each room persists a versioned [`bingo_types::RoomSnapshot`] after every
//! committed mutation, plus a bounded diagnostic event log. Two backends
//! share one API through [`RoomStore`]:
//!
//! ```text
//! RoomActor --save_snapshot / append_events--> RoomStore
//!                                               |-- Memory    (MemoryStore)
//!                                               +-- Dragonfly (DragonflyPool)
//! ```
//!
//! # Modules
//!
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`memory`] -- In-process backend
//! - [`store`] -- The enum-dispatched [`RoomStore`]
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use memory::MemoryStore;
pub use store::RoomStore;
