//! HTTP and `WebSocket` server for the Buzzword Bingo coordinator.
//!
//! - **REST endpoints** under `/api/bingo` create, join and manage rooms.
//! - **`WebSocket` endpoint** (`/api/bingo/room/{code}/ws?playerId=`)
//!   carries the real-time protocol for one player.
//! - **`/health`** for liveness probes.
//!
//! Handlers are thin: each resolves a room through the
//! [`RoomRegistry`](bingo_core::RoomRegistry) in [`AppState`] and awaits
//! the room actor's reply.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use state::AppState;
