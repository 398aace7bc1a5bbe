//! Grid logic for Buzzword Bingo.
//!
//! Everything here is synchronous and free of I/O. The room actor calls
//! into it while holding exclusive access to room state.
//!
//! # Modules
//!
//! - [`content`] -- The embedded buzzword table and sampling over it.
//! - [`engine`] -- Grid generation, claim verification, progress stats.
//! - [`error`] -- Error types.
//! - [`patterns`] -- Canonical row, column and diagonal index sets.

pub mod content;
pub mod engine;
pub mod error;
pub mod patterns;

pub use content::{CategoryInfo, CategoryStats, ContentItem, ContentPool};
pub use engine::{CardStats, GridEngine, GridOptions, LeaderboardEntry, RoomGridStats, WinningLine};
pub use error::GridError;
