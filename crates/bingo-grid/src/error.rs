//! Error types for the `bingo-grid` crate.

/// Errors that can occur while building or inspecting a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The requested cell count is not a positive perfect square.
    #[error("card size {size} must be a perfect square (9, 16, 25, ...)")]
    InvalidSize {
        /// The rejected size.
        size: u32,
    },

    /// The embedded content file could not be parsed.
    #[error("failed to load content pool: {0}")]
    ContentLoad(#[from] serde_yml::Error),

    /// Arithmetic overflow during a checked calculation.
    #[error("arithmetic overflow in grid calculation")]
    ArithmeticOverflow,
}
