//! Wall-clock time anchored to the tokio timer.
//!
//! Timers and the inactivity sweep run on [`tokio::time`], while room
//! state records [`chrono`] timestamps. [`Clock`] derives the timestamp
//! from the tokio instant so both advance together, including under a
//! paused test runtime.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

/// A wall clock that follows [`tokio::time::Instant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    /// Tokio instant at construction.
    origin: Instant,
    /// Wall time at construction.
    origin_wall: DateTime<Utc>,
}

impl Clock {
    /// Anchor a clock at the current instant.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: Utc::now(),
        }
    }

    /// Current wall time.
    pub fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.origin.elapsed())
            .ok()
            .and_then(|elapsed| self.origin_wall.checked_add_signed(elapsed))
            .unwrap_or_else(Utc::now)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = Clock::start();
        let before = clock.now();
        tokio::time::advance(Duration::from_secs(90 * 60)).await;
        let elapsed = clock.now().signed_duration_since(before);
        assert_eq!(elapsed.num_minutes(), 90);
    }
}
