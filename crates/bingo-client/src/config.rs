//! Client session configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection and retry settings for a [`ClientSession`](crate::ClientSession).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base `WebSocket` URL, e.g. `ws://localhost:8080`.
    pub ws_url: String,
    /// Base REST URL, e.g. `http://localhost:8080`.
    pub api_url: String,
    /// Base reconnect delay; attempt `n` waits `n` times this long.
    pub reconnect_interval_ms: u64,
    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Interval between client heartbeats.
    pub heartbeat_interval_ms: u64,
    /// Outgoing messages kept while disconnected; the oldest is dropped
    /// when full.
    pub queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: String::from("ws://localhost:8080"),
            api_url: String::from("http://localhost:8080"),
            reconnect_interval_ms: 3000,
            max_reconnect_attempts: 5,
            heartbeat_interval_ms: 30_000,
            queue_capacity: 50,
        }
    }
}

impl ClientConfig {
    /// Point both URLs at `host:port` over plain HTTP.
    pub fn for_address(address: &str) -> Self {
        Self {
            ws_url: format!("ws://{address}"),
            api_url: format!("http://{address}"),
            ..Self::default()
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms.saturating_mul(u64::from(attempt)))
    }

    /// Heartbeat period.
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// `WebSocket` URL of `player_id`'s connection to `room_code`.
    pub fn socket_url(&self, room_code: &str, player_id: impl core::fmt::Display) -> String {
        format!(
            "{}/api/bingo/room/{}/ws?playerId={player_id}",
            self.ws_url.trim_end_matches('/'),
            room_code.trim().to_ascii_uppercase()
        )
    }
}
