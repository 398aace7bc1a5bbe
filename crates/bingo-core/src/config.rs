//! Configuration loading and typed config structures for the coordinator.
//!
//! The canonical configuration lives in `bingo-config.yaml` at the project
//! root (the path can be overridden with `BINGO_CONFIG`). Every field has a
//! default, so a missing file or a partial file is valid.

use std::path::Path;

use bingo_types::RoomSettings;
use bingo_types::limits;
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "BINGO_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "bingo-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level coordinator configuration.
///
/// Mirrors the structure of `bingo-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CoordinatorConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Room defaults, limits and timers.
    #[serde(default)]
    pub rooms: RoomsConfig,

    /// Persistence backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoordinatorConfig {
    /// Load from `$BINGO_CONFIG`, or `bingo-config.yaml` when unset.
    ///
    /// A missing file yields the defaults (with environment overrides).
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_e| String::from(DEFAULT_CONFIG_PATH));
        let path = Path::new(&path);
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file.
    ///
    /// Environment variables override file values:
    /// - `DRAGONFLY_URL` overrides `storage.dragonfly_url`
    /// - `BINGO_STORAGE` overrides `storage.backend`
    /// - `BINGO_HOST` overrides `server.host`
    /// - `BINGO_PORT` overrides `server.port`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides in place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.server.apply_env_overrides()?;
        self.storage.apply_env_overrides()
    }

    /// Reject values the coordinator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rooms = &self.rooms;
        if !(4..=12).contains(&rooms.code_length) {
            return Err(ConfigError::Invalid(format!(
                "rooms.code_length must be between 4 and 12, got {}",
                rooms.code_length
            )));
        }
        if rooms.mailbox_capacity == 0 || rooms.connection_buffer == 0 {
            return Err(ConfigError::Invalid(String::from(
                "rooms.mailbox_capacity and rooms.connection_buffer must be positive",
            )));
        }
        if rooms.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from("rooms.sweep_interval_secs must be positive")));
        }
        if !(limits::MIN_ROOM_CAPACITY..=limits::MAX_ROOM_CAPACITY).contains(&rooms.default_max_players) {
            return Err(ConfigError::Invalid(format!(
                "rooms.default_max_players must be between {} and {}",
                limits::MIN_ROOM_CAPACITY,
                limits::MAX_ROOM_CAPACITY
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (0 picks an ephemeral port).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the listener with `BINGO_HOST` / `BINGO_PORT` when set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("BINGO_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("BINGO_PORT") {
            self.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("BINGO_PORT={val}: {e}")))?;
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Room defaults, limits and timer intervals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomsConfig {
    /// Length of generated room codes.
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Capacity of rooms created without `maxPlayers`.
    #[serde(default = "default_max_players")]
    pub default_max_players: u32,

    /// Vote timeout of new rooms.
    #[serde(default = "default_vote_timeout_seconds")]
    pub default_vote_timeout_seconds: u32,

    /// Cleanup window of new rooms.
    #[serde(default = "default_cleanup_minutes")]
    pub default_cleanup_minutes: u32,

    /// Whether new rooms put claims to a vote.
    #[serde(default = "default_true")]
    pub require_majority_for_win: bool,

    /// Delay between an approved win and the automatic next round.
    #[serde(default = "default_new_round_delay_ms")]
    pub new_round_delay_ms: u64,

    /// Period of the per-room inactivity sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Disconnected players older than this are evicted by the sweep.
    #[serde(default = "default_inactive_player_secs")]
    pub inactive_player_secs: u64,

    /// Bounded command queue of each room actor.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Outbound frames buffered per connection before frames are dropped.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl RoomsConfig {
    /// Settings a new room starts from before the creator's patch.
    pub fn base_settings(&self) -> RoomSettings {
        RoomSettings {
            require_majority_for_win: self.require_majority_for_win,
            vote_timeout_seconds: self.default_vote_timeout_seconds,
            max_players_per_room: self.default_max_players,
            auto_cleanup_minutes: self.default_cleanup_minutes,
            ..RoomSettings::default()
        }
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            default_max_players: default_max_players(),
            default_vote_timeout_seconds: default_vote_timeout_seconds(),
            default_cleanup_minutes: default_cleanup_minutes(),
            require_majority_for_win: default_true(),
            new_round_delay_ms: default_new_round_delay_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            inactive_player_secs: default_inactive_player_secs(),
            mailbox_capacity: default_mailbox_capacity(),
            connection_buffer: default_connection_buffer(),
        }
    }
}

/// Which [`bingo_db::RoomStore`] backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local.
    #[default]
    Memory,
    /// `Dragonfly` at `storage.dragonfly_url`.
    Dragonfly,
}

impl core::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dragonfly" => Ok(Self::Dragonfly),
            other => Err(ConfigError::Invalid(format!("unknown storage backend: {other}"))),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,

    /// `Dragonfly` connection URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Event log entries kept per room.
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl StorageConfig {
    /// Override storage settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("BINGO_STORAGE") {
            self.backend = val.parse()?;
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            dragonfly_url: default_dragonfly_url(),
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_code_length() -> usize {
    limits::ROOM_CODE_LENGTH
}

const fn default_max_players() -> u32 {
    limits::DEFAULT_MAX_PLAYERS
}

const fn default_vote_timeout_seconds() -> u32 {
    limits::DEFAULT_VOTE_TIMEOUT_SECONDS
}

const fn default_cleanup_minutes() -> u32 {
    limits::DEFAULT_CLEANUP_MINUTES
}

const fn default_new_round_delay_ms() -> u64 {
    3000
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

const fn default_inactive_player_secs() -> u64 {
    120
}

const fn default_mailbox_capacity() -> usize {
    256
}

const fn default_connection_buffer() -> usize {
    64
}

fn default_dragonfly_url() -> String {
    String::from("redis://localhost:6379")
}

const fn default_event_log_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rooms.code_length, 6);
        assert_eq!(config.rooms.new_round_delay_ms, 3000);
        assert_eq!(config.rooms.sweep_interval_secs, 300);
        assert_eq!(config.rooms.inactive_player_secs, 120);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.event_log_capacity, 1000);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9090

rooms:
  code_length: 8
  default_max_players: 20
  default_vote_timeout_seconds: 45
  default_cleanup_minutes: 15
  require_majority_for_win: false
  new_round_delay_ms: 1000
  sweep_interval_secs: 60
  inactive_player_secs: 30
  mailbox_capacity: 32
  connection_buffer: 16

storage:
  backend: dragonfly
  dragonfly_url: "redis://testhost:6379"
  event_log_capacity: 200

logging:
  level: "debug"
  json: true
"#;
        let config: CoordinatorConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.rooms.code_length, 8);
        assert_eq!(config.rooms.connection_buffer, 16);
        assert_eq!(config.storage.backend, StorageBackend::Dragonfly);
        assert_eq!(config.storage.dragonfly_url, "redis://testhost:6379");
        assert!(config.logging.json);

        let settings = config.rooms.base_settings();
        assert_eq!(settings.max_players_per_room, 20);
        assert_eq!(settings.vote_timeout_seconds, 45);
        assert_eq!(settings.auto_cleanup_minutes, 15);
        assert!(!settings.require_majority_for_win);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: CoordinatorConfig = serde_yml::from_str("rooms:\n  new_round_delay_ms: 500\n").unwrap();
        assert_eq!(config.rooms.new_round_delay_ms, 500);
        assert_eq!(config.rooms.code_length, 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config: CoordinatorConfig = serde_yml::from_str("rooms:\n  code_length: 2\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config: CoordinatorConfig = serde_yml::from_str("rooms:\n  default_max_players: 1\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Dragonfly".parse::<StorageBackend>().unwrap(), StorageBackend::Dragonfly);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }
}
