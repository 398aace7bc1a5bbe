//! Fixed limits and defaults shared by the server and the client.

/// Length of a human-entry room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Characters a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum room display name length, in characters.
pub const MAX_ROOM_NAME_LENGTH: usize = 50;

/// Maximum player display name length, in characters.
pub const MAX_PLAYER_NAME_LENGTH: usize = 30;

/// Chat messages longer than this are truncated.
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 200;

/// Text of the free center cell.
pub const FREE_SPACE_TEXT: &str = "FREE SPACE";

/// Default number of cells on a card (5x5).
pub const DEFAULT_CARD_SIZE: u32 = 25;

/// Default room capacity.
pub const DEFAULT_MAX_PLAYERS: u32 = 10;

/// Default vote timeout.
pub const DEFAULT_VOTE_TIMEOUT_SECONDS: u32 = 30;

/// Default inactivity window before an empty room is torn down.
pub const DEFAULT_CLEANUP_MINUTES: u32 = 60;

/// Default approval threshold, in percent of eligible voters.
pub const DEFAULT_WIN_THRESHOLD_PERCENT: i64 = 50;

/// Kick reason used when the host gives none.
pub const DEFAULT_KICK_REASON: &str = "Kicked by host";

/// Smallest allowed room capacity.
pub const MIN_ROOM_CAPACITY: u32 = 2;

/// Largest allowed room capacity.
pub const MAX_ROOM_CAPACITY: u32 = 50;

/// Allowed vote timeout range, in seconds.
pub const VOTE_TIMEOUT_RANGE_SECONDS: core::ops::RangeInclusive<u32> = 5..=300;

/// Allowed cleanup window range, in minutes.
pub const CLEANUP_RANGE_MINUTES: core::ops::RangeInclusive<u32> = 1..=1440;

/// Smallest allowed card (3x3).
pub const MIN_CARD_SIZE: u32 = 9;
