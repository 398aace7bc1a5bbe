//! Integration tests for the `Dragonfly` backend.
//!
//! These tests require a live Dragonfly instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p bingo-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use bingo_db::RoomStore;
use bingo_types::{
    GameState, Player, PlayerId, Room, RoomEvent, RoomEventType, RoomId, RoomSettings,
    RoomSnapshot, RoomStatistics,
};
use chrono::Utc;

/// Dragonfly connection URL for a local instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn connect() -> RoomStore {
    let store = RoomStore::dragonfly(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly -- is it running?");
    if let RoomStore::Dragonfly(pool) = &store {
        pool.flush_all().await.expect("Failed to flush");
    }
    store
}

fn room() -> Room {
    let now = Utc::now();
    let host = Player {
        id: PlayerId::new(),
        name: "Ada".to_owned(),
        connection_id: None,
        is_host: true,
        is_connected: false,
        joined_at: now,
        last_activity: now,
        card: Vec::new(),
        has_claimed_bingo: false,
        win_count: 1,
    };
    Room {
        id: RoomId::new(),
        code: "ZXCV12".to_owned(),
        name: "Planning".to_owned(),
        host_id: host.id,
        is_game_active: true,
        created_at: now,
        last_activity: now,
        players: [(host.id, host)].into_iter().collect(),
        shared_card: Vec::new(),
        game_state: GameState::first_round(now),
        voting_session: None,
        settings: RoomSettings::default(),
        statistics: RoomStatistics::default(),
    }
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_snapshot_roundtrip() {
    let store = connect().await;
    let original = room();

    store
        .save_snapshot(&RoomSnapshot::from_room(&original))
        .await
        .expect("Failed to save snapshot");
    let loaded = store
        .load_snapshot(original.id)
        .await
        .expect("Failed to load snapshot")
        .expect("Snapshot missing");
    assert_eq!(loaded.into_room().unwrap(), original);
    assert_eq!(store.list_room_ids().await.unwrap(), vec![original.id]);

    store.delete_room(original.id).await.expect("Failed to delete");
    assert!(store.load_snapshot(original.id).await.unwrap().is_none());
    assert!(store.list_room_ids().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_event_log_is_trimmed() {
    let store = connect().await;
    let room_id = RoomId::new();
    let events: Vec<RoomEvent> = (0..12)
        .map(|n| RoomEvent {
            event_type: RoomEventType::PlayerJoined,
            room_id,
            player_id: None,
            data: serde_json::json!({ "n": n }),
            timestamp: Utc::now(),
        })
        .collect();

    store.append_events(room_id, &events, 10).await.expect("Failed to append");
    let recent = store.recent_events(room_id, 100).await.expect("Failed to read");
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].data["n"], 2);
    assert_eq!(recent[9].data["n"], 11);
}
