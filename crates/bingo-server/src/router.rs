//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: the REST surface under `/api/bingo`, the
/// per-room `WebSocket` endpoint and `/health`.
///
/// CORS allows any origin so browser clients served from elsewhere can
/// reach the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/bingo/create", post(handlers::create_room))
        .route("/api/bingo/join", post(handlers::join_room))
        .route("/api/bingo/status", get(handlers::room_status))
        .route("/api/bingo/rooms", get(handlers::list_rooms))
        .route("/api/bingo/room/{code}/leave", post(handlers::leave_room))
        .route("/api/bingo/room/{code}/kick", post(handlers::kick_player))
        .route("/api/bingo/room/{code}/settings", put(handlers::update_settings))
        .route("/api/bingo/room/{code}/stats", get(handlers::room_stats))
        .route("/api/bingo/room/{code}/events", get(handlers::room_events))
        .route("/api/bingo/room/{code}/ws", get(ws::room_socket))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
