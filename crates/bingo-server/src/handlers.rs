//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/bingo/create` | Create a room and its host |
//! | `POST` | `/api/bingo/join` | Join a room by code |
//! | `GET` | `/api/bingo/status?roomCode=` | Status of one room |
//! | `GET` | `/api/bingo/rooms` | Status of every live room |
//! | `POST` | `/api/bingo/room/{code}/leave` | Leave a room |
//! | `POST` | `/api/bingo/room/{code}/kick` | Host removes a player |
//! | `PUT` | `/api/bingo/room/{code}/settings` | Host patches settings |
//! | `GET` | `/api/bingo/room/{code}/stats` | Room statistics |
//! | `GET` | `/api/bingo/room/{code}/events` | Recent event log entries |
//! | `GET` | `/health` | Liveness |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use bingo_core::RoomStatsReport;
use bingo_types::{
    Ack, CreateRoomRequest, CreateRoomResponse, HealthResponse, JoinRoomRequest, JoinRoomResponse,
    KickPlayerRequest, LeaveRoomRequest, RoomEvent, RoomListResponse, StatusQuery, StatusResponse,
    UpdateSettingsRequest, UpdateSettingsResponse,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Events returned when no `limit` is given.
const DEFAULT_EVENT_LIMIT: usize = 50;

/// Query parameters for `GET /api/bingo/room/{code}/events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Maximum number of entries (default 50).
    pub limit: Option<usize>,
}

/// Successful stats lookup.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Always `true`.
    pub success: bool,
    /// The report.
    #[serde(flatten)]
    pub report: RoomStatsReport,
}

/// Successful event log lookup.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Always `true`.
    pub success: bool,
    /// Entries, oldest first.
    pub events: Vec<RoomEvent>,
}

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// `POST /api/bingo/create`
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let created = state.registry.create_room(&request).await?;
    Ok(Json(CreateRoomResponse {
        success: true,
        room_code: created.handle.code().to_owned(),
        room_id: created.handle.room_id(),
        player_id: created.player_id,
    }))
}

/// `POST /api/bingo/join`
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, ApiError> {
    let (handle, player_id) = state
        .registry
        .join_room(&request.room_code, &request.player_name)
        .await?;
    Ok(Json(JoinRoomResponse {
        success: true,
        room_code: handle.code().to_owned(),
        room_id: handle.room_id(),
        player_id,
    }))
}

/// `GET /api/bingo/status?roomCode=`
pub async fn room_status(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let room = state.registry.get(&query.room_code).await?.status().await?;
    Ok(Json(StatusResponse { success: true, room }))
}

/// `GET /api/bingo/rooms`
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListResponse> {
    Json(RoomListResponse {
        success: true,
        rooms: state.registry.list().await,
    })
}

// ---------------------------------------------------------------------------
// Per-room operations
// ---------------------------------------------------------------------------

/// `POST /api/bingo/room/{code}/leave`
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiJson(request): ApiJson<LeaveRoomRequest>,
) -> Result<Json<Ack>, ApiError> {
    state.registry.get(&code).await?.leave(request.player_id).await?;
    Ok(Json(Ack::OK))
}

/// `POST /api/bingo/room/{code}/kick`
pub async fn kick_player(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiJson(request): ApiJson<KickPlayerRequest>,
) -> Result<Json<Ack>, ApiError> {
    state
        .registry
        .get(&code)
        .await?
        .kick(request.host_id, request.player_id, request.reason)
        .await?;
    Ok(Json(Ack::OK))
}

/// `PUT /api/bingo/room/{code}/settings`
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiJson(request): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    let settings = state
        .registry
        .get(&code)
        .await?
        .update_settings(request.host_id, request.settings)
        .await?;
    Ok(Json(UpdateSettingsResponse { success: true, settings }))
}

/// `GET /api/bingo/room/{code}/stats`
pub async fn room_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let report = state.registry.get(&code).await?.stats().await?;
    Ok(Json(StatsResponse { success: true, report }))
}

/// `GET /api/bingo/room/{code}/events?limit=`
pub async fn room_events(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiQuery(query): ApiQuery<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    let events = state.registry.recent_events(&code, limit).await?;
    Ok(Json(EventsResponse { success: true, events }))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("healthy"),
        timestamp: chrono::Utc::now(),
        version: String::from(env!("CARGO_PKG_VERSION")),
    })
}
