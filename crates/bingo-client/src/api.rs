//! REST client for the coordinator's HTTP surface.

use bingo_types::{
    Ack, ApiErrorBody, CreateRoomRequest, CreateRoomResponse, HealthResponse, JoinRoomRequest,
    JoinRoomResponse, KickPlayerRequest, LeaveRoomRequest, PlayerId, RoomListResponse, RoomSettings,
    RoomSettingsPatch, RoomStatus, StatusResponse, UpdateSettingsRequest, UpdateSettingsResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;

/// Thin typed wrapper over `reqwest` for `/api/bingo` and `/health`.
#[derive(Debug, Clone)]
pub struct BingoApi {
    client: reqwest::Client,
    base_url: String,
}

impl BingoApi {
    /// Client for the server at `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Create a room hosted by `request.player_name`.
    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<CreateRoomResponse, ClientError> {
        let response = self.client.post(self.url("/api/bingo/create")).json(request).send().await?;
        decode(response).await
    }

    /// Join the room `room_code` as `player_name`.
    pub async fn join_room(&self, room_code: &str, player_name: &str) -> Result<JoinRoomResponse, ClientError> {
        let body = JoinRoomRequest {
            room_code: room_code.to_owned(),
            player_name: player_name.to_owned(),
        };
        let response = self.client.post(self.url("/api/bingo/join")).json(&body).send().await?;
        decode(response).await
    }

    /// Public status of `room_code`.
    pub async fn room_status(&self, room_code: &str) -> Result<RoomStatus, ClientError> {
        let response = self
            .client
            .get(self.url("/api/bingo/status"))
            .query(&[("roomCode", room_code)])
            .send()
            .await?;
        let body: StatusResponse = decode(response).await?;
        Ok(body.room)
    }

    /// Every live room.
    pub async fn list_rooms(&self) -> Result<Vec<RoomStatus>, ClientError> {
        let response = self.client.get(self.url("/api/bingo/rooms")).send().await?;
        let body: RoomListResponse = decode(response).await?;
        Ok(body.rooms)
    }

    /// Leave `room_code` for good.
    pub async fn leave_room(&self, room_code: &str, player_id: PlayerId) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.room_url(room_code, "leave"))
            .json(&LeaveRoomRequest { player_id })
            .send()
            .await?;
        let _ack: Ack = decode(response).await?;
        Ok(())
    }

    /// Remove `player_id` from `room_code` as host `host_id`.
    pub async fn kick_player(
        &self,
        room_code: &str,
        host_id: PlayerId,
        player_id: PlayerId,
        reason: Option<String>,
    ) -> Result<(), ClientError> {
        let body = KickPlayerRequest {
            host_id,
            player_id,
            reason,
        };
        let response = self.client.post(self.room_url(room_code, "kick")).json(&body).send().await?;
        let _ack: Ack = decode(response).await?;
        Ok(())
    }

    /// Change settings of `room_code` as host `host_id`. Returns the full
    /// settings afterwards.
    pub async fn update_settings(
        &self,
        room_code: &str,
        host_id: PlayerId,
        settings: RoomSettingsPatch,
    ) -> Result<RoomSettings, ClientError> {
        let body = UpdateSettingsRequest { host_id, settings };
        let response = self
            .client
            .put(self.room_url(room_code, "settings"))
            .json(&body)
            .send()
            .await?;
        let body: UpdateSettingsResponse = decode(response).await?;
        Ok(body.settings)
    }

    /// Server liveness.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn room_url(&self, room_code: &str, action: &str) -> String {
        format!("{}/api/bingo/room/{}/{action}", self.base_url, room_code.trim().to_ascii_uppercase())
    }
}

/// Decode a success body, or turn a failure body into [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&text)?);
    }
    debug!(%status, body = %text, "Request failed");
    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => Err(ClientError::Api {
            code: body.code,
            message: body.error,
        }),
        Err(_e) => Err(ClientError::Http(format!("HTTP {status}: {text}"))),
    }
}
