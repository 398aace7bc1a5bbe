//! `WebSocket` transport for room connections.
//!
//! Clients connect to `GET /api/bingo/room/{code}/ws?playerId=` after
//! creating or joining over REST. The handler attaches a
//! [`ConnectionSink`] to the room actor and then pumps frames both ways
//! until either side closes. Frames from the actor are pushed into a
//! bounded queue; the actor never waits on a slow socket.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use bingo_core::{ConnectionSink, Outgoing, RoomHandle};
use bingo_types::{ClientMessage, PlayerId, ServerMessage};
use futures::SinkExt;
use futures::stream::{SplitSink, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Close code sent when the connection cannot be attached.
const CLOSE_POLICY: u16 = 1008;

/// Query string of the upgrade request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    /// The connecting player.
    pub player_id: PlayerId,
}

/// Upgrade to a `WebSocket` bound to one player of one room.
///
/// # Route
///
/// `GET /api/bingo/room/{code}/ws?playerId=`
pub async fn room_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ApiQuery(query): ApiQuery<WsQuery>,
) -> Result<Response, ApiError> {
    let handle = state.registry.get(&code).await?;
    let buffer = state.config().rooms.connection_buffer;
    Ok(ws.on_upgrade(move |socket| run_connection(socket, handle, query.player_id, buffer)))
}

/// Drive one connection from attach to detach.
async fn run_connection(socket: WebSocket, handle: RoomHandle, player_id: PlayerId, buffer: usize) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sink, mut outbound) = ConnectionSink::channel(buffer);
    let connection_id = sink.id;

    if let Err(err) = handle.attach(player_id, sink).await {
        debug!(room_code = %handle.code(), player_id = %player_id, error = %err, "Attach refused");
        let message = ServerMessage::error(err.public_message(), None);
        if let Ok(text) = serde_json::to_string(&message) {
            let _ = ws_tx.send(Message::Text(text.into())).await;
        }
        let _ = ws_tx
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY,
                reason: err.public_message().into(),
            })))
            .await;
        return;
    }
    debug!(room_code = %handle.code(), player_id = %player_id, connection_id = %connection_id, "WebSocket attached");

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(Outgoing::Text(text)) => {
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        debug!(player_id = %player_id, "WebSocket send failed");
                        break;
                    }
                }
                Some(Outgoing::Close { code, reason }) => {
                    let _ = ws_tx
                        .send(Message::Close(Some(CloseFrame { code, reason: reason.into() })))
                        .await;
                    break;
                }
                None => break,
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if !forward(&handle, player_id, text.as_str(), &mut ws_tx).await {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    reject(&mut ws_tx, "Binary frames are not supported", None).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    debug!(player_id = %player_id, error = %err, "WebSocket receive failed");
                    break;
                }
                // Pings are answered by the protocol layer.
                Some(Ok(_)) => {}
            },
        }
    }

    handle.detach(player_id, connection_id).await;
    debug!(room_code = %handle.code(), player_id = %player_id, connection_id = %connection_id, "WebSocket detached");
}

/// Decode one inbound text frame and hand it to the room. Returns `false`
/// once the room is gone.
async fn forward(
    handle: &RoomHandle,
    player_id: PlayerId,
    text: &str,
    ws_tx: &mut SplitSink<WebSocket, Message>,
) -> bool {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => handle.send_message(player_id, message).await.is_ok(),
        Err(err) => {
            warn!(player_id = %player_id, error = %err, "Malformed client message");
            reject(ws_tx, "Invalid message format", Some(err.to_string())).await;
            true
        }
    }
}

/// Send an `ERROR` frame directly to this connection.
async fn reject(ws_tx: &mut SplitSink<WebSocket, Message>, error: &str, details: Option<String>) {
    let message = ServerMessage::error(error, details);
    match serde_json::to_string(&message) {
        Ok(text) => {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                debug!("Failed to send error frame");
            }
        }
        Err(err) => warn!(error = %err, "Failed to encode error frame"),
    }
}
