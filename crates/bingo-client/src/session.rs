//! Reconnecting room session.
//!
//! [`ClientSession::spawn`] starts a task that owns one [`Connection`] at a
//! time and a [`SessionHandle`] that talks to it. The task:
//!
//! - sends a `HEARTBEAT` every `heartbeatInterval` while connected;
//! - queues outgoing commands while disconnected (oldest dropped past
//!   `queueCapacity`) and flushes them in order on reconnect;
//! - reconnects after an abnormal close, waiting `n * reconnectInterval`
//!   before attempt `n`, and gives up with [`ConnectionStatus::Failed`]
//!   after `maxReconnectAttempts`;
//! - does not reconnect after a normal (1000) close or a local
//!   [`SessionHandle::disconnect`].

use std::collections::VecDeque;

use bingo_types::limits::MAX_CHAT_MESSAGE_LENGTH;
use bingo_types::{ClientMessage, PlayerId, ServerMessage, Vote, VotingSessionId, WinPattern};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{Connection, Connector, Frame};
use crate::view::LocalView;

/// Close code of an intentional shutdown; never retried.
pub const CLOSE_NORMAL: u16 = 1000;

/// Reported once reconnecting is abandoned.
pub const MAX_ATTEMPTS_ERROR: &str = "Max reconnection attempts reached";

/// Connection lifecycle as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not connected and not trying.
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Connected and exchanging messages.
    Connected,
    /// Waiting for or performing a reconnect.
    Reconnecting,
    /// Gave up reconnecting.
    Failed,
}

/// Callbacks invoked from the session task.
///
/// Every method has a no-op default; implement the ones you need.
pub trait SessionHandler: Send + 'static {
    /// A connection opened.
    fn connected(&mut self) {}

    /// The connection closed.
    fn disconnected(&mut self, _code: Option<u16>, _reason: &str) {}

    /// Reconnect attempt `attempt` (1-based) is scheduled.
    fn reconnecting(&mut self, _attempt: u32) {}

    /// A server `ERROR`, an undecodable frame or a transport failure.
    fn error(&mut self, _error: &str, _details: Option<&str>) {}

    /// A decoded server message, after the local view was updated.
    fn message(&mut self, _message: &ServerMessage) {}
}

/// Handler that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl SessionHandler for NoopHandler {}

#[derive(Debug)]
enum SessionCommand {
    Send(ClientMessage),
    Disconnect,
}

/// Application side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<ConnectionStatus>,
    view: watch::Receiver<LocalView>,
    player_id: PlayerId,
}

impl SessionHandle {
    /// The local player.
    pub const fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Wait until the status satisfies `predicate`, returning it.
    pub async fn wait_for_status(
        &self,
        predicate: impl FnMut(&ConnectionStatus) -> bool,
    ) -> Result<ConnectionStatus, ClientError> {
        let mut status = self.status.clone();
        let found = status.wait_for(predicate).await.map_err(|_e| ClientError::Closed)?;
        Ok(*found)
    }

    /// Snapshot of the local view.
    pub fn view(&self) -> LocalView {
        self.view.borrow().clone()
    }

    /// Wait until the view satisfies `predicate`, returning a snapshot.
    pub async fn wait_for_view(&self, predicate: impl FnMut(&LocalView) -> bool) -> Result<LocalView, ClientError> {
        let mut view = self.view.clone();
        let found = view.wait_for(predicate).await.map_err(|_e| ClientError::Closed)?;
        Ok(found.clone())
    }

    /// Mark or unmark `square_id` on the local card.
    pub async fn mark_square(&self, square_id: impl Into<String>, is_marked: bool) -> Result<(), ClientError> {
        self.send(ClientMessage::MarkSquare {
            square_id: square_id.into(),
            is_marked,
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Claim a win on `cells`.
    pub async fn claim_bingo(&self, pattern: WinPattern, cells: Vec<usize>) -> Result<(), ClientError> {
        self.send(ClientMessage::ClaimBingo {
            winning_pattern: pattern,
            winning_cells: cells,
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Vote on the open session.
    pub async fn vote(&self, voting_session_id: VotingSessionId, vote: Vote) -> Result<(), ClientError> {
        self.send(ClientMessage::Vote {
            voting_session_id,
            vote,
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Ask for a new round (host only).
    pub async fn start_new_game(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::NewGame {
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Send chat, truncated to the server's limit.
    pub async fn send_chat(&self, message: &str) -> Result<(), ClientError> {
        let message: String = message.chars().take(MAX_CHAT_MESSAGE_LENGTH).collect();
        self.send(ClientMessage::ChatMessage {
            message,
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Send a heartbeat now.
    pub async fn heartbeat(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::Heartbeat {
            timestamp: Some(Utc::now()),
        })
        .await
    }

    /// Send any command. Queued while disconnected.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.commands
            .send(SessionCommand::Send(message))
            .await
            .map_err(|_e| ClientError::Closed)
    }

    /// Close the connection and stop the session.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.commands
            .send(SessionCommand::Disconnect)
            .await
            .map_err(|_e| ClientError::Closed)
    }
}

/// How a connected period ended.
enum Exit {
    /// Local disconnect or every handle dropped.
    Stop,
    /// The connection went away.
    Lost { code: Option<u16>, reason: String },
}

/// The task side of a session.
pub struct ClientSession<C: Connector, H: SessionHandler> {
    connector: C,
    handler: H,
    config: ClientConfig,
    url: String,
    commands: mpsc::Receiver<SessionCommand>,
    status: watch::Sender<ConnectionStatus>,
    view: watch::Sender<LocalView>,
    queue: VecDeque<String>,
}

impl<C: Connector, H: SessionHandler> ClientSession<C, H> {
    /// Start a session for `player_id` in `room_code` and return its handle.
    pub fn spawn(connector: C, handler: H, config: ClientConfig, room_code: &str, player_id: PlayerId) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (view_tx, view_rx) = watch::channel(LocalView::for_player(player_id));

        let session = Self {
            connector,
            handler,
            url: config.socket_url(room_code, player_id),
            queue: VecDeque::with_capacity(config.queue_capacity),
            config,
            commands: command_rx,
            status: status_tx,
            view: view_tx,
        };
        tokio::spawn(session.run());

        SessionHandle {
            commands: command_tx,
            status: status_rx,
            view: view_rx,
            player_id,
        }
    }

    async fn run(mut self) {
        let mut attempt: u32 = 0;
        self.set_status(ConnectionStatus::Connecting);
        loop {
            let Some(result) = self.open().await else {
                self.set_status(ConnectionStatus::Disconnected);
                return;
            };
            match result {
                Ok(connection) => {
                    attempt = 0;
                    self.set_status(ConnectionStatus::Connected);
                    info!(url = %self.url, "Connected");
                    self.handler.connected();

                    match self.drive(connection).await {
                        Exit::Stop => {
                            self.handler.disconnected(Some(CLOSE_NORMAL), "Client disconnect");
                            self.set_status(ConnectionStatus::Disconnected);
                            return;
                        }
                        Exit::Lost { code, reason } => {
                            info!(?code, %reason, "Connection closed");
                            self.handler.disconnected(code, &reason);
                            if code == Some(CLOSE_NORMAL) {
                                self.set_status(ConnectionStatus::Disconnected);
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(url = %self.url, error = %err, "Connection attempt failed");
                    self.handler.error("Connection failed", Some(&err.to_string()));
                }
            }

            attempt = attempt.saturating_add(1);
            if attempt > self.config.max_reconnect_attempts {
                warn!(url = %self.url, "Giving up reconnecting");
                self.set_status(ConnectionStatus::Failed);
                self.handler.error(MAX_ATTEMPTS_ERROR, None);
                return;
            }
            self.set_status(ConnectionStatus::Reconnecting);
            self.handler.reconnecting(attempt);
            if !self.wait(self.config.reconnect_delay(attempt)).await {
                self.set_status(ConnectionStatus::Disconnected);
                return;
            }
        }
    }

    /// Attempt one connection. Commands sent meanwhile are queued like
    /// any other offline command. `None` if the session should stop.
    async fn open(&mut self) -> Option<Result<C::Connection, ClientError>> {
        let result = {
            let connect = self.connector.connect(&self.url);
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    result = &mut connect => break result,
                    command = self.commands.recv() => match command {
                        Some(SessionCommand::Send(message)) => {
                            if let Some(text) = encode(&mut self.handler, &message) {
                                push_bounded(&mut self.queue, self.config.queue_capacity, text);
                            }
                        }
                        Some(SessionCommand::Disconnect) | None => return None,
                    },
                }
            }
        };
        // Anything still buffered goes through the queue too, so the
        // flush on connect sees the newest `queue_capacity` commands.
        while let Ok(command) = self.commands.try_recv() {
            match command {
                SessionCommand::Send(message) => {
                    if let Some(text) = encode(&mut self.handler, &message) {
                        self.enqueue(text);
                    }
                }
                SessionCommand::Disconnect => {
                    if let Ok(mut connection) = result {
                        if let Err(err) = connection.close().await {
                            debug!(error = %err, "Close failed");
                        }
                    }
                    return None;
                }
            }
        }
        Some(result)
    }

    /// Pump one connection until it ends.
    async fn drive(&mut self, mut connection: C::Connection) -> Exit {
        while let Some(text) = self.queue.pop_front() {
            if let Err(err) = connection.send(text.clone()).await {
                self.queue.push_front(text);
                return Exit::Lost {
                    code: None,
                    reason: err.to_string(),
                };
            }
        }

        let period = self.config.heartbeat_interval();
        let mut heartbeat = interval_at(Instant::now().checked_add(period).unwrap_or_else(Instant::now), period);

        loop {
            tokio::select! {
                frame = connection.recv() => match frame {
                    Some(Ok(Frame::Text(text))) => self.dispatch(&text),
                    Some(Ok(Frame::Close { code, reason })) => return Exit::Lost { code, reason },
                    Some(Err(err)) => return Exit::Lost { code: None, reason: err.to_string() },
                    None => return Exit::Lost { code: None, reason: String::from("Connection lost") },
                },
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Send(message)) => {
                        let Some(text) = encode(&mut self.handler, &message) else { continue };
                        if let Err(err) = connection.send(text.clone()).await {
                            self.enqueue(text);
                            return Exit::Lost { code: None, reason: err.to_string() };
                        }
                    }
                    Some(SessionCommand::Disconnect) | None => {
                        if let Err(err) = connection.close().await {
                            debug!(error = %err, "Close failed");
                        }
                        return Exit::Stop;
                    }
                },
                _ = heartbeat.tick() => {
                    let beat = ClientMessage::Heartbeat { timestamp: Some(Utc::now()) };
                    let Some(text) = encode(&mut self.handler, &beat) else { continue };
                    if let Err(err) = connection.send(text).await {
                        return Exit::Lost { code: None, reason: err.to_string() };
                    }
                }
            }
        }
    }

    /// Sleep out a reconnect delay, queueing commands meanwhile. Returns
    /// `false` if the session should stop instead.
    async fn wait(&mut self, delay: std::time::Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Send(message)) => {
                        if let Some(text) = encode(&mut self.handler, &message) {
                            self.enqueue(text);
                        }
                    }
                    Some(SessionCommand::Disconnect) | None => return false,
                },
            }
        }
    }

    fn enqueue(&mut self, text: String) {
        push_bounded(&mut self.queue, self.config.queue_capacity, text);
    }

    fn dispatch(&mut self, text: &str) {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                self.handler.error("Invalid message format", Some(&err.to_string()));
                return;
            }
        };
        let kind = value.get("type").and_then(serde_json::Value::as_str).unwrap_or_default();
        if !ServerMessage::is_known_type(kind) {
            warn!(kind, "Ignoring unknown message type");
            return;
        }
        let message: ServerMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                self.handler.error("Invalid message format", Some(&err.to_string()));
                return;
            }
        };

        self.view.send_modify(|view| view.apply(&message));
        if let ServerMessage::Error { error, details, .. } = &message {
            self.handler.error(error, details.as_deref());
        }
        self.handler.message(&message);
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }
}

/// Append `text`, dropping the oldest entry once `capacity` is reached.
fn push_bounded(queue: &mut VecDeque<String>, capacity: usize, text: String) {
    if queue.len() >= capacity {
        queue.pop_front();
        debug!(capacity, "Queue full, dropped oldest message");
    }
    if capacity > 0 {
        queue.push_back(text);
    }
}

fn encode<H: SessionHandler>(handler: &mut H, message: &ClientMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(err) => {
            handler.error("Failed to encode message", Some(&err.to_string()));
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    /// Test end of an in-memory connection.
    struct Peer {
        frames: mpsc::UnboundedSender<Frame>,
        sent: mpsc::UnboundedReceiver<String>,
    }

    impl Peer {
        async fn next_sent(&mut self) -> serde_json::Value {
            let text = self.sent.recv().await.unwrap();
            serde_json::from_str(&text).unwrap()
        }

        fn push(&self, json: &serde_json::Value) {
            self.frames.send(Frame::Text(json.to_string())).unwrap();
        }
    }

    struct MockConnection {
        frames: mpsc::UnboundedReceiver<Frame>,
        sent: mpsc::UnboundedSender<String>,
    }

    impl Connection for MockConnection {
        async fn send(&mut self, text: String) -> Result<(), ClientError> {
            self.sent
                .send(text)
                .map_err(|_e| ClientError::Transport(String::from("peer gone")))
        }

        async fn recv(&mut self) -> Option<Result<Frame, ClientError>> {
            self.frames.recv().await.map(Ok)
        }

        async fn close(&mut self) -> Result<(), ClientError> {
            Ok(())
        }
    }

    /// Refuses the first `refuse` attempts, then hands a [`Peer`] to the
    /// test for each accepted connection. With a `gate`, every attempt
    /// hangs until the gate is notified.
    struct MockConnector {
        refuse: u32,
        gate: Option<Arc<Notify>>,
        attempts: Arc<AtomicU32>,
        peers: mpsc::UnboundedSender<Peer>,
    }

    impl Connector for MockConnector {
        type Connection = MockConnection;

        async fn connect(&self, _url: &str) -> Result<MockConnection, ClientError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.refuse {
                return Err(ClientError::Transport(String::from("refused")));
            }
            let (frame_tx, frame_rx) = mpsc::unbounded_channel();
            let (sent_tx, sent_rx) = mpsc::unbounded_channel();
            self.peers
                .send(Peer {
                    frames: frame_tx,
                    sent: sent_rx,
                })
                .map_err(|_e| ClientError::Transport(String::from("test ended")))?;
            Ok(MockConnection {
                frames: frame_rx,
                sent: sent_tx,
            })
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SessionHandler for Recorder {
        fn connected(&mut self) {
            self.0.lock().unwrap().push(String::from("connected"));
        }

        fn disconnected(&mut self, code: Option<u16>, _reason: &str) {
            self.0.lock().unwrap().push(format!("disconnected {code:?}"));
        }

        fn reconnecting(&mut self, attempt: u32) {
            self.0.lock().unwrap().push(format!("reconnecting {attempt}"));
        }

        fn error(&mut self, error: &str, _details: Option<&str>) {
            self.0.lock().unwrap().push(format!("error {error}"));
        }

        fn message(&mut self, message: &ServerMessage) {
            self.0.lock().unwrap().push(message.kind().to_owned());
        }
    }

    struct Harness {
        handle: SessionHandle,
        peers: mpsc::UnboundedReceiver<Peer>,
        attempts: Arc<AtomicU32>,
        recorder: Recorder,
    }

    fn start(refuse: u32) -> Harness {
        start_with(refuse, None)
    }

    fn start_with(refuse: u32, gate: Option<Arc<Notify>>) -> Harness {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(AtomicU32::new(0));
        let recorder = Recorder::default();
        let connector = MockConnector {
            refuse,
            gate,
            attempts: Arc::clone(&attempts),
            peers: peer_tx,
        };
        let handle = ClientSession::spawn(
            connector,
            recorder.clone(),
            ClientConfig::default(),
            "abc123",
            PlayerId::new(),
        );
        Harness {
            handle,
            peers: peer_rx,
            attempts,
            recorder,
        }
    }

    fn is(expected: ConnectionStatus) -> impl FnMut(&ConnectionStatus) -> bool {
        move |status| *status == expected
    }

    #[tokio::test(start_paused = true)]
    async fn queued_commands_flush_in_order_on_connect() {
        let mut h = start(1);
        h.handle.wait_for_status(is(ConnectionStatus::Reconnecting)).await.unwrap();
        for i in 0..52 {
            h.handle.send_chat(&format!("msg {i}")).await.unwrap();
        }

        let mut peer = h.peers.recv().await.unwrap();
        let first = peer.next_sent().await;
        assert_eq!(first["type"], "CHAT_MESSAGE");
        assert_eq!(first["message"], "msg 2");
        let mut last = first;
        for _ in 0..49 {
            last = peer.next_sent().await;
        }
        assert_eq!(last["message"], "msg 51");
    }

    #[tokio::test(start_paused = true)]
    async fn commands_sent_while_connecting_are_queued_not_blocked() {
        let gate = Arc::new(Notify::new());
        let mut h = start_with(0, Some(Arc::clone(&gate)));
        h.handle.wait_for_status(is(ConnectionStatus::Connecting)).await.unwrap();
        for i in 0..60 {
            tokio::time::timeout(Duration::from_secs(1), h.handle.send_chat(&format!("msg {i}")))
                .await
                .unwrap()
                .unwrap();
        }

        gate.notify_one();
        let mut peer = h.peers.recv().await.unwrap();
        let first = peer.next_sent().await;
        assert_eq!(first["message"], "msg 10");
        let mut last = first;
        for _ in 0..49 {
            last = peer.next_sent().await;
        }
        assert_eq!(last["message"], "msg 59");
    }

    #[tokio::test]
    async fn disconnect_while_connecting_stops_the_session() {
        let gate = Arc::new(Notify::new());
        let h = start_with(0, Some(gate));
        h.handle.wait_for_status(is(ConnectionStatus::Connecting)).await.unwrap();
        h.handle.disconnect().await.unwrap();
        h.handle.wait_for_status(is(ConnectionStatus::Disconnected)).await.unwrap();
        assert_eq!(h.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let h = start(u32::MAX);
        h.handle.wait_for_status(is(ConnectionStatus::Failed)).await.unwrap();
        assert_eq!(h.attempts.load(Ordering::SeqCst), 6);
        let events = h.recorder.events();
        assert!(events.contains(&String::from("reconnecting 5")));
        assert!(!events.contains(&String::from("reconnecting 6")));
        assert_eq!(events.last().unwrap(), &format!("error {MAX_ATTEMPTS_ERROR}"));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_waits_longer_each_attempt() {
        let h = start(2);
        let started = Instant::now();
        h.handle.wait_for_status(is(ConnectionStatus::Connected)).await.unwrap();
        // 3s before attempt 1, 6s before attempt 2.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(9) && waited < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn normal_close_is_not_retried() {
        let mut h = start(0);
        let peer = h.peers.recv().await.unwrap();
        peer.frames
            .send(Frame::Close {
                code: Some(CLOSE_NORMAL),
                reason: String::from("Room closed"),
            })
            .unwrap();
        h.handle.wait_for_status(is(ConnectionStatus::Disconnected)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(h.handle.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_connection_reconnects() {
        let mut h = start(0);
        let peer = h.peers.recv().await.unwrap();
        drop(peer);
        let _second = h.peers.recv().await.unwrap();
        h.handle.wait_for_status(is(ConnectionStatus::Connected)).await.unwrap();
        assert_eq!(h.attempts.load(Ordering::SeqCst), 2);
        assert!(h.recorder.events().contains(&String::from("reconnecting 1")));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_is_sent_on_the_interval() {
        let mut h = start(0);
        let mut peer = h.peers.recv().await.unwrap();
        let beat = peer.next_sent().await;
        assert_eq!(beat["type"], "HEARTBEAT");
    }

    #[tokio::test(start_paused = true)]
    async fn messages_update_the_view_and_reach_the_handler() {
        let mut h = start(0);
        let peer = h.peers.recv().await.unwrap();
        let me = h.handle.player_id();
        peer.push(&serde_json::json!({
            "type": "PLAYER_LIST_UPDATE",
            "players": [{
                "id": me, "name": "Ada", "isHost": true, "isConnected": true,
                "hasClaimedBingo": false, "winCount": 0
            }],
            "timestamp": Utc::now(),
        }));
        peer.push(&serde_json::json!({ "type": "SOMETHING_NEW", "timestamp": Utc::now() }));
        peer.push(&serde_json::json!({ "type": "ERROR", "error": "Invalid bingo claim", "timestamp": Utc::now() }));

        let view = h.handle.wait_for_view(|v| !v.players.is_empty()).await.unwrap();
        assert!(view.me().unwrap().is_host);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let events = h.recorder.events();
        assert!(events.contains(&String::from("PLAYER_LIST_UPDATE")));
        assert!(events.contains(&String::from("error Invalid bingo claim")));
        assert!(!events.iter().any(|e| e.contains("SOMETHING_NEW")));
    }

    #[tokio::test(start_paused = true)]
    async fn local_disconnect_stops_the_session() {
        let mut h = start(0);
        let _peer = h.peers.recv().await.unwrap();
        h.handle.wait_for_status(is(ConnectionStatus::Connected)).await.unwrap();
        h.handle.disconnect().await.unwrap();
        h.handle.wait_for_status(is(ConnectionStatus::Disconnected)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn long_chat_is_truncated_before_sending() {
        let mut h = start(0);
        let mut peer = h.peers.recv().await.unwrap();
        h.handle.send_chat(&"x".repeat(250)).await.unwrap();
        let sent = peer.next_sent().await;
        assert_eq!(sent["message"].as_str().unwrap().len(), MAX_CHAT_MESSAGE_LENGTH);
    }
}
