//! The per-room actor.
//!
//! One tokio task owns each [`Room`]. REST calls, `WebSocket` traffic and
//! timer expiries all arrive through its mailbox and are applied one at a
//! time. Each command runs a pure transition from [`crate::room`] on a
//! copy of the room; if the copy differs it is persisted, and only after
//! the write succeeds does it replace the live room and are its effects
//! carried out. A failed write leaves the room as it was.
//!
//! Timers live in a [`JoinSet`] owned by the actor, so tearing the room
//! down aborts every pending timer with it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bingo_db::RoomStore;
use bingo_grid::{GridEngine, RoomGridStats};
use bingo_types::{
    ClientMessage, ConnectionId, PlayerId, Room, RoomId, RoomSettings, RoomSettingsPatch, RoomSnapshot,
    RoomStatistics, RoomStatus, ServerMessage, VotingSessionId,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::CoordinatorConfig;
use crate::error::RoomError;
use crate::outbound::{CLOSE_NORMAL, ConnectionSink, Outgoing};
use crate::room::{self, Ctx, Effects, Outbound, TimerRequest};

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Close reason sent to every connection when the room is torn down.
const ROOM_CLOSED_REASON: &str = "Room closed";

/// Close reason for a connection superseded by a newer one.
const REPLACED_REASON: &str = "Replaced by a newer connection";

/// Dependencies every room actor shares.
#[derive(Debug, Clone)]
pub struct RoomServices {
    /// Snapshot and event log storage.
    pub store: RoomStore,
    /// Grid generation and claim verification.
    pub engine: Arc<GridEngine>,
    /// Coordinator configuration.
    pub config: Arc<CoordinatorConfig>,
    /// Time source for room timestamps.
    pub clock: Clock,
}

/// Statistics served by the room stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatsReport {
    /// Room code.
    pub room_code: String,
    /// Cumulative room counters.
    pub statistics: RoomStatistics,
    /// Roster and win-history aggregates.
    pub grid: RoomGridStats,
}

/// A request to a room actor.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a player.
    Join {
        /// Requested display name.
        player_name: String,
        /// The new player's id.
        reply: Reply<PlayerId>,
    },
    /// Remove a player at their request.
    Leave {
        /// Who is leaving.
        player_id: PlayerId,
        /// Completion.
        reply: Reply<()>,
    },
    /// Host removes a player.
    Kick {
        /// Requesting host.
        host_id: PlayerId,
        /// Target.
        player_id: PlayerId,
        /// Optional reason shown to everyone.
        reason: Option<String>,
        /// Completion.
        reply: Reply<()>,
    },
    /// Host patches the settings.
    UpdateSettings {
        /// Requesting host.
        host_id: PlayerId,
        /// Fields to replace.
        patch: Box<RoomSettingsPatch>,
        /// The resulting settings.
        reply: Reply<RoomSettings>,
    },
    /// Status projection.
    Status {
        /// The status.
        reply: oneshot::Sender<RoomStatus>,
    },
    /// Statistics projection.
    Stats {
        /// The report.
        reply: Reply<RoomStatsReport>,
    },
    /// A connection opened for a player.
    Attach {
        /// Whose connection.
        player_id: PlayerId,
        /// Where to push frames.
        sink: ConnectionSink,
        /// Completion; on `Err` the connection should be closed.
        reply: Reply<()>,
    },
    /// A connection closed.
    Detach {
        /// Whose connection.
        player_id: PlayerId,
        /// Which connection.
        connection_id: ConnectionId,
    },
    /// An inbound protocol message.
    Message {
        /// Sender.
        player_id: PlayerId,
        /// The message.
        message: ClientMessage,
    },
    /// Tear the room down now.
    Close {
        /// Completion.
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable address of a running room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
    room_id: RoomId,
    code: String,
}

impl RoomHandle {
    /// Id of the room behind this handle.
    pub const fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Code of the room behind this handle.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the actor has shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand) -> Result<T, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(build(tx)).await.map_err(|_e| RoomError::Closed)?;
        rx.await.map_err(|_e| RoomError::Closed)
    }

    /// Add `player_name` to the roster.
    pub async fn join(&self, player_name: &str) -> Result<PlayerId, RoomError> {
        let player_name = player_name.to_owned();
        self.request(|reply| RoomCommand::Join { player_name, reply }).await?
    }

    /// Remove `player_id` at their own request.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply }).await?
    }

    /// Kick `player_id` on behalf of `host_id`.
    pub async fn kick(&self, host_id: PlayerId, player_id: PlayerId, reason: Option<String>) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Kick {
            host_id,
            player_id,
            reason,
            reply,
        })
        .await?
    }

    /// Apply a settings patch on behalf of `host_id`.
    pub async fn update_settings(&self, host_id: PlayerId, patch: RoomSettingsPatch) -> Result<RoomSettings, RoomError> {
        self.request(|reply| RoomCommand::UpdateSettings {
            host_id,
            patch: Box::new(patch),
            reply,
        })
        .await?
    }

    /// Current status.
    pub async fn status(&self) -> Result<RoomStatus, RoomError> {
        self.request(|reply| RoomCommand::Status { reply }).await
    }

    /// Statistics report.
    pub async fn stats(&self) -> Result<RoomStatsReport, RoomError> {
        self.request(|reply| RoomCommand::Stats { reply }).await?
    }

    /// Register `sink` as `player_id`'s live connection.
    pub async fn attach(&self, player_id: PlayerId, sink: ConnectionSink) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Attach { player_id, sink, reply }).await?
    }

    /// Report that a connection closed. Ignored if the room is gone.
    pub async fn detach(&self, player_id: PlayerId, connection_id: ConnectionId) {
        let command = RoomCommand::Detach {
            player_id,
            connection_id,
        };
        if self.sender.send(command).await.is_err() {
            debug!(room_code = %self.code, player_id = %player_id, "Detach after room closed");
        }
    }

    /// Forward an inbound message. Errors are reported to the sender's
    /// connection, not returned here.
    pub async fn send_message(&self, player_id: PlayerId, message: ClientMessage) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { player_id, message })
            .await
            .map_err(|_e| RoomError::Closed)
    }

    /// Tear the room down.
    pub async fn close(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Close { reply }).await
    }
}

/// What a fired timer asks for.
#[derive(Debug, Clone, Copy)]
enum Timer {
    VoteTimeout(VotingSessionId),
    NewRound { round: u32, winner: PlayerId },
    Teardown,
}

/// Owner of one room's state, connections and timers.
pub struct RoomActor {
    room: Room,
    services: RoomServices,
    inbox: mpsc::Receiver<RoomCommand>,
    connections: BTreeMap<PlayerId, ConnectionSink>,
    timers: JoinSet<Timer>,
    closed: bool,
}

impl RoomActor {
    /// Start an actor for `room` and arm `initial_timers`.
    ///
    /// The room must already be persisted.
    pub fn spawn(room: Room, services: RoomServices, initial_timers: &[TimerRequest]) -> RoomHandle {
        let (sender, inbox) = mpsc::channel(services.config.rooms.mailbox_capacity.max(1));
        let handle = RoomHandle {
            sender,
            room_id: room.id,
            code: room.code.clone(),
        };
        let mut actor = Self {
            room,
            services,
            inbox,
            connections: BTreeMap::new(),
            timers: JoinSet::new(),
            closed: false,
        };
        for timer in initial_timers {
            actor.arm(*timer);
        }
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        let period = Duration::from_secs(self.services.config.rooms.sweep_interval_secs.max(1));
        let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut sweep = tokio::time::interval_at(first, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(room_code = %self.room.code, room_id = %self.room.id, "Room actor started");

        while !self.closed {
            tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(fired) = self.timers.join_next(), if !self.timers.is_empty() => match fired {
                    Ok(timer) => self.on_timer(timer).await,
                    Err(err) => debug!(room_code = %self.room.code, error = %err, "Timer task did not complete"),
                },
                _ = sweep.tick() => self.on_sweep().await,
            }
        }

        self.timers.abort_all();
        info!(room_code = %self.room.code, closed = self.closed, "Room actor stopped");
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { player_name, reply } => {
                let result = self.apply(|r, c| room::join(r, c, &player_name)).await;
                respond(reply, self.finish(result).await);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.apply(|r, c| with_unit(room::leave(r, c, player_id))).await;
                respond(reply, self.finish(result).await);
            }
            RoomCommand::Kick {
                host_id,
                player_id,
                reason,
                reply,
            } => {
                let result = self
                    .apply(|r, c| with_unit(room::kick(r, c, host_id, player_id, reason.as_deref())))
                    .await;
                respond(reply, self.finish(result).await);
            }
            RoomCommand::UpdateSettings { host_id, patch, reply } => {
                let result = self.apply(|r, c| room::update_settings(r, c, host_id, &patch)).await;
                respond(reply, self.finish(result).await);
            }
            RoomCommand::Status { reply } => {
                if reply.send(self.room.status()).is_err() {
                    debug!(room_code = %self.room.code, "Status requester went away");
                }
            }
            RoomCommand::Stats { reply } => respond(reply, self.stats()),
            RoomCommand::Attach { player_id, sink, reply } => {
                let result = self.attach(player_id, sink).await;
                respond(reply, result);
            }
            RoomCommand::Detach {
                player_id,
                connection_id,
            } => {
                let result = self.apply(|r, c| with_unit(room::detach(r, c, player_id, connection_id))).await;
                if let Err(err) = self.finish(result).await {
                    warn!(room_code = %self.room.code, player_id = %player_id, error = %err, "Detach failed");
                }
            }
            RoomCommand::Message { player_id, message } => {
                let kind = message.kind();
                let result = self.apply(|r, c| with_unit(room::handle_message(r, c, player_id, message))).await;
                if let Err(err) = self.finish(result).await {
                    if matches!(err, RoomError::Internal(_)) {
                        error!(room_code = %self.room.code, player_id = %player_id, kind, error = %err, "Message failed");
                    } else {
                        debug!(room_code = %self.room.code, player_id = %player_id, kind, error = %err, "Message rejected");
                    }
                    self.send_to(player_id, &ServerMessage::error(err.public_message(), None));
                }
            }
            RoomCommand::Close { reply } => {
                self.shutdown().await;
                if reply.send(()).is_err() {
                    debug!(room_code = %self.room.code, "Close requester went away");
                }
            }
        }
    }

    async fn attach(&mut self, player_id: PlayerId, sink: ConnectionSink) -> Result<(), RoomError> {
        let connection_id = sink.id;
        let (_, effects) = self
            .apply(|r, c| with_unit(room::attach(r, c, player_id, connection_id)))
            .await?;
        if let Some(previous) = self.connections.insert(player_id, sink) {
            debug!(room_code = %self.room.code, player_id = %player_id, old = %previous.id, "Replacing connection");
            previous.push(Outgoing::Close {
                code: CLOSE_NORMAL,
                reason: String::from(REPLACED_REASON),
            });
        }
        self.dispatch(effects).await;
        Ok(())
    }

    fn stats(&self) -> Result<RoomStatsReport, RoomError> {
        let grid = GridEngine::room_stats(self.room.players.values(), &self.room.game_state.winner_history)?;
        Ok(RoomStatsReport {
            room_code: self.room.code.clone(),
            statistics: self.room.statistics.clone(),
            grid,
        })
    }

    async fn on_timer(&mut self, timer: Timer) {
        let result = match timer {
            Timer::VoteTimeout(session_id) => {
                self.apply(|r, c| Ok(((), room::vote_timeout(r, c, session_id)))).await
            }
            Timer::NewRound { round, winner } => {
                self.apply(|r, c| with_unit(room::new_round_due(r, c, round, winner))).await
            }
            Timer::Teardown => self.apply(|r, c| Ok(((), room::teardown_due(r, c)))).await,
        };
        if let Err(err) = self.finish(result).await {
            warn!(room_code = %self.room.code, ?timer, error = %err, "Timer action failed");
        }
    }

    async fn on_sweep(&mut self) {
        let result = self.apply(|r, c| with_unit(room::sweep(r, c))).await;
        if let Err(err) = self.finish(result).await {
            warn!(room_code = %self.room.code, error = %err, "Sweep failed");
        }
    }

    /// Run `op` on a copy of the room and commit the copy.
    async fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut Room, &Ctx<'_>) -> Result<(T, Effects), RoomError>,
    ) -> Result<(T, Effects), RoomError> {
        let engine = Arc::clone(&self.services.engine);
        let config = Arc::clone(&self.services.config);
        let ctx = Ctx {
            engine: &engine,
            config: &config.rooms,
            now: self.services.clock.now(),
        };
        let mut next = self.room.clone();
        let (value, effects) = op(&mut next, &ctx)?;
        self.commit(next, &effects).await?;
        Ok((value, effects))
    }

    /// Dispatch the effects of a successful [`Self::apply`].
    async fn finish<T>(&mut self, result: Result<(T, Effects), RoomError>) -> Result<T, RoomError> {
        let (value, effects) = result?;
        self.dispatch(effects).await;
        Ok(value)
    }

    async fn commit(&mut self, next: Room, effects: &Effects) -> Result<(), RoomError> {
        if next != self.room {
            if let Err(err) = self.services.store.save_snapshot(&RoomSnapshot::from_room(&next)).await {
                error!(room_code = %self.room.code, error = %err, "Failed to persist room");
                return Err(RoomError::from(err));
            }
            self.room = next;
        }
        if !effects.events.is_empty() {
            let capacity = self.services.config.storage.event_log_capacity;
            if let Err(err) = self
                .services
                .store
                .append_events(self.room.id, &effects.events, capacity)
                .await
            {
                warn!(room_code = %self.room.code, error = %err, "Failed to append room events");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, effects: Effects) {
        for outbound in effects.outbound {
            match outbound {
                Outbound::Broadcast(message) => self.broadcast(&message),
                Outbound::ToPlayer(player_id, message) => self.send_to(player_id, &message),
                Outbound::Close {
                    player_id,
                    code,
                    reason,
                } => {
                    if let Some(sink) = self.connections.remove(&player_id) {
                        sink.push(Outgoing::Close { code, reason });
                    }
                }
            }
        }
        for timer in effects.timers {
            self.arm(timer);
        }
        if effects.close_room {
            self.shutdown().await;
        }
    }

    fn broadcast(&self, message: &ServerMessage) {
        let Some(frame) = self.encode(message) else {
            return;
        };
        for sink in self.connections.values() {
            sink.push(frame.clone());
        }
    }

    fn send_to(&self, player_id: PlayerId, message: &ServerMessage) {
        let Some(sink) = self.connections.get(&player_id) else {
            return;
        };
        if let Some(frame) = self.encode(message) {
            sink.push(frame);
        }
    }

    fn encode(&self, message: &ServerMessage) -> Option<Outgoing> {
        match Outgoing::message(message) {
            Ok(frame) => Some(frame),
            Err(err) => {
                error!(room_code = %self.room.code, kind = message.kind(), error = %err, "Failed to encode message");
                None
            }
        }
    }

    fn arm(&mut self, request: TimerRequest) {
        let (timer, after) = match request {
            TimerRequest::VoteTimeout { session_id, after } => (Timer::VoteTimeout(session_id), after),
            TimerRequest::NewRound { round, winner, after } => (Timer::NewRound { round, winner }, after),
            TimerRequest::Teardown { after } => (Timer::Teardown, after),
        };
        debug!(room_code = %self.room.code, ?timer, delay_ms = after.as_millis(), "Timer armed");
        self.timers.spawn(async move {
            tokio::time::sleep(after).await;
            timer
        });
    }

    /// Close every connection, cancel timers, drop the stored room and
    /// stop accepting commands.
    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.room.is_game_active = false;
        self.inbox.close();
        self.timers.abort_all();
        for sink in std::mem::take(&mut self.connections).into_values() {
            sink.push(Outgoing::Close {
                code: CLOSE_NORMAL,
                reason: String::from(ROOM_CLOSED_REASON),
            });
        }
        if let Err(err) = self.services.store.delete_room(self.room.id).await {
            warn!(room_code = %self.room.code, error = %err, "Failed to delete stored room");
        }
        info!(room_code = %self.room.code, room_id = %self.room.id, "Room destroyed");
    }
}

fn with_unit(result: Result<Effects, RoomError>) -> Result<((), Effects), RoomError> {
    result.map(|effects| ((), effects))
}

fn respond<T>(reply: Reply<T>, result: Result<T, RoomError>) {
    if reply.send(result).is_err() {
        debug!("Requester went away before the reply");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bingo_db::MemoryStore;
    use bingo_grid::patterns;
    use bingo_types::{RoomPhase, Vote, WinPattern};

    use super::*;

    fn services() -> RoomServices {
        RoomServices {
            store: RoomStore::memory(),
            engine: Arc::new(GridEngine::with_embedded_content().unwrap()),
            config: Arc::new(CoordinatorConfig::default()),
            clock: Clock::start(),
        }
    }

    async fn spawn_room(services: &RoomServices) -> (RoomHandle, PlayerId) {
        let config = Arc::clone(&services.config);
        let ctx = Ctx {
            engine: &services.engine,
            config: &config.rooms,
            now: services.clock.now(),
        };
        let (room, _) = room::create(&ctx, String::from("ROOM01"), "Standup", "Ada", None, None).unwrap();
        let host = room.host_id;
        services.store.save_snapshot(&RoomSnapshot::from_room(&room)).await.unwrap();
        (RoomActor::spawn(room, services.clone(), &[]), host)
    }

    async fn connect(handle: &RoomHandle, player: PlayerId) -> mpsc::Receiver<Outgoing> {
        let (sink, rx) = ConnectionSink::channel(256);
        handle.attach(player, sink).await.unwrap();
        rx
    }

    /// Decode every queued text frame.
    fn drain(rx: &mut mpsc::Receiver<Outgoing>) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let Outgoing::Text(text) = frame {
                frames.push(serde_json::from_str(&text).unwrap());
            }
        }
        frames
    }

    fn types(frames: &[serde_json::Value]) -> Vec<String> {
        frames
            .iter()
            .map(|f| f["type"].as_str().unwrap_or_default().to_owned())
            .collect()
    }

    async fn claim_row(handle: &RoomHandle, player: PlayerId) {
        let side = patterns::side_length(25).unwrap();
        let cells = patterns::row_cells(0, side);
        for idx in &cells {
            handle
                .send_message(
                    player,
                    ClientMessage::MarkSquare {
                        square_id: format!("square-{idx}"),
                        is_marked: true,
                        timestamp: None,
                    },
                )
                .await
                .unwrap();
        }
        handle
            .send_message(
                player,
                ClientMessage::ClaimBingo {
                    winning_pattern: WinPattern::Row,
                    winning_cells: cells,
                    timestamp: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn attach_sends_state_to_the_new_connection() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let mut rx = connect(&handle, host).await;
        assert_eq!(types(&drain(&mut rx)), vec!["PLAYER_LIST_UPDATE", "GAME_STATE_UPDATE"]);

        let status = handle.status().await.unwrap();
        assert_eq!(status.player_count, 1);
        assert_eq!(status.phase, RoomPhase::Active);
    }

    #[tokio::test]
    async fn rejected_message_reaches_only_the_sender() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let grace = handle.join("Grace").await.unwrap();
        let mut host_rx = connect(&handle, host).await;
        let mut grace_rx = connect(&handle, grace).await;
        drain(&mut host_rx);
        drain(&mut grace_rx);

        handle
            .send_message(grace, ClientMessage::NewGame { timestamp: None })
            .await
            .unwrap();
        // Status is answered after the message, so the error is queued.
        handle.status().await.unwrap();

        let frames = drain(&mut grace_rx);
        assert_eq!(types(&frames), vec!["ERROR"]);
        assert_eq!(frames[0]["error"], "Only the host can start a new game");
        assert!(drain(&mut host_rx).is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_the_room_untouched() {
        let memory = MemoryStore::new();
        let services = RoomServices {
            store: RoomStore::Memory(memory.clone()),
            ..services()
        };
        let (handle, host) = spawn_room(&services).await;
        let grace = handle.join("Grace").await.unwrap();
        let mut host_rx = connect(&handle, host).await;
        let mut grace_rx = connect(&handle, grace).await;
        drain(&mut host_rx);
        drain(&mut grace_rx);
        let before = handle.status().await.unwrap();

        memory.set_read_only(true);
        assert!(matches!(handle.join("Linus").await, Err(RoomError::Internal(_))));
        handle
            .send_message(
                grace,
                ClientMessage::MarkSquare {
                    square_id: String::from("square-0"),
                    is_marked: true,
                    timestamp: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(handle.status().await.unwrap(), before);
        assert!(drain(&mut host_rx).is_empty());
        let frames = drain(&mut grace_rx);
        assert_eq!(types(&frames), vec!["ERROR"]);
        assert_eq!(frames[0]["error"], "Internal server error");

        let stored = services.store.load_snapshot(handle.room_id()).await.unwrap().unwrap();
        let stored = stored.into_room().unwrap();
        assert_eq!(stored.players.len(), 2);
        assert!(stored.players.values().all(|p| p.card.iter().all(|c| c.is_free || !c.is_marked)));

        // Writes recover and the same join goes through.
        memory.set_read_only(false);
        handle.join("Linus").await.unwrap();
        assert_eq!(handle.status().await.unwrap().player_count, 3);
    }

    #[tokio::test]
    async fn newer_connection_replaces_the_older() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let mut first = connect(&handle, host).await;
        let _second = connect(&handle, host).await;

        let mut closes = Vec::new();
        while let Ok(frame) = first.try_recv() {
            if let Outgoing::Close { code, reason } = frame {
                closes.push((code, reason));
            }
        }
        assert_eq!(closes, vec![(CLOSE_NORMAL, String::from(REPLACED_REASON))]);
    }

    #[tokio::test]
    async fn kicked_player_sees_the_kick_then_the_close() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let grace = handle.join("Grace").await.unwrap();
        let _host_rx = connect(&handle, host).await;
        let mut grace_rx = connect(&handle, grace).await;
        drain(&mut grace_rx);

        handle.kick(host, grace, Some(String::from("Too much synergy"))).await.unwrap();

        let first = grace_rx.recv().await.unwrap();
        assert!(matches!(&first, Outgoing::Text(text) if text.contains("PLAYER_KICK")));
        let second = grace_rx.recv().await.unwrap();
        assert!(matches!(second, Outgoing::Close { code: CLOSE_NORMAL, .. }));
        assert!(grace_rx.recv().await.is_none());
        assert_eq!(handle.status().await.unwrap().player_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn solo_win_starts_the_next_round_after_the_delay() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        handle
            .update_settings(
                host,
                RoomSettingsPatch {
                    require_majority_for_win: Some(false),
                    ..RoomSettingsPatch::default()
                },
            )
            .await
            .unwrap();
        let mut rx = connect(&handle, host).await;
        claim_row(&handle, host).await;
        assert_eq!(handle.status().await.unwrap().phase, RoomPhase::Forming);

        tokio::time::sleep(Duration::from_millis(3100)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.current_round, 2);
        assert_eq!(status.phase, RoomPhase::Active);
        let frames = drain(&mut rx);
        let new_game = frames.iter().find(|f| f["type"] == "NEW_GAME").unwrap();
        assert_eq!(new_game["initiatedBy"], "Ada");
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_vote_times_out() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let grace = handle.join("Grace").await.unwrap();
        let mut host_rx = connect(&handle, host).await;
        let _grace_rx = connect(&handle, grace).await;
        claim_row(&handle, host).await;
        assert_eq!(handle.status().await.unwrap().phase, RoomPhase::Voting);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(handle.status().await.unwrap().phase, RoomPhase::Active);
        let frames = drain(&mut host_rx);
        let end = frames.iter().find(|f| f["type"] == "VOTING_END").unwrap();
        assert_eq!(end["result"], "timeout");
        assert!(end["winnerName"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn majority_vote_approves_before_the_timer() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let grace = handle.join("Grace").await.unwrap();
        let mut grace_rx = connect(&handle, grace).await;
        let _host_rx = connect(&handle, host).await;
        claim_row(&handle, host).await;
        handle.status().await.unwrap();

        let frames = drain(&mut grace_rx);
        let start = frames.iter().find(|f| f["type"] == "VOTING_START").unwrap();
        let session_id: VotingSessionId = serde_json::from_value(start["votingSession"]["id"].clone()).unwrap();
        handle
            .send_message(
                grace,
                ClientMessage::Vote {
                    voting_session_id: session_id,
                    vote: Vote::For,
                    timestamp: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(handle.status().await.unwrap().phase, RoomPhase::Forming);
        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.statistics.total_wins, 1);
        assert_eq!(stats.grid.total_games, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_room_closes_after_the_cleanup_window() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let room_id = handle.room_id();
        let (sink, rx) = ConnectionSink::channel(64);
        let connection_id = sink.id;
        handle.attach(host, sink).await.unwrap();
        drop(rx);
        handle.detach(host, connection_id).await;

        tokio::time::sleep(Duration::from_secs(59 * 60)).await;
        assert!(!handle.is_closed());
        assert!(services.store.load_snapshot(room_id).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        assert!(handle.is_closed());
        assert!(matches!(handle.status().await, Err(RoomError::Closed)));
        assert!(services.store.load_snapshot(room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_disconnects_everyone() {
        let services = services();
        let (handle, host) = spawn_room(&services).await;
        let mut rx = connect(&handle, host).await;
        drain(&mut rx);

        handle.close().await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            Outgoing::Close {
                code: CLOSE_NORMAL,
                reason: String::from(ROOM_CLOSED_REASON),
            }
        );
        assert!(matches!(handle.join("Linus").await, Err(RoomError::Closed)));
    }
}
