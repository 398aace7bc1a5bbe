//! Room state transitions.
//!
//! Every operation here is a pure function over `&mut Room`: it validates,
//! mutates, and describes what should happen next as [`Effects`]
//! (messages to send, timers to arm, events to log). Nothing here touches
//! the network, storage or the clock; the actor supplies `now` through
//! [`Ctx`], commits the mutated room, and only then carries out the
//! effects.
//!
//! On `Err` the caller discards the mutated copy, so an operation may bail
//! out after partially mutating.

use std::time::Duration;

use bingo_grid::{GridEngine, GridOptions, patterns};
use bingo_types::limits::{
    CLEANUP_RANGE_MINUTES, DEFAULT_KICK_REASON, MAX_CHAT_MESSAGE_LENGTH, MAX_PLAYER_NAME_LENGTH,
    MAX_ROOM_CAPACITY, MAX_ROOM_NAME_LENGTH, MIN_CARD_SIZE, MIN_ROOM_CAPACITY, VOTE_TIMEOUT_RANGE_SECONDS,
};
use bingo_types::{
    ClientMessage, ConnectionId, GameState, LeaveReason, Player, PlayerId, Room, RoomEvent, RoomEventType, RoomId,
    RoomSettings, RoomSettingsPatch, RoomStatistics, ServerMessage, Vote, VoteResult, VotingSessionId, VotingStatus,
    WinPattern, WinRecord,
};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::config::RoomsConfig;
use crate::error::RoomError;
use crate::outbound::CLOSE_NORMAL;
use crate::voting::{self, Decision, Tally};

/// Initiator name used for rounds nobody started by hand.
const SYSTEM_INITIATOR: &str = "System";

/// Inputs every operation reads but never owns.
#[derive(Debug, Clone, Copy)]
pub struct Ctx<'a> {
    /// Grid generation and claim verification.
    pub engine: &'a GridEngine,
    /// Room limits and timer intervals.
    pub config: &'a RoomsConfig,
    /// The time the operation happens at.
    pub now: DateTime<Utc>,
}

/// A message to deliver after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// To every attached connection.
    Broadcast(ServerMessage),
    /// To one player's connection, if attached.
    ToPlayer(PlayerId, ServerMessage),
    /// Close one player's connection.
    Close {
        /// Whose connection.
        player_id: PlayerId,
        /// `WebSocket` close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// A timer to arm after commit. Each carries the state it guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Resolve voting session `session_id` if it is still open.
    VoteTimeout {
        /// The guarded session.
        session_id: VotingSessionId,
        /// Delay.
        after: Duration,
    },
    /// Start the round after `round`, if `round` is still the current,
    /// finished round.
    NewRound {
        /// The guarded round number.
        round: u32,
        /// The winner, named as initiator.
        winner: PlayerId,
        /// Delay.
        after: Duration,
    },
    /// Close the room if it is still empty and idle.
    Teardown {
        /// Delay.
        after: Duration,
    },
}

/// Everything an operation wants done once its mutation is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Messages, in delivery order.
    pub outbound: Vec<Outbound>,
    /// Timers to arm.
    pub timers: Vec<TimerRequest>,
    /// Event log entries.
    pub events: Vec<RoomEvent>,
    /// Tear the room down.
    pub close_room: bool,
}

impl Effects {
    fn broadcast(&mut self, message: ServerMessage) {
        self.outbound.push(Outbound::Broadcast(message));
    }

    fn send_to(&mut self, player_id: PlayerId, message: ServerMessage) {
        self.outbound.push(Outbound::ToPlayer(player_id, message));
    }

    fn close(&mut self, player_id: PlayerId, reason: &str) {
        self.outbound.push(Outbound::Close {
            player_id,
            code: CLOSE_NORMAL,
            reason: String::from(reason),
        });
    }

    fn log(
        &mut self,
        room_id: RoomId,
        event_type: RoomEventType,
        player_id: Option<PlayerId>,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) {
        self.events.push(RoomEvent {
            event_type,
            room_id,
            player_id,
            data,
            timestamp: now,
        });
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.timers.is_empty() && self.events.is_empty() && !self.close_room
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

/// Build a new room with its host.
///
/// The host starts disconnected and becomes connected on attach.
pub fn create(
    ctx: &Ctx<'_>,
    code: String,
    room_name: &str,
    host_name: &str,
    max_players: Option<u32>,
    patch: Option<&RoomSettingsPatch>,
) -> Result<(Room, Effects), RoomError> {
    let room_name = clean_name(room_name, MAX_ROOM_NAME_LENGTH, "Room name")?;
    let host_name = clean_name(host_name, MAX_PLAYER_NAME_LENGTH, "Player name")?;

    let mut settings = ctx.config.base_settings();
    if let Some(max) = max_players {
        settings.max_players_per_room = max;
    }
    if let Some(patch) = patch {
        settings = settings.merged(patch);
    }
    validate_settings(&settings, 1)?;

    let shared_card = ctx.engine.generate_shared_grid(&GridOptions::from_settings(&settings))?;
    let host = new_player(host_name, true, &shared_card, ctx.now);
    let host_id = host.id;

    let room = Room {
        id: RoomId::new(),
        code,
        name: room_name,
        host_id,
        is_game_active: true,
        created_at: ctx.now,
        last_activity: ctx.now,
        players: [(host_id, host)].into_iter().collect(),
        shared_card,
        game_state: GameState::first_round(ctx.now),
        voting_session: None,
        settings,
        statistics: RoomStatistics::default(),
    };

    let mut fx = Effects::default();
    fx.log(
        room.id,
        RoomEventType::RoomCreated,
        Some(host_id),
        json!({ "roomCode": room.code, "roomName": room.name }),
        ctx.now,
    );
    fx.log(
        room.id,
        RoomEventType::PlayerJoined,
        Some(host_id),
        json!({ "playerName": host_name_of(&room), "isHost": true }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, room_id = %room.id, host_id = %host_id, "Room created");
    Ok((room, fx))
}

/// Add a player to the roster.
pub fn join(room: &mut Room, ctx: &Ctx<'_>, player_name: &str) -> Result<(PlayerId, Effects), RoomError> {
    let name = clean_name(player_name, MAX_PLAYER_NAME_LENGTH, "Player name")?;
    if !room.is_game_active {
        return Err(RoomError::Closed);
    }
    if u32::try_from(room.player_count()).unwrap_or(u32::MAX) >= room.capacity() {
        return Err(RoomError::RoomFull);
    }
    if room.find_by_name(&name).is_some() {
        return Err(RoomError::PlayerExists);
    }

    let player = new_player(name, false, &room.shared_card, ctx.now);
    let player_id = player.id;
    let mut fx = Effects::default();
    fx.broadcast(ServerMessage::PlayerJoin {
        player_id,
        player_name: player.name.clone(),
        is_host: false,
        timestamp: ctx.now,
    });
    fx.log(
        room.id,
        RoomEventType::PlayerJoined,
        Some(player_id),
        json!({ "playerName": player.name, "isHost": false }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, player_id = %player_id, player_name = %player.name, "Player joined");

    room.players.insert(player_id, player);
    room.last_activity = ctx.now;
    fx.broadcast(roster_update(room, ctx.now));
    Ok((player_id, fx))
}

/// Remove a player at their own request.
pub fn leave(room: &mut Room, ctx: &Ctx<'_>, player_id: PlayerId) -> Result<Effects, RoomError> {
    if !room.players.contains_key(&player_id) {
        return Err(player_not_found());
    }
    let mut fx = Effects::default();
    room.last_activity = ctx.now;
    remove_player(room, ctx, player_id, LeaveReason::Left, &mut fx)?;
    Ok(fx)
}

/// Host removes another player.
///
/// Everyone, the target included, sees `PLAYER_KICK` before the target's
/// connection is closed.
pub fn kick(
    room: &mut Room,
    ctx: &Ctx<'_>,
    host_id: PlayerId,
    target_id: PlayerId,
    reason: Option<&str>,
) -> Result<Effects, RoomError> {
    if host_id != room.host_id {
        return Err(RoomError::Unauthorized(String::from("Only the host can kick players")));
    }
    let Some(target) = room.players.get(&target_id) else {
        return Err(player_not_found());
    };
    if target_id == room.host_id {
        return Err(RoomError::InvalidRequest(String::from("Cannot kick the host")));
    }

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_KICK_REASON)
        .to_owned();
    let mut fx = Effects::default();
    fx.broadcast(ServerMessage::PlayerKick {
        kicked_player_id: target_id,
        kicked_player_name: target.name.clone(),
        kicked_by: host_name_of(room),
        reason: reason.clone(),
        timestamp: ctx.now,
    });
    tracing::info!(room_code = %room.code, player_id = %target_id, %reason, "Player kicked");

    room.last_activity = ctx.now;
    remove_player(room, ctx, target_id, LeaveReason::Kick, &mut fx)?;
    Ok(fx)
}

/// Host replaces some of the settings. Grid settings apply from the next
/// round.
pub fn update_settings(
    room: &mut Room,
    ctx: &Ctx<'_>,
    host_id: PlayerId,
    patch: &RoomSettingsPatch,
) -> Result<(RoomSettings, Effects), RoomError> {
    if host_id != room.host_id {
        return Err(RoomError::Unauthorized(String::from("Only the host can change room settings")));
    }
    let next = room.settings.merged(patch);
    validate_settings(&next, room.player_count())?;
    room.settings = next;
    room.last_activity = ctx.now;

    let mut fx = Effects::default();
    fx.broadcast(ServerMessage::RoomSettingsUpdate {
        settings: room.settings.clone(),
        updated_by: host_name_of(room),
        timestamp: ctx.now,
    });
    fx.log(
        room.id,
        RoomEventType::SettingsUpdated,
        Some(host_id),
        serde_json::to_value(&room.settings).unwrap_or_default(),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, "Room settings updated");
    // An open vote is judged against the new threshold right away.
    reevaluate_vote(room, ctx, &mut fx)?;
    Ok((room.settings.clone(), fx))
}

// =========================================================================
// Connections
// =========================================================================

/// A connection opened for `player_id`.
///
/// The player gets the round state with their own card and, if a vote is
/// open, the session.
pub fn attach(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    connection_id: ConnectionId,
) -> Result<Effects, RoomError> {
    let Some(player) = room.players.get_mut(&player_id) else {
        return Err(player_not_found());
    };
    player.is_connected = true;
    player.connection_id = Some(connection_id);
    player.last_activity = ctx.now;
    let card = player.card.clone();
    room.last_activity = ctx.now;

    let mut fx = Effects::default();
    fx.broadcast(roster_update(room, ctx.now));
    fx.send_to(
        player_id,
        ServerMessage::GameStateUpdate {
            game_state: room.game_state.clone(),
            shared_card: card,
            timestamp: ctx.now,
        },
    );
    if let Some(session) = room.voting_session.as_ref().filter(|s| !s.is_completed) {
        fx.send_to(
            player_id,
            ServerMessage::VotingStart {
                voting_session: Box::new(session.clone()),
                timestamp: ctx.now,
            },
        );
    }
    tracing::info!(room_code = %room.code, player_id = %player_id, connection_id = %connection_id, "Player connected");
    Ok(fx)
}

/// A connection closed. Stale connection ids are ignored.
pub fn detach(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    connection_id: ConnectionId,
) -> Result<Effects, RoomError> {
    let mut fx = Effects::default();
    let Some(player) = room.players.get_mut(&player_id) else {
        return Ok(fx);
    };
    if player.connection_id != Some(connection_id) {
        tracing::debug!(player_id = %player_id, connection_id = %connection_id, "Ignoring stale detach");
        return Ok(fx);
    }
    player.is_connected = false;
    player.connection_id = None;
    player.last_activity = ctx.now;
    let name = player.name.clone();
    room.last_activity = ctx.now;

    fx.broadcast(ServerMessage::PlayerLeave {
        player_id,
        player_name: name.clone(),
        reason: LeaveReason::Disconnect,
        timestamp: ctx.now,
    });
    fx.broadcast(roster_update(room, ctx.now));
    fx.log(
        room.id,
        RoomEventType::PlayerDisconnected,
        Some(player_id),
        json!({ "playerName": name }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, player_id = %player_id, "Player disconnected");

    reevaluate_vote(room, ctx, &mut fx)?;
    if room.connected_count() == 0 {
        fx.timers.push(TimerRequest::Teardown {
            after: cleanup_window(&room.settings),
        });
    }
    Ok(fx)
}

// =========================================================================
// Inbound messages
// =========================================================================

/// Apply one command from `player_id`'s connection.
///
/// Commands from players no longer on the roster are ignored. An `Err` is
/// meant for the sender only.
pub fn handle_message(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    message: ClientMessage,
) -> Result<Effects, RoomError> {
    let mut fx = Effects::default();
    let Some(player) = room.players.get_mut(&player_id) else {
        tracing::debug!(player_id = %player_id, kind = message.kind(), "Message from unknown player");
        return Ok(fx);
    };
    player.last_activity = ctx.now;
    room.last_activity = ctx.now;

    match message {
        ClientMessage::MarkSquare { square_id, is_marked, .. } => {
            mark_square(room, ctx, player_id, &square_id, is_marked, &mut fx);
        }
        ClientMessage::ClaimBingo {
            winning_pattern,
            winning_cells,
            ..
        } => claim(room, ctx, player_id, winning_pattern, winning_cells, &mut fx)?,
        ClientMessage::Vote {
            voting_session_id,
            vote,
            ..
        } => cast_vote(room, ctx, player_id, voting_session_id, vote, &mut fx)?,
        ClientMessage::NewGame { .. } => {
            if player_id != room.host_id {
                return Err(RoomError::Unauthorized(String::from("Only the host can start a new game")));
            }
            start_new_round(room, ctx, Some(player_id), &mut fx)?;
        }
        ClientMessage::ChatMessage { message, .. } => chat(room, ctx, player_id, &message, &mut fx),
        ClientMessage::Heartbeat { .. } => {}
    }
    Ok(fx)
}

fn mark_square(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    square_id: &str,
    is_marked: bool,
    fx: &mut Effects,
) {
    let Some(player) = room.players.get_mut(&player_id) else {
        return;
    };
    let Some(cell) = player.card.iter_mut().find(|c| c.id == square_id) else {
        tracing::debug!(player_id = %player_id, square_id, "Unknown square");
        return;
    };
    if cell.is_free || cell.is_marked == is_marked {
        return;
    }
    cell.is_marked = is_marked;
    let text = cell.text.clone();
    let player_name = player.name.clone();

    let event_type = if is_marked {
        let stats = &mut room.statistics;
        let square_count = stats.popular_squares.entry(text.clone()).or_default();
        *square_count = square_count.saturating_add(1);
        let player_count = stats.player_marks.entry(player_id).or_default();
        *player_count = player_count.saturating_add(1);
        if let Some(name) = most_active_player(room) {
            room.statistics.most_active_player = name;
        }
        fx.broadcast(ServerMessage::SquareMarked {
            square_id: String::from(square_id),
            square_text: text.clone(),
            player_id,
            player_name,
            timestamp: ctx.now,
        });
        RoomEventType::SquareMarked
    } else {
        fx.broadcast(ServerMessage::SquareUnmarked {
            square_id: String::from(square_id),
            square_text: text.clone(),
            player_id,
            player_name,
            timestamp: ctx.now,
        });
        RoomEventType::SquareUnmarked
    };
    fx.log(
        room.id,
        event_type,
        Some(player_id),
        json!({ "squareId": square_id, "squareText": text }),
        ctx.now,
    );
}

fn claim(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    pattern: WinPattern,
    cells: Vec<usize>,
    fx: &mut Effects,
) -> Result<(), RoomError> {
    if room.voting_session.as_ref().is_some_and(|s| !s.is_completed) {
        return Ok(());
    }
    let others_connected = room
        .players
        .values()
        .filter(|p| p.is_connected && p.id != player_id)
        .count();
    let Some(player) = room.players.get_mut(&player_id) else {
        return Ok(());
    };
    if player.has_claimed_bingo {
        return Ok(());
    }
    if !room.game_state.is_round_active {
        return Err(RoomError::InvalidRequest(String::from("No round in progress")));
    }
    if !GridEngine::verify_claim(&player.card, pattern, &cells) {
        tracing::debug!(player_id = %player_id, ?pattern, ?cells, "Rejected bingo claim");
        return Err(RoomError::InvalidRequest(String::from("Invalid bingo claim")));
    }
    player.has_claimed_bingo = true;
    let claimant = player.clone();

    let requires_voting = room.settings.require_majority_for_win && others_connected > 0;
    fx.broadcast(ServerMessage::BingoClaim {
        player_id,
        player_name: claimant.name.clone(),
        winning_pattern: pattern,
        winning_cells: cells.clone(),
        requires_voting,
        timestamp: ctx.now,
    });
    fx.log(
        room.id,
        RoomEventType::BingoClaimed,
        Some(player_id),
        json!({ "winningPattern": pattern, "winningCells": cells, "requiresVoting": requires_voting }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, player_id = %player_id, ?pattern, requires_voting, "Bingo claimed");

    if requires_voting {
        let session = voting::open(&claimant, pattern, cells, ctx.now, room.settings.vote_timeout_seconds);
        fx.timers.push(TimerRequest::VoteTimeout {
            session_id: session.id,
            after: Duration::from_secs(u64::from(room.settings.vote_timeout_seconds)),
        });
        fx.log(
            room.id,
            RoomEventType::VoteStarted,
            Some(player_id),
            json!({ "votingSessionId": session.id, "expiresAt": session.expires_at }),
            ctx.now,
        );
        fx.broadcast(ServerMessage::VotingStart {
            voting_session: Box::new(session.clone()),
            timestamp: ctx.now,
        });
        room.voting_session = Some(session);
        Ok(())
    } else {
        resolve_claim(room, ctx, &claimant.name, player_id, pattern, cells, true, Tally::default(), fx);
        Ok(())
    }
}

fn cast_vote(
    room: &mut Room,
    ctx: &Ctx<'_>,
    voter_id: PlayerId,
    session_id: VotingSessionId,
    vote: Vote,
    fx: &mut Effects,
) -> Result<(), RoomError> {
    let Some(voter_name) = room.players.get(&voter_id).map(|p| p.name.clone()) else {
        return Ok(());
    };
    let Some(session) = room.voting_session.as_mut().filter(|s| s.id == session_id) else {
        tracing::debug!(voter_id = %voter_id, session_id = %session_id, "Ballot for unknown session");
        return Ok(());
    };
    if !voting::cast(session, voter_id, vote) {
        return Ok(());
    }
    fx.broadcast(ServerMessage::WinVote {
        voting_session_id: session_id,
        player_id: voter_id,
        player_name: voter_name,
        vote,
        timestamp: ctx.now,
    });
    reevaluate_vote(room, ctx, fx)
}

fn chat(room: &Room, ctx: &Ctx<'_>, player_id: PlayerId, message: &str, fx: &mut Effects) {
    let text: String = message.trim().chars().take(MAX_CHAT_MESSAGE_LENGTH).collect();
    if text.is_empty() {
        return;
    }
    let Some(player) = room.players.get(&player_id) else {
        return;
    };
    fx.broadcast(ServerMessage::ChatMessage {
        player_id,
        player_name: player.name.clone(),
        message: text,
        timestamp: ctx.now,
    });
}

// =========================================================================
// Voting and rounds
// =========================================================================

/// Resolve the open session early if its outcome is settled.
fn reevaluate_vote(room: &mut Room, ctx: &Ctx<'_>, fx: &mut Effects) -> Result<(), RoomError> {
    let Some(session) = room.voting_session.as_ref().filter(|s| !s.is_completed) else {
        return Ok(());
    };
    let eligible = voting::eligible_voters(room, session);
    let decision = voting::decide_early(session, &eligible, room.settings.democratic_win_threshold)?;
    if decision != Decision::Pending {
        finish_vote(room, ctx, decision, false, fx);
    }
    Ok(())
}

/// The vote timer fired for `session_id`. A no-op unless that exact
/// session is still open.
pub fn vote_timeout(room: &mut Room, ctx: &Ctx<'_>, session_id: VotingSessionId) -> Effects {
    let mut fx = Effects::default();
    let Some(session) = room
        .voting_session
        .as_ref()
        .filter(|s| s.id == session_id && !s.is_completed)
    else {
        tracing::debug!(session_id = %session_id, "Stale vote timer");
        return fx;
    };
    let eligible = voting::eligible_voters(room, session);
    let decision = voting::decide_on_timeout(
        session,
        &eligible,
        room.settings.democratic_win_threshold,
        room.settings.approve_when_no_voters,
    )
    .unwrap_or(Decision::Denied);
    finish_vote(room, ctx, decision, true, &mut fx);
    fx
}

/// Close the open session with `decision` and resolve its claim.
fn finish_vote(room: &mut Room, ctx: &Ctx<'_>, decision: Decision, timed_out: bool, fx: &mut Effects) {
    let Some(mut session) = room.voting_session.take() else {
        return;
    };
    let approved = decision == Decision::Approved;
    session.is_completed = true;
    session.result = if approved {
        VotingStatus::Approved
    } else {
        VotingStatus::Denied
    };
    let tally = voting::tally(&session);
    let result = match (timed_out, approved) {
        (true, _) => VoteResult::Timeout,
        (false, true) => VoteResult::Approved,
        (false, false) => VoteResult::Denied,
    };

    fx.broadcast(ServerMessage::VotingEnd {
        voting_session_id: session.id,
        result,
        winner_name: approved.then(|| session.claimant_name.clone()),
        votes_for: tally.votes_for,
        votes_against: tally.votes_against,
        abstained: tally.abstained,
        timestamp: ctx.now,
    });
    fx.log(
        room.id,
        RoomEventType::VoteEnded,
        Some(session.claimant_id),
        json!({
            "votingSessionId": session.id,
            "approved": approved,
            "timedOut": timed_out,
            "votesFor": tally.votes_for,
            "votesAgainst": tally.votes_against,
            "abstained": tally.abstained,
        }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, session_id = %session.id, approved, timed_out, "Vote ended");

    resolve_claim(
        room,
        ctx,
        &session.claimant_name,
        session.claimant_id,
        session.winning_pattern,
        session.winning_cells,
        approved,
        tally,
        fx,
    );
}

/// Record a resolved claim and, if approved, end the round.
#[allow(clippy::too_many_arguments)]
fn resolve_claim(
    room: &mut Room,
    ctx: &Ctx<'_>,
    claimant_name: &str,
    claimant_id: PlayerId,
    pattern: WinPattern,
    cells: Vec<usize>,
    approved: bool,
    tally: Tally,
    fx: &mut Effects,
) {
    room.game_state.winner_history.push(WinRecord {
        player_id: claimant_id,
        player_name: String::from(claimant_name),
        timestamp: ctx.now,
        winning_pattern: pattern,
        winning_cells: cells,
        votes_for: tally.votes_for,
        votes_against: tally.votes_against,
        was_approved: approved,
    });

    if approved {
        if let Some(player) = room.players.get_mut(&claimant_id) {
            player.win_count = player.win_count.saturating_add(1);
        }
        let duration = round_seconds(&room.game_state, ctx.now);
        let stats = &mut room.statistics;
        stats.total_wins = stats.total_wins.saturating_add(1);
        stats.win_pattern_counts.record(pattern);
        stats.games_played = stats.games_played.saturating_add(1);
        stats.total_game_seconds = stats.total_game_seconds.saturating_add(duration);
        stats.average_game_duration = stats
            .total_game_seconds
            .checked_div(u64::from(stats.games_played))
            .unwrap_or(0);
        room.game_state.is_round_active = false;

        fx.timers.push(TimerRequest::NewRound {
            round: room.game_state.current_round,
            winner: claimant_id,
            after: Duration::from_millis(ctx.config.new_round_delay_ms),
        });
        fx.log(
            room.id,
            RoomEventType::GameEnded,
            Some(claimant_id),
            json!({
                "round": room.game_state.current_round,
                "winnerName": claimant_name,
                "winningPattern": pattern,
                "durationSeconds": duration,
            }),
            ctx.now,
        );
        tracing::info!(room_code = %room.code, player_id = %claimant_id, round = room.game_state.current_round, "Round won");
    } else if let Some(player) = room.players.get_mut(&claimant_id) {
        player.has_claimed_bingo = false;
    }

    fx.broadcast(roster_update(room, ctx.now));
    fx.broadcast(ServerMessage::GameStateUpdate {
        game_state: room.game_state.clone(),
        shared_card: room.shared_card.clone(),
        timestamp: ctx.now,
    });
}

/// Deal a fresh grid and open the next round.
fn start_new_round(
    room: &mut Room,
    ctx: &Ctx<'_>,
    initiator: Option<PlayerId>,
    fx: &mut Effects,
) -> Result<(), RoomError> {
    let shared_card = ctx
        .engine
        .generate_shared_grid(&GridOptions::from_settings(&room.settings))?;
    for player in room.players.values_mut() {
        player.card = GridEngine::copy_for_player(&shared_card);
        player.has_claimed_bingo = false;
    }
    room.shared_card = shared_card;
    room.voting_session = None;

    let state = &mut room.game_state;
    state.current_round = state.current_round.saturating_add(1);
    state.total_rounds = state.total_rounds.saturating_add(1);
    state.round_start_time = Some(ctx.now);
    state.is_round_active = true;

    let initiated_by = initiator
        .and_then(|id| room.players.get(&id))
        .map_or_else(|| String::from(SYSTEM_INITIATOR), |p| p.name.clone());

    fx.broadcast(ServerMessage::NewGame {
        shared_card: room.shared_card.clone(),
        initiated_by: initiated_by.clone(),
        timestamp: ctx.now,
    });
    fx.broadcast(ServerMessage::GameStateUpdate {
        game_state: room.game_state.clone(),
        shared_card: room.shared_card.clone(),
        timestamp: ctx.now,
    });
    fx.broadcast(roster_update(room, ctx.now));
    fx.log(
        room.id,
        RoomEventType::GameStarted,
        initiator,
        json!({ "round": room.game_state.current_round, "initiatedBy": initiated_by }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, round = room.game_state.current_round, %initiated_by, "New round started");
    Ok(())
}

/// The post-win timer fired. A no-op unless `round` is still the
/// current round and no new round has been started since.
pub fn new_round_due(room: &mut Room, ctx: &Ctx<'_>, round: u32, winner: PlayerId) -> Result<Effects, RoomError> {
    let mut fx = Effects::default();
    if room.game_state.current_round != round || room.game_state.is_round_active {
        tracing::debug!(room_code = %room.code, round, "Stale new-round timer");
        return Ok(fx);
    }
    start_new_round(room, ctx, Some(winner), &mut fx)?;
    Ok(fx)
}

// =========================================================================
// Housekeeping
// =========================================================================

/// Periodic sweep: tear down an abandoned room, otherwise evict players
/// disconnected for longer than the inactivity threshold.
pub fn sweep(room: &mut Room, ctx: &Ctx<'_>) -> Result<Effects, RoomError> {
    let mut fx = teardown_due(room, ctx);
    if fx.close_room {
        return Ok(fx);
    }
    let threshold = TimeDelta::try_seconds(i64::try_from(ctx.config.inactive_player_secs).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    let stale: Vec<PlayerId> = room
        .players
        .values()
        .filter(|p| !p.is_connected && ctx.now.signed_duration_since(p.last_activity) > threshold)
        .map(|p| p.id)
        .collect();
    for player_id in stale {
        tracing::info!(room_code = %room.code, player_id = %player_id, "Evicting inactive player");
        remove_player(room, ctx, player_id, LeaveReason::Left, &mut fx)?;
    }
    Ok(fx)
}

/// Close the room if nobody is connected and it has been idle for the
/// cleanup window.
pub fn teardown_due(room: &Room, ctx: &Ctx<'_>) -> Effects {
    let window = TimeDelta::try_minutes(i64::from(room.settings.auto_cleanup_minutes)).unwrap_or(TimeDelta::MAX);
    let idle = ctx.now.signed_duration_since(room.last_activity);
    Effects {
        close_room: room.connected_count() == 0 && idle >= window,
        ..Effects::default()
    }
}

/// Reset connection state after a restart: nobody is attached, and
/// everyone gets a fresh inactivity window.
///
/// Re-arms the timers the saved state was waiting on: the open vote's
/// timeout (for whatever is left of it) and the post-win new round.
pub fn restore(room: &mut Room, ctx: &Ctx<'_>) -> Effects {
    for player in room.players.values_mut() {
        player.is_connected = false;
        player.connection_id = None;
        player.last_activity = ctx.now;
    }
    room.last_activity = ctx.now;

    let mut timers = vec![TimerRequest::Teardown {
        after: cleanup_window(&room.settings),
    }];
    if let Some(session) = room.voting_session.as_ref().filter(|s| !s.is_completed) {
        let remaining = session.expires_at.signed_duration_since(ctx.now);
        timers.push(TimerRequest::VoteTimeout {
            session_id: session.id,
            after: remaining.to_std().unwrap_or(Duration::ZERO),
        });
    }
    let state = &room.game_state;
    if let Some(win) = state
        .winner_history
        .last()
        .filter(|w| w.was_approved && !state.is_round_active)
    {
        timers.push(TimerRequest::NewRound {
            round: state.current_round,
            winner: win.player_id,
            after: Duration::from_millis(ctx.config.new_round_delay_ms),
        });
    }
    Effects {
        timers,
        ..Effects::default()
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Remove `player_id`, re-home the host, settle any vote, and schedule
/// teardown if nobody is left connected.
fn remove_player(
    room: &mut Room,
    ctx: &Ctx<'_>,
    player_id: PlayerId,
    reason: LeaveReason,
    fx: &mut Effects,
) -> Result<(), RoomError> {
    let Some(player) = room.players.remove(&player_id) else {
        return Ok(());
    };
    fx.close(
        player_id,
        match reason {
            LeaveReason::Kick => "Kicked from room",
            LeaveReason::Left | LeaveReason::Disconnect => "Left room",
        },
    );

    if player.is_host {
        if let Some(next) = room.players.values_mut().next() {
            next.is_host = true;
            room.host_id = next.id;
            tracing::info!(room_code = %room.code, player_id = %next.id, "Host reassigned");
        }
    }

    fx.broadcast(ServerMessage::PlayerLeave {
        player_id,
        player_name: player.name.clone(),
        reason,
        timestamp: ctx.now,
    });
    fx.broadcast(roster_update(room, ctx.now));
    fx.log(
        room.id,
        RoomEventType::PlayerLeft,
        Some(player_id),
        json!({ "playerName": player.name, "reason": reason }),
        ctx.now,
    );
    tracing::info!(room_code = %room.code, player_id = %player_id, ?reason, "Player removed");

    if room
        .voting_session
        .as_ref()
        .is_some_and(|s| !s.is_completed && s.claimant_id == player_id)
    {
        finish_vote(room, ctx, Decision::Denied, false, fx);
    } else {
        reevaluate_vote(room, ctx, fx)?;
    }

    if room.connected_count() == 0 {
        fx.timers.push(TimerRequest::Teardown {
            after: cleanup_window(&room.settings),
        });
    }
    Ok(())
}

/// Reject settings outside the supported ranges.
pub fn validate_settings(settings: &RoomSettings, roster_size: usize) -> Result<(), RoomError> {
    let threshold = settings.democratic_win_threshold;
    if threshold <= Decimal::ZERO || threshold > Decimal::ONE {
        return Err(RoomError::InvalidRequest(String::from(
            "democraticWinThreshold must be greater than 0 and at most 1",
        )));
    }
    if !VOTE_TIMEOUT_RANGE_SECONDS.contains(&settings.vote_timeout_seconds) {
        return Err(RoomError::InvalidRequest(format!(
            "voteTimeoutSeconds must be between {} and {}",
            VOTE_TIMEOUT_RANGE_SECONDS.start(),
            VOTE_TIMEOUT_RANGE_SECONDS.end()
        )));
    }
    let capacity = settings.max_players_per_room;
    if !(MIN_ROOM_CAPACITY..=MAX_ROOM_CAPACITY).contains(&capacity) {
        return Err(RoomError::InvalidRequest(format!(
            "maxPlayersPerRoom must be between {MIN_ROOM_CAPACITY} and {MAX_ROOM_CAPACITY}"
        )));
    }
    if usize::try_from(capacity).unwrap_or(usize::MAX) < roster_size {
        return Err(RoomError::InvalidRequest(String::from(
            "maxPlayersPerRoom cannot be below the current player count",
        )));
    }
    if !CLEANUP_RANGE_MINUTES.contains(&settings.auto_cleanup_minutes) {
        return Err(RoomError::InvalidRequest(format!(
            "autoCleanupMinutes must be between {} and {}",
            CLEANUP_RANGE_MINUTES.start(),
            CLEANUP_RANGE_MINUTES.end()
        )));
    }
    let size = usize::try_from(settings.card_size).unwrap_or(0);
    if settings.card_size < MIN_CARD_SIZE || patterns::side_length(size).is_none() {
        return Err(RoomError::InvalidSize);
    }
    Ok(())
}

/// Trim and bound a display name.
fn clean_name(raw: &str, max_len: usize, field: &str) -> Result<String, RoomError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RoomError::InvalidRequest(format!("{field} is required")));
    }
    if name.chars().count() > max_len {
        return Err(RoomError::InvalidRequest(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(name.to_owned())
}

fn new_player(name: String, is_host: bool, shared_card: &[bingo_types::GridCell], now: DateTime<Utc>) -> Player {
    Player {
        id: PlayerId::new(),
        name,
        connection_id: None,
        is_host,
        is_connected: false,
        joined_at: now,
        last_activity: now,
        card: GridEngine::copy_for_player(shared_card),
        has_claimed_bingo: false,
        win_count: 0,
    }
}

fn player_not_found() -> RoomError {
    RoomError::InvalidRequest(String::from("Player not found in room"))
}

fn host_name_of(room: &Room) -> String {
    room.players
        .get(&room.host_id)
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

fn roster_update(room: &Room, now: DateTime<Utc>) -> ServerMessage {
    ServerMessage::PlayerListUpdate {
        players: room.roster(),
        timestamp: now,
    }
}

/// Name of the current member with the most marks; the earliest joiner
/// wins ties.
fn most_active_player(room: &Room) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for (id, count) in &room.statistics.player_marks {
        let Some(player) = room.players.get(id) else {
            continue;
        };
        if best.is_none_or(|(top, _)| *count > top) {
            best = Some((*count, player.name.as_str()));
        }
    }
    best.map(|(_, name)| name.to_owned())
}

fn round_seconds(state: &GameState, now: DateTime<Utc>) -> u64 {
    state
        .round_start_time
        .map(|start| now.signed_duration_since(start).num_seconds())
        .and_then(|secs| u64::try_from(secs).ok())
        .unwrap_or(0)
}

fn cleanup_window(settings: &RoomSettings) -> Duration {
    Duration::from_secs(u64::from(settings.auto_cleanup_minutes).saturating_mul(60))
}
