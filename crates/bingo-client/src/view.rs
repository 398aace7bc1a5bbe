//! Client-side mirror of room state.

use bingo_types::{
    GameState, GridCell, PlayerId, PlayerSummary, RoomSettings, ServerMessage, Vote, VotingSession,
};
use serde::Serialize;

/// What a participant currently knows about their room, rebuilt from
/// server pushes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalView {
    /// The local player.
    pub player_id: Option<PlayerId>,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Round state, once the first `GAME_STATE_UPDATE` arrived.
    pub game_state: Option<GameState>,
    /// The local player's card.
    pub card: Vec<GridCell>,
    /// Settings, once announced.
    pub settings: Option<RoomSettings>,
    /// Open voting session.
    pub voting_session: Option<VotingSession>,
    /// Set when the local player was kicked.
    pub kicked: bool,
}

impl LocalView {
    /// An empty view for `player_id`.
    pub fn for_player(player_id: PlayerId) -> Self {
        Self {
            player_id: Some(player_id),
            ..Self::default()
        }
    }

    /// Fold one server message into the view.
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::PlayerListUpdate { players, .. } => players.clone_into(&mut self.players),
            ServerMessage::GameStateUpdate {
                game_state,
                shared_card,
                ..
            } => {
                self.game_state = Some(game_state.clone());
                shared_card.clone_into(&mut self.card);
            }
            ServerMessage::NewGame { shared_card, .. } => {
                shared_card.clone_into(&mut self.card);
                self.voting_session = None;
                if let Some(state) = self.game_state.as_mut() {
                    state.current_round = state.current_round.saturating_add(1);
                    state.total_rounds = state.total_rounds.saturating_add(1);
                    state.is_round_active = true;
                }
            }
            ServerMessage::SquareMarked { square_id, player_id, .. } => self.set_mark(*player_id, square_id, true),
            ServerMessage::SquareUnmarked { square_id, player_id, .. } => {
                self.set_mark(*player_id, square_id, false);
            }
            ServerMessage::RoomSettingsUpdate { settings, .. } => self.settings = Some(settings.clone()),
            ServerMessage::VotingStart { voting_session, .. } => {
                self.voting_session = Some(voting_session.as_ref().clone());
            }
            ServerMessage::WinVote {
                voting_session_id,
                player_id,
                vote,
                ..
            } => {
                if let Some(session) = self
                    .voting_session
                    .as_mut()
                    .filter(|s| s.id == *voting_session_id)
                {
                    session.votes_for.retain(|id| id != player_id);
                    session.votes_against.retain(|id| id != player_id);
                    session.abstained.retain(|id| id != player_id);
                    match vote {
                        Vote::For => session.votes_for.push(*player_id),
                        Vote::Against => session.votes_against.push(*player_id),
                        Vote::Abstain => session.abstained.push(*player_id),
                    }
                }
            }
            ServerMessage::VotingEnd { voting_session_id, .. } => {
                if self
                    .voting_session
                    .as_ref()
                    .is_some_and(|s| s.id == *voting_session_id)
                {
                    self.voting_session = None;
                }
            }
            ServerMessage::PlayerKick { kicked_player_id, .. } => {
                if self.player_id == Some(*kicked_player_id) {
                    self.kicked = true;
                }
            }
            ServerMessage::PlayerJoin { .. }
            | ServerMessage::PlayerLeave { .. }
            | ServerMessage::BingoClaim { .. }
            | ServerMessage::ChatMessage { .. }
            | ServerMessage::Error { .. }
            | ServerMessage::Heartbeat { .. } => {}
        }
    }

    /// Ids of the marked cells on the local card, free cell included.
    pub fn marked_cells(&self) -> Vec<usize> {
        self.card
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_marked || cell.is_free)
            .map(|(index, _)| index)
            .collect()
    }

    /// The local player's roster entry.
    pub fn me(&self) -> Option<&PlayerSummary> {
        self.players.iter().find(|p| Some(p.id) == self.player_id)
    }

    fn set_mark(&mut self, player: PlayerId, square_id: &str, marked: bool) {
        if self.player_id != Some(player) {
            return;
        }
        if let Some(cell) = self.card.iter_mut().find(|c| c.id == square_id && !c.is_free) {
            cell.is_marked = marked;
        }
    }
}
