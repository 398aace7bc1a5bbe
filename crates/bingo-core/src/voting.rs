//! Consensus voting on win claims.
//!
//! A room holds at most one [`VotingSession`]. Eligible voters are the
//! connected players other than the claimant, counted at the moment of
//! each decision. A session is decided:
//!
//! - early, once `for >= required` (approved) or once the outstanding
//!   voters can no longer reach `required` (denied);
//! - on full turnout, by the same comparison;
//! - on timeout, by the same comparison, except that a session with no
//!   eligible voters left resolves to the room's `approveWhenNoVoters`.
//!
//! where `required = ceil(eligible * threshold)`.

use bingo_types::{Player, PlayerId, Room, Vote, VotingSession, VotingSessionId, VotingStatus, WinPattern};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::RoomError;

/// Outcome of evaluating an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep collecting ballots.
    Pending,
    /// The claim stands.
    Approved,
    /// The claim is rejected.
    Denied,
}

/// Ballot counts of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Ballots for.
    pub votes_for: u32,
    /// Ballots against.
    pub votes_against: u32,
    /// Abstentions.
    pub abstained: u32,
}

/// Open a session on `claimant`'s claim, expiring `timeout_seconds` from `now`.
pub fn open(
    claimant: &Player,
    pattern: WinPattern,
    cells: Vec<usize>,
    now: DateTime<Utc>,
    timeout_seconds: u32,
) -> VotingSession {
    let expires_at = now
        .checked_add_signed(TimeDelta::seconds(i64::from(timeout_seconds)))
        .unwrap_or(now);
    VotingSession {
        id: VotingSessionId::new(),
        claimant_id: claimant.id,
        claimant_name: claimant.name.clone(),
        winning_pattern: pattern,
        winning_cells: cells,
        votes_for: Vec::new(),
        votes_against: Vec::new(),
        abstained: Vec::new(),
        expires_at,
        is_completed: false,
        result: VotingStatus::Pending,
    }
}

/// Connected players other than the claimant, in join order.
pub fn eligible_voters(room: &Room, session: &VotingSession) -> Vec<PlayerId> {
    room.players
        .values()
        .filter(|p| p.is_connected && p.id != session.claimant_id)
        .map(|p| p.id)
        .collect()
}

/// `ceil(eligible * threshold)`.
pub fn required_votes(eligible: usize, threshold: Decimal) -> Result<usize, RoomError> {
    Decimal::from(eligible)
        .checked_mul(threshold)
        .map(|d| d.ceil())
        .and_then(|d| d.to_usize())
        .ok_or_else(|| RoomError::Internal(String::from("vote threshold out of range")))
}

/// Record `voter`'s ballot, replacing any earlier one.
///
/// Returns `false` (and changes nothing) for the claimant or a completed
/// session.
pub fn cast(session: &mut VotingSession, voter: PlayerId, vote: Vote) -> bool {
    if session.is_completed || voter == session.claimant_id {
        return false;
    }
    session.votes_for.retain(|id| *id != voter);
    session.votes_against.retain(|id| *id != voter);
    session.abstained.retain(|id| *id != voter);
    match vote {
        Vote::For => session.votes_for.push(voter),
        Vote::Against => session.votes_against.push(voter),
        Vote::Abstain => session.abstained.push(voter),
    }
    true
}

/// Current ballot counts.
pub fn tally(session: &VotingSession) -> Tally {
    let count = |ids: &[PlayerId]| u32::try_from(ids.len()).unwrap_or(u32::MAX);
    Tally {
        votes_for: count(&session.votes_for),
        votes_against: count(&session.votes_against),
        abstained: count(&session.abstained),
    }
}

/// Decide the session now if the result can no longer change.
pub fn decide_early(
    session: &VotingSession,
    eligible: &[PlayerId],
    threshold: Decimal,
) -> Result<Decision, RoomError> {
    if session.is_completed || eligible.is_empty() {
        return Ok(Decision::Pending);
    }
    let required = required_votes(eligible.len(), threshold)?;
    let in_favour = session.votes_for.iter().filter(|id| eligible.contains(id)).count();
    let outstanding = eligible.iter().filter(|id| !has_voted(session, **id)).count();

    if in_favour >= required {
        Ok(Decision::Approved)
    } else if in_favour.saturating_add(outstanding) < required {
        Ok(Decision::Denied)
    } else {
        Ok(Decision::Pending)
    }
}

/// Decide the session when its timer fires. Never pending.
pub fn decide_on_timeout(
    session: &VotingSession,
    eligible: &[PlayerId],
    threshold: Decimal,
    approve_when_no_voters: bool,
) -> Result<Decision, RoomError> {
    if eligible.is_empty() {
        return Ok(if approve_when_no_voters {
            Decision::Approved
        } else {
            Decision::Denied
        });
    }
    let required = required_votes(eligible.len(), threshold)?;
    let in_favour = session.votes_for.iter().filter(|id| eligible.contains(id)).count();
    Ok(if in_favour >= required {
        Decision::Approved
    } else {
        Decision::Denied
    })
}

/// Whether `player` has a ballot in any of the three lists.
pub fn has_voted(session: &VotingSession, player: PlayerId) -> bool {
    session.votes_for.contains(&player)
        || session.votes_against.contains(&player)
        || session.abstained.contains(&player)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bingo_types::GridCell;

    use super::*;

    fn player(name: &str) -> Player {
        let now = Utc::now();
        Player {
            id: PlayerId::new(),
            name: String::from(name),
            connection_id: None,
            is_host: false,
            is_connected: true,
            joined_at: now,
            last_activity: now,
            card: Vec::<GridCell>::new(),
            has_claimed_bingo: true,
            win_count: 0,
        }
    }

    fn half() -> Decimal {
        Decimal::new(5, 1)
    }

    fn session() -> VotingSession {
        open(&player("Claimant"), WinPattern::Row, vec![0, 1, 2, 3, 4], Utc::now(), 30)
    }

    #[test]
    fn required_votes_rounds_up() {
        assert_eq!(required_votes(3, half()).unwrap(), 2);
        assert_eq!(required_votes(4, half()).unwrap(), 2);
        assert_eq!(required_votes(1, half()).unwrap(), 1);
        assert_eq!(required_votes(5, Decimal::ONE).unwrap(), 5);
        assert_eq!(required_votes(3, Decimal::new(67, 2)).unwrap(), 3);
    }

    #[test]
    fn revote_moves_the_ballot() {
        let mut s = session();
        let voter = PlayerId::new();
        assert!(cast(&mut s, voter, Vote::For));
        assert!(cast(&mut s, voter, Vote::Against));
        assert!(s.votes_for.is_empty());
        assert_eq!(s.votes_against, vec![voter]);
        assert_eq!(tally(&s), Tally { votes_for: 0, votes_against: 1, abstained: 0 });
    }

    #[test]
    fn claimant_cannot_vote() {
        let mut s = session();
        let claimant = s.claimant_id;
        assert!(!cast(&mut s, claimant, Vote::For));
        assert!(s.votes_for.is_empty());
    }

    #[test]
    fn completed_session_ignores_ballots() {
        let mut s = session();
        s.is_completed = true;
        assert!(!cast(&mut s, PlayerId::new(), Vote::For));
    }

    #[test]
    fn two_of_three_approves_without_the_third() {
        let mut s = session();
        let voters = [PlayerId::new(), PlayerId::new(), PlayerId::new()];
        cast(&mut s, voters[0], Vote::For);
        assert_eq!(decide_early(&s, &voters, half()).unwrap(), Decision::Pending);
        cast(&mut s, voters[1], Vote::For);
        assert_eq!(decide_early(&s, &voters, half()).unwrap(), Decision::Approved);
    }

    #[test]
    fn denied_once_approval_is_out_of_reach() {
        let mut s = session();
        let voters = [PlayerId::new(), PlayerId::new(), PlayerId::new()];
        cast(&mut s, voters[0], Vote::Against);
        assert_eq!(decide_early(&s, &voters, half()).unwrap(), Decision::Pending);
        cast(&mut s, voters[1], Vote::Abstain);
        assert_eq!(decide_early(&s, &voters, half()).unwrap(), Decision::Denied);
    }

    #[test]
    fn never_approved_below_the_threshold() {
        let mut s = session();
        let voters: Vec<PlayerId> = (0..4).map(|_| PlayerId::new()).collect();
        for v in voters.iter().skip(1) {
            cast(&mut s, *v, Vote::Against);
        }
        // One of four for, threshold 0.5 needs two.
        cast(&mut s, voters[0], Vote::For);
        assert_eq!(decide_early(&s, &voters, half()).unwrap(), Decision::Denied);
        assert_eq!(decide_on_timeout(&s, &voters, half(), true).unwrap(), Decision::Denied);
    }

    #[test]
    fn ballots_from_departed_voters_do_not_count() {
        let mut s = session();
        let gone = PlayerId::new();
        let stays = PlayerId::new();
        cast(&mut s, gone, Vote::For);
        assert_eq!(decide_early(&s, &[stays], half()).unwrap(), Decision::Pending);
    }

    #[test]
    fn empty_electorate_waits_for_the_timer() {
        let s = session();
        assert_eq!(decide_early(&s, &[], half()).unwrap(), Decision::Pending);
        assert_eq!(decide_on_timeout(&s, &[], half(), true).unwrap(), Decision::Approved);
        assert_eq!(decide_on_timeout(&s, &[], half(), false).unwrap(), Decision::Denied);
    }

    #[test]
    fn expiry_is_timeout_seconds_ahead() {
        let now = Utc::now();
        let s = open(&player("A"), WinPattern::Column, vec![0, 5, 10, 15, 20], now, 45);
        assert_eq!(s.expires_at.signed_duration_since(now).num_seconds(), 45);
        assert_eq!(s.result, VotingStatus::Pending);
    }
}
