//! Grid generation, claim verification and card analysis.
//!
//! [`GridEngine`] is pure: it owns a [`ContentPool`] and never touches the
//! network, persistence or shared randomness. Seeded generation uses a
//! generator scoped to the call, so one seeded grid never affects the
//! randomness of another.

use std::cmp::Reverse;

use bingo_types::limits::FREE_SPACE_TEXT;
use bingo_types::{Difficulty, GridCell, Player, RoomSettings, Theme, WinPattern, WinPatternCounts, WinRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ContentPool};
use crate::error::GridError;
use crate::patterns;

/// Share of an unthemed card drawn from favoured categories, in percent.
const FAVOR_SHARE_PERCENT: usize = 70;

/// Suggestion weights, scaled by ten so popularity tenths stay integral.
const ROW_WEIGHT: u32 = 100;
const COLUMN_WEIGHT: u32 = 100;
const DIAGONAL_WEIGHT: u32 = 150;

/// Leaderboard length in [`RoomGridStats`].
const LEADERBOARD_SIZE: usize = 5;

/// Inputs to [`GridEngine::generate_shared_grid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridOptions {
    /// Number of cells; must be a positive perfect square.
    pub size: u32,
    /// Theme; anything but `Mixed` bypasses the difficulty policy.
    pub theme: Theme,
    /// Difficulty policy for unthemed grids.
    pub difficulty: Difficulty,
    /// Categories never drawn from (unthemed grids).
    pub exclude_categories: Vec<String>,
    /// Categories that make up 70% of an unthemed grid.
    pub favor_categories: Vec<String>,
    /// Makes selection deterministic for this call only.
    pub seed: Option<u64>,
}

impl GridOptions {
    /// Grid options for a room's current settings.
    pub fn from_settings(settings: &RoomSettings) -> Self {
        Self {
            size: settings.card_size,
            theme: settings.theme,
            difficulty: settings.difficulty,
            exclude_categories: settings.exclude_categories.clone(),
            favor_categories: settings.favor_categories.clone(),
            seed: None,
        }
    }
}

/// A completed line found on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinningLine {
    /// Line kind.
    pub pattern: WinPattern,
    /// Cell indices, ascending.
    pub cells: Vec<usize>,
}

/// Progress summary for one card. Counts exclude the free cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    /// Marked content cells.
    pub marked: usize,
    /// Content cells.
    pub total: usize,
    /// Free cells.
    pub free: usize,
    /// Rounded percentage of content cells marked.
    pub percentage: u32,
    /// Unmarked content cells.
    pub remaining: usize,
    /// Fully marked rows.
    pub completed_rows: usize,
    /// Fully marked columns.
    pub completed_columns: usize,
    /// Fully marked diagonals.
    pub completed_diagonals: usize,
}

/// One row of the room leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Player id.
    pub id: bingo_types::PlayerId,
    /// Display name.
    pub name: String,
    /// Approved wins.
    pub win_count: u32,
    /// Card completion.
    pub completion_percentage: u32,
    /// Whether the player is connected.
    pub is_active: bool,
}

/// Room-wide grid analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomGridStats {
    /// Roster size.
    pub total_players: usize,
    /// Connected players.
    pub connected_players: usize,
    /// Resolved claims on record.
    pub total_games: usize,
    /// Resolved claims per pattern.
    pub wins_by_pattern: WinPatternCounts,
    /// Mean "for" ballots per resolved claim, one decimal place.
    pub average_votes_for: Decimal,
    /// Name of the player with the highest completion, or `None`.
    pub most_active_player: String,
    /// Top players by win count.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Pure grid logic over a content pool.
#[derive(Debug, Clone)]
pub struct GridEngine {
    content: ContentPool,
}

impl GridEngine {
    /// Engine over the given content.
    pub const fn new(content: ContentPool) -> Self {
        Self { content }
    }

    /// Engine over the embedded content table.
    pub fn with_embedded_content() -> Result<Self, GridError> {
        Ok(Self::new(ContentPool::embedded()?))
    }

    /// The content pool.
    pub const fn content(&self) -> &ContentPool {
        &self.content
    }

    /// Build a shared grid.
    ///
    /// The center cell `size / 2` is the free space; every other cell is
    /// unmarked. Cells the pool cannot fill get a `Buzzword {index}`
    /// placeholder.
    pub fn generate_shared_grid(&self, options: &GridOptions) -> Result<Vec<GridCell>, GridError> {
        let mut rng = options
            .seed
            .map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
        self.generate_with_rng(options, &mut rng)
    }

    /// [`Self::generate_shared_grid`] with a caller-supplied generator.
    /// `options.seed` is ignored.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        options: &GridOptions,
        rng: &mut R,
    ) -> Result<Vec<GridCell>, GridError> {
        let size = usize::try_from(options.size).map_err(|_e| GridError::InvalidSize { size: options.size })?;
        if patterns::side_length(size).is_none() {
            return Err(GridError::InvalidSize { size: options.size });
        }

        let content_cells = size.saturating_sub(1);
        let texts = self.select_texts(options, content_cells, rng);
        let center = size.checked_div(2).ok_or(GridError::ArithmeticOverflow)?;

        let grid = (0..size)
            .map(|i| {
                if i == center {
                    return GridCell {
                        id: format!("square-{i}"),
                        text: String::from(FREE_SPACE_TEXT),
                        is_marked: true,
                        is_free: true,
                    };
                }
                let slot = if i < center { i } else { i.saturating_sub(1) };
                GridCell {
                    id: format!("square-{i}"),
                    text: texts.get(slot).cloned().unwrap_or_else(|| format!("Buzzword {i}")),
                    is_marked: false,
                    is_free: false,
                }
            })
            .collect();

        tracing::debug!(size, theme = ?options.theme, difficulty = ?options.difficulty, "Generated grid");
        Ok(grid)
    }

    /// A player's private copy: same cells, only the free space marked.
    pub fn copy_for_player(grid: &[GridCell]) -> Vec<GridCell> {
        grid.iter()
            .map(|cell| GridCell {
                is_marked: cell.is_free,
                ..cell.clone()
            })
            .collect()
    }

    /// Whether `cells` is exactly one canonical `pattern` line and every
    /// one of them is marked on `card`.
    pub fn verify_claim(card: &[GridCell], pattern: WinPattern, cells: &[usize]) -> bool {
        let Some(side) = patterns::side_length(card.len()) else {
            return false;
        };
        patterns::is_canonical(pattern, cells, side) && all_marked(card, cells)
    }

    /// Every fully marked line, in tie-break order.
    pub fn find_all_wins(card: &[GridCell]) -> Vec<WinningLine> {
        let Some(side) = patterns::side_length(card.len()) else {
            return Vec::new();
        };
        patterns::all_lines(side)
            .into_iter()
            .filter(|(_, cells)| all_marked(card, cells))
            .map(|(pattern, cells)| WinningLine { pattern, cells })
            .collect()
    }

    /// The first fully marked line, if any.
    pub fn first_win(card: &[GridCell]) -> Option<WinningLine> {
        Self::find_all_wins(card).into_iter().next()
    }

    /// Texts of up to `max` unmarked cells that bring the card closest
    /// to a win.
    ///
    /// Each unmarked cell scores 10 per marked cell in its row and column,
    /// 15 per marked cell on each diagonal through it, plus a tenth of the
    /// item's popularity. Ties keep index order.
    pub fn suggest_next_moves(&self, card: &[GridCell], max: usize) -> Vec<String> {
        let Some(side) = patterns::side_length(card.len()) else {
            return Vec::new();
        };
        let main = patterns::main_diagonal(side);
        let anti = patterns::anti_diagonal(side);

        let mut scored: Vec<(u32, &str)> = card
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_marked && !cell.is_free)
            .map(|(index, cell)| {
                let row = index.checked_div(side).unwrap_or(0);
                let col = index.checked_rem(side).unwrap_or(0);

                let mut score = ROW_WEIGHT
                    .saturating_mul(marked_count(card, &patterns::row_cells(row, side)))
                    .saturating_add(COLUMN_WEIGHT.saturating_mul(marked_count(card, &patterns::column_cells(col, side))));
                if main.contains(&index) {
                    score = score.saturating_add(DIAGONAL_WEIGHT.saturating_mul(marked_count(card, &main)));
                }
                if anti.contains(&index) {
                    score = score.saturating_add(DIAGONAL_WEIGHT.saturating_mul(marked_count(card, &anti)));
                }
                score = score.saturating_add(self.content.popularity_of(&cell.text).unwrap_or(0));

                (score, cell.text.as_str())
            })
            .collect();

        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored.into_iter().take(max).map(|(_, text)| text.to_owned()).collect()
    }

    /// Rounded percentage of all cells marked (free cell included).
    pub fn completion_percentage(card: &[GridCell]) -> u32 {
        let marked = card.iter().filter(|c| c.is_marked).count();
        rounded_percent(marked, card.len())
    }

    /// Progress summary for one card.
    pub fn card_stats(card: &[GridCell]) -> CardStats {
        let total = card.iter().filter(|c| !c.is_free).count();
        let free = card.len().saturating_sub(total);
        let marked = card.iter().filter(|c| c.is_marked && !c.is_free).count();
        let wins = Self::find_all_wins(card);
        let completed = |pattern: WinPattern| wins.iter().filter(|w| w.pattern == pattern).count();

        CardStats {
            marked,
            total,
            free,
            percentage: rounded_percent(marked, total),
            remaining: total.saturating_sub(marked),
            completed_rows: completed(WinPattern::Row),
            completed_columns: completed(WinPattern::Column),
            completed_diagonals: completed(WinPattern::Diagonal),
        }
    }

    /// Room-wide analysis over a roster and its claim history.
    pub fn room_stats<'a>(
        players: impl IntoIterator<Item = &'a Player>,
        history: &[WinRecord],
    ) -> Result<RoomGridStats, GridError> {
        let entries: Vec<LeaderboardEntry> = players
            .into_iter()
            .map(|p| LeaderboardEntry {
                id: p.id,
                name: p.name.clone(),
                win_count: p.win_count,
                completion_percentage: Self::completion_percentage(&p.card),
                is_active: p.is_connected,
            })
            .collect();

        let mut wins_by_pattern = WinPatternCounts::default();
        for record in history {
            wins_by_pattern.record(record.winning_pattern);
        }

        let average_votes_for = if history.is_empty() {
            Decimal::ZERO
        } else {
            let votes: u64 = history.iter().map(|r| u64::from(r.votes_for)).sum();
            Decimal::from(votes)
                .checked_div(Decimal::from(history.len()))
                .ok_or(GridError::ArithmeticOverflow)?
                .round_dp(1)
        };

        // Highest completion; the earliest player wins ties.
        let most_active_player = entries
            .iter()
            .fold(None::<&LeaderboardEntry>, |best, e| match best {
                Some(b) if e.completion_percentage <= b.completion_percentage => Some(b),
                _ => Some(e),
            })
            .map_or_else(|| String::from("None"), |e| e.name.clone());

        let connected_players = entries.iter().filter(|e| e.is_active).count();
        let total_players = entries.len();
        let mut leaderboard = entries;
        leaderboard.sort_by_key(|e| Reverse(e.win_count));
        leaderboard.truncate(LEADERBOARD_SIZE);

        Ok(RoomGridStats {
            total_players,
            connected_players,
            total_games: history.len(),
            wins_by_pattern,
            average_votes_for,
            most_active_player,
            leaderboard,
        })
    }

    fn select_texts<R: Rng + ?Sized>(&self, options: &GridOptions, count: usize, rng: &mut R) -> Vec<String> {
        let picked: Vec<&ContentItem> = if options.theme == Theme::Mixed {
            self.select_by_difficulty(options, count, rng)
        } else {
            self.content.themed(options.theme, count, rng)
        };
        picked.into_iter().map(|i| i.text.clone()).collect()
    }

    fn select_by_difficulty<R: Rng + ?Sized>(
        &self,
        options: &GridOptions,
        count: usize,
        rng: &mut R,
    ) -> Vec<&ContentItem> {
        let candidates: Vec<&ContentItem> = self
            .content
            .all()
            .iter()
            .filter(|i| !options.exclude_categories.contains(&i.category))
            .filter(|i| accepts(options.difficulty, i))
            .collect();

        if options.favor_categories.is_empty() {
            return shuffled_take(candidates, count, rng);
        }

        let (favored, others): (Vec<&ContentItem>, Vec<&ContentItem>) = candidates
            .into_iter()
            .partition(|i| options.favor_categories.contains(&i.category));
        let favored_count = count
            .saturating_mul(FAVOR_SHARE_PERCENT)
            .checked_div(100)
            .unwrap_or(0);
        let other_count = count.saturating_sub(favored_count);

        let mut picked = shuffled_take(favored, favored_count, rng);
        picked.extend(shuffled_take(others, other_count, rng));
        picked.truncate(count);
        picked
    }
}

/// Whether `item` passes the difficulty policy.
const fn accepts(difficulty: Difficulty, item: &ContentItem) -> bool {
    match difficulty {
        Difficulty::Easy => item.popularity >= 80 && item.pain_level <= 6,
        Difficulty::Hard => item.popularity <= 75 || item.pain_level >= 8,
        Difficulty::Normal => true,
    }
}

fn shuffled_take<'a, R: Rng + ?Sized>(
    mut items: Vec<&'a ContentItem>,
    count: usize,
    rng: &mut R,
) -> Vec<&'a ContentItem> {
    items.shuffle(rng);
    items.truncate(count);
    items
}

fn all_marked(card: &[GridCell], cells: &[usize]) -> bool {
    cells.iter().all(|&i| card.get(i).is_some_and(|c| c.is_marked))
}

fn marked_count(card: &[GridCell], cells: &[usize]) -> u32 {
    let count = cells
        .iter()
        .filter(|&&i| card.get(i).is_some_and(|c| c.is_marked))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// `round(100 * part / whole)`, 0 for an empty whole.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    let scaled = part
        .saturating_mul(200)
        .saturating_add(whole)
        .checked_div(whole.saturating_mul(2))
        .unwrap_or(0);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use bingo_types::PlayerId;
    use chrono::Utc;

    use super::*;

    fn engine() -> GridEngine {
        GridEngine::with_embedded_content().unwrap()
    }

    fn options(size: u32) -> GridOptions {
        GridOptions {
            size,
            ..GridOptions::default()
        }
    }

    fn mark(card: &mut [GridCell], cells: &[usize]) {
        for &i in cells {
            card[i].is_marked = true;
        }
    }

    #[test]
    fn perfect_square_sizes_produce_one_free_center_cell() {
        let engine = engine();
        for size in [1_u32, 9, 16, 25, 36, 49] {
            let grid = engine.generate_shared_grid(&options(size)).unwrap();
            let size = usize::try_from(size).unwrap();
            assert_eq!(grid.len(), size);
            let center = size / 2;
            let free: Vec<usize> = grid.iter().enumerate().filter(|(_, c)| c.is_free).map(|(i, _)| i).collect();
            assert_eq!(free, vec![center]);
            assert!(grid[center].is_marked);
            assert_eq!(grid[center].text, FREE_SPACE_TEXT);
            assert!(grid.iter().filter(|c| !c.is_free).all(|c| !c.is_marked));
            assert!(grid.iter().enumerate().all(|(i, c)| c.id == format!("square-{i}")));
        }
    }

    #[test]
    fn non_square_size_is_rejected() {
        let err = engine().generate_shared_grid(&options(24)).unwrap_err();
        assert!(matches!(err, GridError::InvalidSize { size: 24 }));
        assert!(engine().generate_shared_grid(&options(0)).is_err());
    }

    #[test]
    fn seed_makes_generation_deterministic() {
        let engine = engine();
        let seeded = GridOptions {
            seed: Some(42),
            ..options(25)
        };
        let a = engine.generate_shared_grid(&seeded).unwrap();
        let b = engine.generate_shared_grid(&seeded).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn content_cells_are_distinct() {
        let grid = engine().generate_shared_grid(&options(25)).unwrap();
        let texts: HashSet<&str> = grid.iter().filter(|c| !c.is_free).map(|c| c.text.as_str()).collect();
        assert_eq!(texts.len(), 24);
    }

    #[test]
    fn easy_difficulty_only_uses_easy_content() {
        let engine = engine();
        let grid = engine
            .generate_shared_grid(&GridOptions {
                difficulty: Difficulty::Easy,
                seed: Some(1),
                ..options(9)
            })
            .unwrap();
        for cell in grid.iter().filter(|c| !c.is_free) {
            let item = engine.content().all().iter().find(|i| i.text == cell.text).unwrap();
            assert!(item.popularity >= 80 && item.pain_level <= 6);
        }
    }

    #[test]
    fn exhausted_pool_falls_back_to_placeholders() {
        let engine = engine();
        let grid = engine
            .generate_shared_grid(&GridOptions {
                exclude_categories: engine.content().categories().keys().cloned().collect(),
                ..options(9)
            })
            .unwrap();
        assert_eq!(grid[0].text, "Buzzword 0");
        assert_eq!(grid[8].text, "Buzzword 8");
        assert!(grid[4].is_free);
    }

    #[test]
    fn favored_categories_fill_seventy_percent() {
        let engine = engine();
        let grid = engine
            .generate_shared_grid(&GridOptions {
                favor_categories: vec![String::from("technology"), String::from("business")],
                seed: Some(9),
                ..options(25)
            })
            .unwrap();
        let favored = grid
            .iter()
            .filter(|c| !c.is_free)
            .filter(|c| {
                engine
                    .content()
                    .all()
                    .iter()
                    .any(|i| i.text == c.text && (i.category == "technology" || i.category == "business"))
            })
            .count();
        // floor(24 * 0.7) = 16 favoured, the remaining 8 from elsewhere.
        assert_eq!(favored, 16);
    }

    #[test]
    fn themed_grid_uses_theme_categories() {
        let engine = engine();
        let grid = engine
            .generate_shared_grid(&GridOptions {
                theme: Theme::Strategy,
                seed: Some(4),
                ..options(9)
            })
            .unwrap();
        for cell in grid.iter().filter(|c| !c.is_free) {
            let item = engine.content().all().iter().find(|i| i.text == cell.text).unwrap();
            assert!(item.category == "strategy" || item.category == "business");
        }
    }

    #[test]
    fn player_copy_marks_only_free_space() {
        let engine = engine();
        let mut shared = engine.generate_shared_grid(&options(25)).unwrap();
        mark(&mut shared, &[0, 1]);
        let copy = GridEngine::copy_for_player(&shared);
        assert_eq!(copy.len(), shared.len());
        assert!(copy.iter().all(|c| c.is_marked == c.is_free));
        assert!(copy.iter().zip(&shared).all(|(a, b)| a.id == b.id && a.text == b.text));
    }

    #[test]
    fn partial_row_claim_is_invalid() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(25)).unwrap());
        mark(&mut card, &[0, 1, 2, 3]);
        assert!(!GridEngine::verify_claim(&card, WinPattern::Row, &[0, 1, 2, 3, 4]));
        mark(&mut card, &[4]);
        assert!(GridEngine::verify_claim(&card, WinPattern::Row, &[0, 1, 2, 3, 4]));
    }

    #[test]
    fn claim_must_be_canonical_even_if_marked() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(25)).unwrap());
        mark(&mut card, &[3, 4, 5, 6, 7]);
        assert!(!GridEngine::verify_claim(&card, WinPattern::Row, &[3, 4, 5, 6, 7]));
        assert!(!GridEngine::verify_claim(&card, WinPattern::Row, &[99, 100, 101, 102, 103]));
    }

    #[test]
    fn diagonal_through_free_space() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(25)).unwrap());
        mark(&mut card, &[0, 6, 18, 24]);
        assert!(GridEngine::verify_claim(&card, WinPattern::Diagonal, &[0, 6, 12, 18, 24]));
        let first = GridEngine::first_win(&card).unwrap();
        assert_eq!(first.pattern, WinPattern::Diagonal);
        assert_eq!(first.cells, vec![0, 6, 12, 18, 24]);
    }

    #[test]
    fn find_all_wins_uses_tie_break_order() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(9)).unwrap());
        mark(&mut card, &[0, 1, 2, 3, 6]);
        let wins = GridEngine::find_all_wins(&card);
        let kinds: Vec<WinPattern> = wins.iter().map(|w| w.pattern).collect();
        assert_eq!(kinds, vec![WinPattern::Row, WinPattern::Column, WinPattern::Diagonal]);
        assert_eq!(wins[2].cells, vec![2, 4, 6]);
        assert!(GridEngine::first_win(&GridEngine::copy_for_player(&card)).is_none());
    }

    #[test]
    fn suggestions_favor_nearly_complete_lines() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(25)).unwrap());
        mark(&mut card, &[20, 21, 22, 23]);
        let suggestions = engine.suggest_next_moves(&card, 3);
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], card[24].text);
    }

    #[test]
    fn completion_and_card_stats() {
        let engine = engine();
        let mut card = GridEngine::copy_for_player(&engine.generate_shared_grid(&options(9)).unwrap());
        assert_eq!(GridEngine::completion_percentage(&card), 11);
        mark(&mut card, &[0, 1, 2]);
        let stats = GridEngine::card_stats(&card);
        assert_eq!(stats.marked, 3);
        assert_eq!(stats.total, 8);
        assert_eq!(stats.free, 1);
        assert_eq!(stats.percentage, 38);
        assert_eq!(stats.remaining, 5);
        assert_eq!(stats.completed_rows, 1);
        assert_eq!(stats.completed_columns, 0);
        assert_eq!(GridEngine::completion_percentage(&card), 44);
        assert_eq!(GridEngine::completion_percentage(&[]), 0);
    }

    #[test]
    fn room_stats_rank_players() {
        let engine = engine();
        let shared = engine.generate_shared_grid(&options(9)).unwrap();
        let now = Utc::now();
        let player = |name: &str, wins: u32, marks: &[usize], connected: bool| {
            let mut card = GridEngine::copy_for_player(&shared);
            mark(&mut card, marks);
            Player {
                id: PlayerId::new(),
                name: name.to_owned(),
                connection_id: None,
                is_host: false,
                is_connected: connected,
                joined_at: now,
                last_activity: now,
                card,
                has_claimed_bingo: false,
                win_count: wins,
            }
        };
        let players = vec![
            player("Ada", 1, &[0], true),
            player("Grace", 3, &[0, 1, 2], false),
            player("Linus", 0, &[], true),
        ];
        let record = |votes_for: u32, pattern: WinPattern| WinRecord {
            player_id: players[1].id,
            player_name: String::from("Grace"),
            timestamp: now,
            winning_pattern: pattern,
            winning_cells: vec![0, 1, 2],
            votes_for,
            votes_against: 0,
            was_approved: true,
        };
        let history = vec![record(2, WinPattern::Row), record(1, WinPattern::Row), record(1, WinPattern::Column)];

        let stats = GridEngine::room_stats(&players, &history).unwrap();
        assert_eq!(stats.total_players, 3);
        assert_eq!(stats.connected_players, 2);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.wins_by_pattern.row, 2);
        assert_eq!(stats.wins_by_pattern.column, 1);
        assert_eq!(stats.average_votes_for, Decimal::new(13, 1));
        assert_eq!(stats.most_active_player, "Grace");
        assert_eq!(stats.leaderboard[0].name, "Grace");
        assert_eq!(stats.leaderboard[1].name, "Ada");
    }

    #[test]
    fn room_stats_without_players() {
        let stats = GridEngine::room_stats(&[], &[]).unwrap();
        assert_eq!(stats.most_active_player, "None");
        assert_eq!(stats.average_votes_for, Decimal::ZERO);
        assert!(stats.leaderboard.is_empty());
    }
}
