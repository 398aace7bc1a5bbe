//! Canonical winning lines on a square grid.
//!
//! Cells are indexed row-major from 0. A grid of `size` cells has side
//! `sqrt(size)` and exactly `2 * side + 2` winning lines, enumerated in a
//! fixed order: rows top to bottom, columns left to right, the main
//! diagonal, then the anti-diagonal. Every line is returned in ascending
//! index order.

use bingo_types::WinPattern;

/// Side length of a square grid with `size` cells, or `None` when `size`
/// is zero or not a perfect square.
pub const fn side_length(size: usize) -> Option<usize> {
    if size == 0 {
        return None;
    }
    let side = size.isqrt();
    match side.checked_mul(side) {
        Some(square) if square == size => Some(side),
        _ => None,
    }
}

/// Indices of row `row`.
pub fn row_cells(row: usize, side: usize) -> Vec<usize> {
    let start = row.saturating_mul(side);
    (start..start.saturating_add(side)).collect()
}

/// Indices of column `col`.
pub fn column_cells(col: usize, side: usize) -> Vec<usize> {
    (0..side).map(|r| r.saturating_mul(side).saturating_add(col)).collect()
}

/// Indices of the top-left to bottom-right diagonal.
pub fn main_diagonal(side: usize) -> Vec<usize> {
    (0..side).map(|i| i.saturating_mul(side).saturating_add(i)).collect()
}

/// Indices of the top-right to bottom-left diagonal.
pub fn anti_diagonal(side: usize) -> Vec<usize> {
    let last = side.saturating_sub(1);
    (0..side)
        .map(|i| i.saturating_mul(side).saturating_add(last.saturating_sub(i)))
        .collect()
}

/// Every winning line, in tie-break order.
pub fn all_lines(side: usize) -> Vec<(WinPattern, Vec<usize>)> {
    let mut lines = Vec::with_capacity(side.saturating_mul(2).saturating_add(2));
    lines.extend((0..side).map(|r| (WinPattern::Row, row_cells(r, side))));
    lines.extend((0..side).map(|c| (WinPattern::Column, column_cells(c, side))));
    lines.push((WinPattern::Diagonal, main_diagonal(side)));
    lines.push((WinPattern::Diagonal, anti_diagonal(side)));
    lines
}

/// Whether `cells` is exactly one canonical line of kind `pattern`.
///
/// Order is irrelevant; duplicates, extras and partial lines are not.
pub fn is_canonical(pattern: WinPattern, cells: &[usize], side: usize) -> bool {
    if cells.len() != side {
        return false;
    }
    let mut sorted = cells.to_vec();
    sorted.sort_unstable();
    all_lines(side)
        .into_iter()
        .any(|(kind, line)| kind == pattern && line == sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_length_accepts_only_perfect_squares() {
        assert_eq!(side_length(25), Some(5));
        assert_eq!(side_length(9), Some(3));
        assert_eq!(side_length(1), Some(1));
        assert_eq!(side_length(24), None);
        assert_eq!(side_length(0), None);
    }

    #[test]
    fn lines_of_a_five_by_five_grid() {
        assert_eq!(row_cells(2, 5), vec![10, 11, 12, 13, 14]);
        assert_eq!(column_cells(1, 5), vec![1, 6, 11, 16, 21]);
        assert_eq!(main_diagonal(5), vec![0, 6, 12, 18, 24]);
        assert_eq!(anti_diagonal(5), vec![4, 8, 12, 16, 20]);
        assert_eq!(all_lines(5).len(), 12);
    }

    #[test]
    fn canonical_match_ignores_order() {
        assert!(is_canonical(WinPattern::Diagonal, &[20, 16, 12, 8, 4], 5));
        assert!(is_canonical(WinPattern::Column, &[21, 1, 11, 6, 16], 5));
    }

    #[test]
    fn canonical_match_rejects_wrong_kind_and_near_misses() {
        // A row claimed as a column.
        assert!(!is_canonical(WinPattern::Column, &[0, 1, 2, 3, 4], 5));
        // Same cells as a row but wrapped across two rows.
        assert!(!is_canonical(WinPattern::Row, &[3, 4, 5, 6, 7], 5));
        // Duplicated cell.
        assert!(!is_canonical(WinPattern::Row, &[0, 1, 2, 3, 3], 5));
        // Too few cells.
        assert!(!is_canonical(WinPattern::Row, &[0, 1, 2, 3], 5));
    }
}
