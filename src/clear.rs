//! Group completion: rows, columns and 3x3 squares, the sweep rules, and the dry-run prediction
//! used for drag highlights.

use crate::board::{BOARD_SIZE, BlockColor, Board, Cell};
use crate::placement::GridPos;
use crate::shapes::Shape;

/// Multiplier added per monochrome group in colour mode.
const MONOCHROME_STEP: u32 = 2;

/// A row, a column, or one of the nine 3x3 squares (indexed by square row/col 0..3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Row(usize),
    Col(usize),
    Square(usize, usize),
}

impl Group {
    /// The nine (row, col) positions of the group.
    pub fn cells(self) -> [(usize, usize); BOARD_SIZE] {
        std::array::from_fn(|i| match self {
            Self::Row(r) => (r, i),
            Self::Col(c) => (i, c),
            Self::Square(sr, sc) => (sr * 3 + i / 3, sc * 3 + i % 3),
        })
    }

    fn is_complete(self, board: &Board) -> bool {
        self.cells().iter().all(|&(r, c)| board.is_filled(r, c))
    }

    /// All nine cells present and sharing one colour.
    fn is_monochrome(self, board: &Board) -> bool {
        let mut colors = self.cells().into_iter().map(|(r, c)| board.get(r, c).map(|x| x.color));
        match colors.next().flatten() {
            Some(first) => colors.all(|c| c == Some(first)),
            None => false,
        }
    }
}

/// Completed groups, in scan order: rows, then columns, then squares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub squares: Vec<(usize, usize)>,
}

impl Completion {
    pub fn count(&self) -> usize {
        self.rows.len() + self.cols.len() + self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        self.rows
            .iter()
            .map(|&r| Group::Row(r))
            .chain(self.cols.iter().map(|&c| Group::Col(c)))
            .chain(self.squares.iter().map(|&(r, c)| Group::Square(r, c)))
    }

    /// True if (row, col) lies in any completed group.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.rows.contains(&row)
            || self.cols.contains(&col)
            || self.squares.contains(&(row / 3, col / 3))
    }
}

/// Scan all 27 groups. Rocks count as filled.
pub fn find_complete(board: &Board) -> Completion {
    let mut out = Completion::default();
    for i in 0..BOARD_SIZE {
        if Group::Row(i).is_complete(board) {
            out.rows.push(i);
        }
    }
    for i in 0..BOARD_SIZE {
        if Group::Col(i).is_complete(board) {
            out.cols.push(i);
        }
    }
    for sr in 0..3 {
        for sc in 0..3 {
            if Group::Square(sr, sc).is_complete(board) {
                out.squares.push((sr, sc));
            }
        }
    }
    out
}

/// Groups that placing `shape` at `pos` would complete. Works on a copy; covered cells off the
/// board are ignored.
pub fn predict_will_clear(board: &Board, shape: &Shape, pos: GridPos) -> Completion {
    let mut scratch = *board;
    for (dr, dc) in shape.offsets() {
        let r = pos.row + dr as i32;
        let c = pos.col + dc as i32;
        if r >= 0 && c >= 0 {
            scratch.set(r as usize, c as usize, Some(Cell::plain(BlockColor::Cyan)));
        }
    }
    find_complete(&scratch)
}

/// Outcome of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub groups: Completion,
    /// Number of monochrome groups counted toward the multiplier.
    pub monochrome: u32,
    pub multiplier: u32,
    /// Cells emptied, with their former colour.
    pub destroyed: Vec<(usize, usize, BlockColor)>,
    /// Ice cells cracked back to plain.
    pub cracked: Vec<(usize, usize)>,
}

impl ClearReport {
    pub fn group_count(&self) -> u32 {
        self.groups.count() as u32
    }
}

/// Sweep every completed group. Rocks stay, ice cracks to plain, everything else is emptied.
/// Each position is handled once even if it lies in several groups.
pub fn clear_completed(board: &mut Board, monochrome_bonus: bool) -> Option<ClearReport> {
    let groups = find_complete(board);
    if groups.is_empty() {
        return None;
    }

    let monochrome = if monochrome_bonus {
        groups.groups().filter(|g| g.is_monochrome(board)).count() as u32
    } else {
        0
    };

    let mut swept = [[false; BOARD_SIZE]; BOARD_SIZE];
    for group in groups.groups() {
        for (r, c) in group.cells() {
            swept[r][c] = true;
        }
    }

    let mut destroyed = Vec::new();
    let mut cracked = Vec::new();
    for (r, row) in swept.iter().enumerate() {
        for (c, _) in row.iter().enumerate().filter(|(_, s)| **s) {
            let Some(cell) = board.get_mut(r, c) else {
                continue;
            };
            if cell.rock {
                continue;
            }
            if cell.ice {
                cell.ice = false;
                cracked.push((r, c));
            } else {
                destroyed.push((r, c, cell.color));
                board.set(r, c, None);
            }
        }
    }

    Some(ClearReport {
        groups,
        monochrome,
        multiplier: 1 + MONOCHROME_STEP * monochrome,
        destroyed,
        cracked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(color: BlockColor) -> Option<Cell> {
        Some(Cell::plain(color))
    }

    fn fill_row(board: &mut Board, row: usize, skip: Option<usize>) {
        for c in 0..BOARD_SIZE {
            if Some(c) != skip {
                board.set(row, c, plain(BlockColor::Cyan));
            }
        }
    }

    #[test]
    fn test_group_cells() {
        assert_eq!(Group::Row(2).cells()[8], (2, 8));
        assert_eq!(Group::Col(5).cells()[0], (0, 5));
        let sq = Group::Square(1, 2).cells();
        assert_eq!(sq[0], (3, 6));
        assert_eq!(sq[8], (5, 8));
    }

    #[test]
    fn test_find_complete_row_col_square() {
        let mut b = Board::new();
        fill_row(&mut b, 0, None);
        for r in 0..BOARD_SIZE {
            b.set(r, 8, plain(BlockColor::Red));
        }
        for r in 6..9 {
            for c in 0..3 {
                b.set(r, c, plain(BlockColor::Blue));
            }
        }
        let done = find_complete(&b);
        assert_eq!(done.rows, vec![0]);
        assert_eq!(done.cols, vec![8]);
        assert_eq!(done.squares, vec![(2, 0)]);
        assert_eq!(done.count(), 3);
        assert!(done.covers(7, 1));
        assert!(done.covers(4, 8));
        assert!(!done.covers(4, 4));
    }

    #[test]
    fn test_sweep_rules_plain_ice_rock() {
        let mut b = Board::new();
        fill_row(&mut b, 3, None);
        let mut ice = Cell::plain(BlockColor::Yellow);
        ice.ice = true;
        b.set(3, 2, Some(ice));
        b.set(3, 6, Some(Cell::rock()));

        let report = clear_completed(&mut b, false).unwrap();
        assert_eq!(report.group_count(), 1);
        assert_eq!(report.cracked, vec![(3, 2)]);
        assert_eq!(report.destroyed.len(), 7);
        assert_eq!(b.get(3, 2), plain(BlockColor::Yellow));
        assert_eq!(b.get(3, 6), Some(Cell::rock()));
        for c in [0, 1, 3, 4, 5, 7, 8] {
            assert_eq!(b.get(3, c), None);
        }
    }

    #[test]
    fn test_ice_breaks_on_second_sweep() {
        let mut b = Board::new();
        fill_row(&mut b, 0, None);
        let mut ice = Cell::plain(BlockColor::Blue);
        ice.ice = true;
        b.set(0, 4, Some(ice));

        clear_completed(&mut b, false).unwrap();
        assert_eq!(b.get(0, 4), plain(BlockColor::Blue));

        // an unrelated sweep elsewhere leaves it alone
        fill_row(&mut b, 5, None);
        clear_completed(&mut b, false).unwrap();
        assert_eq!(b.get(0, 4), plain(BlockColor::Blue));

        // second sweep through its column
        for r in 0..BOARD_SIZE {
            if r != 0 {
                b.set(r, 4, plain(BlockColor::Red));
            }
        }
        clear_completed(&mut b, false).unwrap();
        assert_eq!(b.get(0, 4), None);
    }

    #[test]
    fn test_rock_counts_toward_completion_and_survives() {
        let mut b = Board::new();
        fill_row(&mut b, 8, Some(3));
        b.set(8, 3, Some(Cell::rock()));
        let report = clear_completed(&mut b, false).unwrap();
        assert_eq!(report.groups.rows, vec![8]);
        assert_eq!(b.get(8, 3), Some(Cell::rock()));
        assert_eq!(b.filled_count(), 1);
    }

    #[test]
    fn test_overlapping_groups_sweep_once() {
        let mut b = Board::new();
        fill_row(&mut b, 0, None);
        for r in 0..BOARD_SIZE {
            b.set(r, 0, plain(BlockColor::Cyan));
        }
        let mut ice = Cell::plain(BlockColor::Cyan);
        ice.ice = true;
        b.set(0, 0, Some(ice));
        let report = clear_completed(&mut b, false).unwrap();
        assert_eq!(report.group_count(), 2);
        // the shared corner is cracked once, not cracked then destroyed
        assert_eq!(report.cracked, vec![(0, 0)]);
        assert_eq!(b.get(0, 0), plain(BlockColor::Cyan));
        assert_eq!(report.destroyed.len(), 16);
    }

    #[test]
    fn test_monochrome_multiplier() {
        let mut b = Board::new();
        fill_row(&mut b, 0, None); // all cyan
        for c in 0..BOARD_SIZE {
            b.set(1, c, plain(if c == 4 { BlockColor::Red } else { BlockColor::Blue }));
        }
        let report = clear_completed(&mut b.clone(), true).unwrap();
        assert_eq!(report.group_count(), 2);
        assert_eq!(report.monochrome, 1);
        assert_eq!(report.multiplier, 3);

        let report = clear_completed(&mut b, false).unwrap();
        assert_eq!(report.multiplier, 1);
    }

    #[test]
    fn test_no_groups_no_report() {
        let mut b = Board::new();
        fill_row(&mut b, 0, Some(8));
        let before = b;
        assert!(clear_completed(&mut b, true).is_none());
        assert_eq!(b, before);
    }

    #[test]
    fn test_prediction_does_not_mutate() {
        let mut b = Board::new();
        fill_row(&mut b, 0, Some(8));
        for r in 1..BOARD_SIZE {
            b.set(r, 8, plain(BlockColor::Red));
        }
        let before = b;
        let one = Shape::try_from(vec![vec![1]]).unwrap();
        let p = predict_will_clear(&b, &one, GridPos::new(0, 8));
        assert_eq!(p.rows, vec![0]);
        assert_eq!(p.cols, vec![8]);
        assert_eq!(b, before);

        let miss = predict_will_clear(&b, &one, GridPos::new(4, 4));
        assert!(miss.is_empty());
        assert_eq!(b, before);
    }

    #[test]
    fn test_prediction_ignores_off_board_cells() {
        let b = Board::new();
        let bar = Shape::try_from(vec![vec![1, 1, 1]]).unwrap();
        let p = predict_will_clear(&b, &bar, GridPos::new(-1, 7));
        assert!(p.is_empty());
    }
}
