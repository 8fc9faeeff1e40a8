//! The 9x9 board: cells, colours, and the placement write.

use crate::placement::{GridPos, can_place};
use crate::shapes::Shape;
use serde::{Deserialize, Serialize};

/// Board side length; the grid is always `BOARD_SIZE x BOARD_SIZE`.
pub const BOARD_SIZE: usize = 9;

/// Block colours. Serialized as hex strings to keep the saved JSON readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockColor {
    #[serde(rename = "#00f3ff")]
    Cyan,
    #[serde(rename = "#3b82f6")]
    Blue,
    #[serde(rename = "#ef4444")]
    Red,
    #[serde(rename = "#ffe600")]
    Yellow,
    #[serde(rename = "#555566")]
    Rock,
}

impl BlockColor {
    /// Colour-mode palette (cyan, blue, red, yellow).
    pub const PALETTE: [Self; 4] = [Self::Cyan, Self::Blue, Self::Red, Self::Yellow];
}

/// Occupied cell. `bomb` holds the countdown while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub color: BlockColor,
    #[serde(default)]
    pub bomb: Option<i32>,
    #[serde(default)]
    pub ice: bool,
    #[serde(default)]
    pub rock: bool,
}

impl Cell {
    pub const fn plain(color: BlockColor) -> Self {
        Self {
            color,
            bomb: None,
            ice: false,
            rock: false,
        }
    }

    pub const fn rock() -> Self {
        Self {
            color: BlockColor::Rock,
            bomb: None,
            ice: false,
            rock: true,
        }
    }

    /// No bomb, ice or rock marker.
    pub const fn is_obstacle_free(&self) -> bool {
        self.bomb.is_none() && !self.ice && !self.rock
    }
}

/// Grid of optional cells, `rows[r][c]`. Serializes as `Cell[9][9]` with `null` for empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: [[Option<Cell>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .and_then(Option::as_mut)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Option<Cell>) {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            self.rows[row][col] = cell;
        }
    }

    #[inline]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// (row, col, cell) for every occupied position, row-major.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        positions()
            .filter_map(|(r, c)| self.get(r, c).map(|cell| (r, c, cell)))
    }

    /// (row, col) for every empty position, row-major.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        positions().filter(|&(r, c)| !self.is_filled(r, c))
    }

    pub fn filled_count(&self) -> usize {
        self.filled_cells().count()
    }

    /// Number of armed bombs.
    pub fn bomb_count(&self) -> usize {
        self.filled_cells().filter(|(_, _, c)| c.bomb.is_some()).count()
    }

    /// Write `shape` at `pos` in `color`. Returns the number of cells written, or `None` (and
    /// leaves the board untouched) when the placement is not legal.
    pub fn place(&mut self, shape: &Shape, color: BlockColor, pos: GridPos) -> Option<u32> {
        if !can_place(self, shape, pos) {
            return None;
        }
        for (dr, dc) in shape.offsets() {
            let (r, c) = (pos.row as usize + dr, pos.col as usize + dc);
            self.rows[r][c] = Some(Cell::plain(color));
        }
        Some(shape.cell_count() as u32)
    }
}

fn positions() -> impl Iterator<Item = (usize, usize)> {
    (0..BOARD_SIZE).flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
}
