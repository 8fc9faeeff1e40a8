//! Piece footprints: the fixed catalogue and the clockwise rotation transform.

use crate::board::BOARD_SIZE;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Footprints offered in the tray, as 0/1 rows.
const CATALOG: [&[&[u8]]; 24] = [
    &[&[1]],
    &[&[1, 1]],
    &[&[1], &[1]],
    &[&[1, 1, 1]],
    &[&[1], &[1], &[1]],
    &[&[1, 1], &[1, 1]],
    &[&[1, 1, 1], &[0, 1, 0]],
    &[&[0, 1, 0], &[1, 1, 1]],
    &[&[1, 1, 1], &[1, 0, 0]],
    &[&[1, 1, 1], &[0, 0, 1]],
    &[&[1, 1], &[1, 0]],
    &[&[1, 1, 1, 1]],
    &[&[1], &[1], &[1], &[1]],
    &[&[1, 1, 1], &[1, 1, 1]],
    // plus
    &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]],
    // U and inverted U
    &[&[1, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[1, 0, 1]],
    // big L, big J, big T
    &[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[0, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[0, 1, 0], &[0, 1, 0]],
    // diagonal pairs
    &[&[1, 0], &[0, 1]],
    &[&[0, 1], &[1, 0]],
    // Z and S
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[0, 1, 1], &[1, 1, 0]],
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("shape has no rows")]
    Empty,
    #[error("shape rows have different lengths")]
    Ragged,
    #[error("shape has no filled cell")]
    NoCells,
    #[error("invalid cell value {0} (expected 0 or 1)")]
    InvalidCell(u8),
    #[error("shape is {0}x{1}, larger than the board")]
    TooLarge(usize, usize),
}

/// Immutable boolean footprint, `rows x cols`, stored row-major.
///
/// Serializes as nested 0/1 rows (`[[1,1],[1,0]]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Shape {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Shape {
    /// Build from catalogue rows. Rows are assumed rectangular; missing cells read as empty.
    fn from_catalog(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut cells = vec![false; rows.len() * cols];
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate().take(cols) {
                cells[r * cols + c] = v == 1;
            }
        }
        Self {
            rows: rows.len(),
            cols,
            cells,
        }
    }

    /// Number of catalogue entries.
    pub fn catalog_len() -> usize {
        CATALOG.len()
    }

    /// Catalogue entry `index` (wraps around).
    pub fn from_catalog_index(index: usize) -> Self {
        Self::from_catalog(CATALOG[index % CATALOG.len()])
    }

    /// Uniformly random catalogue entry.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_catalog_index(rng.random_range(0..Self::catalog_len()))
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cols
    }

    /// (row, col) offsets of every covered cell, row-major.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(move |(i, _)| (i / cols, i % cols))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// 90° clockwise: `new[c][rows - 1 - r] = old[r][c]`.
    pub fn rotated(&self) -> Self {
        let (rows, cols) = (self.cols, self.rows);
        let mut cells = vec![false; rows * cols];
        for r in 0..self.rows {
            for c in 0..self.cols {
                cells[c * cols + (self.rows - 1 - r)] = self.cells[r * self.cols + c];
            }
        }
        Self { rows, cols, cells }
    }
}

impl TryFrom<Vec<Vec<u8>>> for Shape {
    type Error = ShapeError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        let cols = rows.first().map(Vec::len).ok_or(ShapeError::Empty)?;
        if cols == 0 {
            return Err(ShapeError::Empty);
        }
        if rows.len() > BOARD_SIZE || cols > BOARD_SIZE {
            return Err(ShapeError::TooLarge(rows.len(), cols));
        }
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            if row.len() != cols {
                return Err(ShapeError::Ragged);
            }
            for &v in row {
                match v {
                    0 => cells.push(false),
                    1 => cells.push(true),
                    other => return Err(ShapeError::InvalidCell(other)),
                }
            }
        }
        if !cells.contains(&true) {
            return Err(ShapeError::NoCells);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }
}

impl From<Shape> for Vec<Vec<u8>> {
    fn from(shape: Shape) -> Self {
        shape
            .cells
            .chunks(shape.cols)
            .map(|row| row.iter().map(|&f| u8::from(f)).collect())
            .collect()
    }
}
