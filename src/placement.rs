//! Placement checks and pointer-to-grid snapping.

use crate::board::{BOARD_SIZE, Board};
use crate::shapes::Shape;

/// Top-left anchor of a shape on the board. May lie outside the board while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub row: i32,
    pub col: i32,
}

impl GridPos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// True if every covered cell of `shape` anchored at `pos` is on the board and empty.
pub fn can_place(board: &Board, shape: &Shape, pos: GridPos) -> bool {
    let size = BOARD_SIZE as i32;
    shape.offsets().all(|(dr, dc)| {
        let r = pos.row + dr as i32;
        let c = pos.col + dc as i32;
        (0..size).contains(&r) && (0..size).contains(&c) && !board.is_filled(r as usize, c as usize)
    })
}

/// True if `shape`, as oriented, fits somewhere on the board.
pub fn fits_anywhere(board: &Board, shape: &Shape) -> bool {
    let size = BOARD_SIZE as i32;
    (0..size).any(|r| (0..size).any(|c| can_place(board, shape, GridPos::new(r, c))))
}

/// Screen geometry of the board: origin of cell (0, 0) and cell size in pointer units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_w: f32,
    pub cell_h: f32,
}

impl GridMetrics {
    /// Snap a pointer to the anchor that centres the shape's bounding box under it.
    pub fn snap_to_grid(&self, x: f32, y: f32, shape: &Shape) -> GridPos {
        let shape_w = shape.width() as f32 * self.cell_w;
        let shape_h = shape.height() as f32 * self.cell_h;
        let rx = x - self.origin_x - shape_w / 2.0 + self.cell_w / 2.0;
        let ry = y - self.origin_y - shape_h / 2.0 + self.cell_h / 2.0;
        GridPos::new(
            (ry / self.cell_h).round() as i32,
            (rx / self.cell_w).round() as i32,
        )
    }

    /// Pointer position at the centre of a board cell.
    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        (
            self.origin_x + (col as f32 + 0.5) * self.cell_w,
            self.origin_y + (row as f32 + 0.5) * self.cell_h,
        )
    }
}
