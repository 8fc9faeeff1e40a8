//! Key bindings and the drag lifecycle: pick up from the tray, follow the pointer, drop or put back.

use crate::clear::{Completion, predict_will_clear};
use crate::game::{Game, GameSession, HAND_SIZE, MoveReport};
use crate::placement::{GridMetrics, GridPos, can_place};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Position, Rect};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Enter / Space: drop the held piece, or choose a menu entry.
    Select,
    /// Esc: put the held piece back, or leave a menu.
    Back,
    /// Pick up tray slot 0..3.
    Pick(usize),
    Rotate,
    /// Open the quit menu.
    Menu,
    None,
}

/// Map key event to action. Arrows and vim keys both move.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') => Action::Menu,
        KeyCode::Esc => Action::Back,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('r') => Action::Rotate,
        KeyCode::Char(c @ '1'..='3') => Action::Pick(c as usize - '1' as usize),
        _ => Action::None,
    }
}

/// Screen areas of the three tray slots, for hit testing presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrayMetrics {
    pub slots: [Rect; HAND_SIZE],
}

impl TrayMetrics {
    pub fn slot_at(&self, column: u16, row: u16) -> Option<usize> {
        let p = Position::new(column, row);
        self.slots.iter().position(|r| r.contains(p))
    }
}

/// A piece following the pointer. `pointer` is in terminal cells, centre of the hovered cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub slot: usize,
    pub pointer: (f32, f32),
}

/// Where the held piece would land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghost {
    pub pos: GridPos,
    pub valid: bool,
    /// Groups the drop would complete; empty when invalid.
    pub prediction: Completion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Nothing was held.
    Idle,
    /// Invalid drop; the piece is back in its slot.
    Returned,
    Placed(MoveReport),
}

/// Single active drag.
#[derive(Debug, Default)]
pub struct DragController {
    drag: Option<Drag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Drag> {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer press. Picks up the slot under it if that slot holds a piece.
    pub fn press(&mut self, session: &GameSession, tray: &TrayMetrics, column: u16, row: u16) -> bool {
        if self.drag.is_some() || session.is_over() {
            return false;
        }
        let Some(slot) = tray.slot_at(column, row) else {
            return false;
        };
        if session.hand[slot].is_none() {
            return false;
        }
        self.drag = Some(Drag {
            slot,
            pointer: pointer_at(column, row),
        });
        true
    }

    /// Keyboard pick-up: the pointer starts over the board centre.
    pub fn pick(&mut self, session: &GameSession, metrics: &GridMetrics, slot: usize) -> bool {
        if self.drag.is_some() || session.is_over() {
            return false;
        }
        if !session.hand.get(slot).is_some_and(Option::is_some) {
            return false;
        }
        let mid = crate::board::BOARD_SIZE / 2;
        self.drag = Some(Drag {
            slot,
            pointer: metrics.cell_center(mid, mid),
        });
        true
    }

    pub fn motion(&mut self, column: u16, row: u16) {
        if let Some(drag) = &mut self.drag {
            drag.pointer = pointer_at(column, row);
        }
    }

    /// Keyboard move by whole board cells.
    pub fn nudge(&mut self, metrics: &GridMetrics, d_row: i32, d_col: i32) {
        if let Some(drag) = &mut self.drag {
            drag.pointer.0 += d_col as f32 * metrics.cell_w;
            drag.pointer.1 += d_row as f32 * metrics.cell_h;
        }
    }

    /// Ghost for the current pointer. Never touches the board.
    pub fn ghost(&self, metrics: &GridMetrics, session: &GameSession) -> Option<Ghost> {
        let drag = self.drag?;
        let item = session.hand.get(drag.slot)?.as_ref()?;
        let pos = anchor(metrics, drag.pointer, &item.shape);
        let valid = can_place(&session.board, &item.shape, pos);
        let prediction = if valid {
            predict_will_clear(&session.board, &item.shape, pos)
        } else {
            Completion::default()
        };
        Some(Ghost {
            pos,
            valid,
            prediction,
        })
    }

    /// Drop the held piece. A valid drop runs the whole placement pipeline.
    pub fn release(&mut self, metrics: &GridMetrics, game: &mut Game) -> Release {
        let Some(drag) = self.drag.take() else {
            return Release::Idle;
        };
        let Some(item) = game.session.hand.get(drag.slot).and_then(Option::as_ref) else {
            return Release::Returned;
        };
        let pos = anchor(metrics, drag.pointer, &item.shape);
        match game.commit(drag.slot, pos) {
            Ok(report) => Release::Placed(report),
            Err(rejection) => {
                tracing::debug!(?rejection, row = pos.row, col = pos.col, "drop rejected");
                Release::Returned
            }
        }
    }

    /// Put the piece back. Same as an invalid release.
    pub fn cancel(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

fn pointer_at(column: u16, row: u16) -> (f32, f32) {
    (column as f32 + 0.5, row as f32 + 0.5)
}

/// The piece is held by its top-left cell's centre, so shift the pointer by half a cell before
/// snapping.
fn anchor(metrics: &GridMetrics, pointer: (f32, f32), shape: &crate::shapes::Shape) -> GridPos {
    metrics.snap_to_grid(
        pointer.0 - metrics.cell_w / 2.0,
        pointer.1 - metrics.cell_h / 2.0,
        shape,
    )
}
