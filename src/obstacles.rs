//! Bombs, ice and rocks, spawned on a fixed cadence of successful placements.

use crate::board::{Board, Cell};
use rand::Rng;

/// A bomb is armed every this many placements (bomb mode).
pub const BOMB_INTERVAL: u32 = 5;
/// Ice is laid every this many placements.
pub const ICE_INTERVAL: u32 = 15;
/// A rock drops every this many placements.
pub const ROCK_INTERVAL: u32 = 30;
/// Countdown a freshly armed bomb starts with.
pub const BOMB_FUSE: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    Bomb,
    Ice,
    Rock,
}

/// An obstacle that appeared at (row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub kind: Obstacle,
    pub row: usize,
    pub col: usize,
}

/// Decrement every armed bomb by one. Returns the first bomb (row-major) that reached zero.
pub fn tick_bombs(board: &mut Board) -> Option<(usize, usize)> {
    let armed: Vec<(usize, usize)> = board
        .filled_cells()
        .filter(|(_, _, cell)| cell.bomb.is_some())
        .map(|(r, c, _)| (r, c))
        .collect();
    let mut exploded = None;
    for (r, c) in armed {
        if let Some(cell) = board.get_mut(r, c) {
            let left = cell.bomb.map_or(0, |n| n - 1);
            cell.bomb = Some(left);
            if left <= 0 && exploded.is_none() {
                exploded = Some((r, c));
            }
        }
    }
    exploded
}

/// Spawn whatever is due at placement number `moves`.
pub fn spawn_due<R: Rng + ?Sized>(
    board: &mut Board,
    moves: u32,
    bombs_enabled: bool,
    rng: &mut R,
) -> Vec<Spawned> {
    let mut out = Vec::new();
    if moves == 0 {
        return out;
    }
    if bombs_enabled && moves % BOMB_INTERVAL == 0 {
        out.extend(arm_bomb(board, rng));
    }
    if moves % ICE_INTERVAL == 0 {
        out.extend(lay_ice(board, rng));
    }
    if moves % ROCK_INTERVAL == 0 {
        out.extend(drop_rock(board, rng));
    }
    out
}

fn pick<R: Rng + ?Sized>(candidates: &[(usize, usize)], rng: &mut R) -> Option<(usize, usize)> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

fn obstacle_free(board: &Board) -> Vec<(usize, usize)> {
    board
        .filled_cells()
        .filter(|(_, _, cell)| cell.is_obstacle_free())
        .map(|(r, c, _)| (r, c))
        .collect()
}

fn arm_bomb<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Spawned> {
    let (row, col) = pick(&obstacle_free(board), rng)?;
    board.get_mut(row, col)?.bomb = Some(BOMB_FUSE);
    Some(Spawned {
        kind: Obstacle::Bomb,
        row,
        col,
    })
}

fn lay_ice<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Spawned> {
    let (row, col) = pick(&obstacle_free(board), rng)?;
    board.get_mut(row, col)?.ice = true;
    Some(Spawned {
        kind: Obstacle::Ice,
        row,
        col,
    })
}

fn drop_rock<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Spawned> {
    let empty: Vec<_> = board.empty_cells().collect();
    let (row, col) = pick(&empty, rng)?;
    board.set(row, col, Some(Cell::rock()));
    Some(Spawned {
        kind: Obstacle::Rock,
        row,
        col,
    })
}
