//! Running score and best score.

/// Points per placed cell.
pub const POINTS_PER_CELL: u32 = 10;
/// Points per completed group, before the colour multiplier.
pub const POINTS_PER_GROUP: u32 = 100;

/// Points for putting down a piece of `cells` cells.
pub const fn placement_points(cells: u32) -> u32 {
    cells * POINTS_PER_CELL
}

/// Bonus for one clear event.
pub const fn clear_bonus(groups: u32, multiplier: u32) -> u32 {
    groups * POINTS_PER_GROUP * multiplier
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreKeeper {
    score: u32,
    high_score: u32,
}

impl ScoreKeeper {
    pub fn new(high_score: u32) -> Self {
        Self {
            score: 0,
            high_score,
        }
    }

    /// Resume at `score`; the best is never lower than the resumed score.
    pub fn resumed(score: u32, high_score: u32) -> Self {
        Self {
            score,
            high_score: high_score.max(score),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Add points. Returns true if this pushed the score past the best.
    pub fn award(&mut self, points: u32) -> bool {
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
            true
        } else {
            false
        }
    }

    /// Score reached the best this game (shown as a record on the game-over screen).
    pub fn is_record(&self) -> bool {
        self.score > 0 && self.score >= self.high_score
    }
}
