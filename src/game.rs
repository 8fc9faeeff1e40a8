//! Game state and rules: the session aggregate, mode rules, the placement pipeline, and the
//! controller that ties it to persistence.

use crate::GameMode;
use crate::board::{BOARD_SIZE, BlockColor, Board};
use crate::clear::{self, ClearReport};
use crate::obstacles::{self, Obstacle, Spawned};
use crate::placement::{GridPos, fits_anywhere};
use crate::score::{self, ScoreKeeper};
use crate::session::{self, SavedSession};
use crate::shapes::Shape;
use crate::storage::{self, Store};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Tray slots.
pub const HAND_SIZE: usize = 3;
/// Time mode countdown, seconds.
pub const TIME_LIMIT_SECS: u32 = 120;
/// Seconds given back per cleared group in time mode.
pub const TIME_BONUS_PER_GROUP: u32 = 5;
/// At or below this many seconds each tick sounds the low-time cue.
pub const LOW_TIME_SECS: u32 = 10;

/// A piece waiting in the tray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandItem {
    pub shape: Shape,
    pub color: BlockColor,
}

pub type Hand = [Option<HandItem>; HAND_SIZE];

impl GameMode {
    pub fn has_timer(self) -> bool {
        self == Self::Time
    }

    pub fn spawns_bombs(self) -> bool {
        self == Self::Bomb
    }

    /// Random palette colours for pieces and the monochrome bonus.
    pub fn is_color(self) -> bool {
        self == Self::Color
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Time => "Time",
            Self::Bomb => "Bomb",
            Self::Color => "Color",
        }
    }

    fn piece_color<R: Rng + ?Sized>(self, rng: &mut R) -> BlockColor {
        if self.is_color() {
            BlockColor::PALETTE[rng.random_range(0..BlockColor::PALETTE.len())]
        } else {
            BlockColor::Cyan
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    NoMoves,
    TimeUp,
    BombExploded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    Over(GameOverReason),
}

/// Cues for the sound collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Pickup,
    Place,
    /// Groups cleared in one event.
    Clear(u32),
    GameOver,
    LowTime,
    IceCrack,
    Rotate,
    BombArmed,
}

/// Colour hint for visual effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Block(BlockColor),
    Ice,
    Bonus,
    Time,
    Match,
}

/// Cues for the visual-effects collaborator. Positions are board (row, col).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FxCue {
    Burst {
        row: usize,
        col: usize,
        tint: Tint,
        count: u32,
    },
    Text {
        row: usize,
        col: usize,
        text: String,
        tint: Tint,
    },
    /// Cells swept by a clear.
    Flash(Vec<(usize, usize)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Sound(SoundCue),
    Fx(FxCue),
}

/// Why a release did not place anything. The piece goes back to its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotPlaying,
    EmptySlot,
    Blocked,
}

/// What one successful placement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub cells_placed: u32,
    pub clear: Option<ClearReport>,
    pub spawned: Vec<Spawned>,
    /// Points for the move (placement + clear bonus).
    pub points: u32,
    pub new_high_score: bool,
    pub refilled: bool,
    pub game_over: Option<GameOverReason>,
}

/// Everything that changes during play.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub board: Board,
    pub hand: Hand,
    pub score: ScoreKeeper,
    /// Successful placements so far.
    pub moves: u32,
    pub mode: GameMode,
    /// Seconds left; only counts down in time mode.
    pub time_left: u32,
    pub status: Status,
}

impl GameSession {
    /// Fresh board with a dealt hand.
    pub fn new<R: Rng + ?Sized>(mode: GameMode, high_score: u32, rng: &mut R) -> Self {
        let mut s = Self {
            board: Board::new(),
            hand: [None, None, None],
            score: ScoreKeeper::new(high_score),
            moves: 0,
            mode,
            time_left: TIME_LIMIT_SECS,
            status: Status::Playing,
        };
        s.deal_hand(rng);
        s
    }

    pub fn restore(saved: SavedSession, high_score: u32) -> Self {
        Self {
            board: saved.grid,
            time_left: saved.resume_time(),
            hand: saved.hand,
            score: ScoreKeeper::resumed(saved.score, high_score),
            moves: saved.moves,
            mode: saved.mode,
            status: Status::Playing,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, Status::Over(_))
    }

    pub fn hand_is_empty(&self) -> bool {
        self.hand.iter().all(Option::is_none)
    }

    /// Fill all three slots.
    pub fn deal_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for slot in &mut self.hand {
            let shape = Shape::random(rng);
            let color = self.mode.piece_color(rng);
            *slot = Some(HandItem { shape, color });
        }
    }

    /// Rotate every piece in the tray a quarter turn clockwise.
    pub fn rotate_hand(&mut self) {
        for item in self.hand.iter_mut().flatten() {
            item.shape = item.shape.rotated();
        }
    }

    /// Some piece in the tray fits as it is oriented now. An empty tray counts as movable.
    pub fn has_legal_move(&self) -> bool {
        if self.hand_is_empty() {
            return true;
        }
        self.hand
            .iter()
            .flatten()
            .any(|item| fits_anywhere(&self.board, &item.shape))
    }

    /// Place → clear → obstacles → score. Refill, persistence and the no-move check are the
    /// controller's job.
    pub fn place<R: Rng + ?Sized>(
        &mut self,
        slot: usize,
        pos: GridPos,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<MoveReport, Rejection> {
        if self.is_over() {
            return Err(Rejection::NotPlaying);
        }
        let item = self
            .hand
            .get(slot)
            .cloned()
            .flatten()
            .ok_or(Rejection::EmptySlot)?;
        let cells_placed = self
            .board
            .place(&item.shape, item.color, pos)
            .ok_or(Rejection::Blocked)?;
        self.hand[slot] = None;
        self.moves += 1;

        events.push(GameEvent::Sound(SoundCue::Place));
        for (dr, dc) in item.shape.offsets() {
            events.push(GameEvent::Fx(FxCue::Burst {
                row: pos.row as usize + dr,
                col: pos.col as usize + dc,
                tint: Tint::Block(item.color),
                count: 3,
            }));
        }

        let clear = clear::clear_completed(&mut self.board, self.mode.is_color());
        if let Some(report) = &clear {
            self.announce_clear(report, events);
        }

        let mut game_over = None;
        let mut spawned = Vec::new();
        if self.mode.spawns_bombs() && obstacles::tick_bombs(&mut self.board).is_some() {
            game_over = Some(GameOverReason::BombExploded);
        } else {
            spawned = obstacles::spawn_due(&mut self.board, self.moves, self.mode.spawns_bombs(), rng);
            announce_spawns(&spawned, events);
        }

        let mut points = score::placement_points(cells_placed);
        if let Some(report) = &clear {
            points += score::clear_bonus(report.group_count(), report.multiplier);
            if self.mode.has_timer() {
                self.time_left += TIME_BONUS_PER_GROUP * report.group_count();
            }
        }
        let new_high_score = self.score.award(points);

        if let Some(reason) = game_over {
            self.end(reason, events);
        }

        Ok(MoveReport {
            cells_placed,
            clear,
            spawned,
            points,
            new_high_score,
            refilled: false,
            game_over,
        })
    }

    /// One second of the countdown. Returns the reason if this tick ended the game.
    pub fn tick_second(&mut self, events: &mut Vec<GameEvent>) -> Option<GameOverReason> {
        if self.is_over() || !self.mode.has_timer() {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left <= LOW_TIME_SECS {
            events.push(GameEvent::Sound(SoundCue::LowTime));
        }
        if self.time_left == 0 {
            self.end(GameOverReason::TimeUp, events);
            return Some(GameOverReason::TimeUp);
        }
        None
    }

    fn end(&mut self, reason: GameOverReason, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }
        self.status = Status::Over(reason);
        events.push(GameEvent::Sound(SoundCue::GameOver));
    }

    fn announce_clear(&self, report: &ClearReport, events: &mut Vec<GameEvent>) {
        let groups = report.group_count();
        events.push(GameEvent::Sound(SoundCue::Clear(groups)));
        let mut swept: Vec<(usize, usize)> =
            report.destroyed.iter().map(|&(r, c, _)| (r, c)).collect();
        swept.extend(report.cracked.iter().copied());
        events.push(GameEvent::Fx(FxCue::Flash(swept)));
        for &(row, col, color) in &report.destroyed {
            events.push(GameEvent::Fx(FxCue::Burst {
                row,
                col,
                tint: Tint::Block(color),
                count: 5,
            }));
        }
        for &(row, col) in &report.cracked {
            events.push(GameEvent::Sound(SoundCue::IceCrack));
            events.push(GameEvent::Fx(FxCue::Burst {
                row,
                col,
                tint: Tint::Ice,
                count: 5,
            }));
        }

        let mid = BOARD_SIZE / 2;
        events.push(GameEvent::Fx(FxCue::Text {
            row: mid,
            col: mid,
            text: format!("+{}", score::clear_bonus(groups, report.multiplier)),
            tint: Tint::Bonus,
        }));
        if report.multiplier > 1 {
            events.push(GameEvent::Fx(FxCue::Text {
                row: mid - 1,
                col: mid,
                text: "Color match!".to_string(),
                tint: Tint::Match,
            }));
        }
        if self.mode.has_timer() {
            events.push(GameEvent::Fx(FxCue::Text {
                row: 0,
                col: mid,
                text: format!("+{}s", TIME_BONUS_PER_GROUP * groups),
                tint: Tint::Time,
            }));
        }
    }
}

fn announce_spawns(spawned: &[Spawned], events: &mut Vec<GameEvent>) {
    for s in spawned {
        match s.kind {
            Obstacle::Bomb => events.push(GameEvent::Sound(SoundCue::BombArmed)),
            Obstacle::Ice => events.push(GameEvent::Fx(FxCue::Burst {
                row: s.row,
                col: s.col,
                tint: Tint::Ice,
                count: 3,
            })),
            Obstacle::Rock => events.push(GameEvent::Fx(FxCue::Burst {
                row: s.row,
                col: s.col,
                tint: Tint::Block(BlockColor::Rock),
                count: 5,
            })),
        }
    }
}

/// Owns the session and its collaborators: storage, randomness, and the outgoing event queue.
pub struct Game {
    pub session: GameSession,
    store: Box<dyn Store>,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl Game {
    /// Idle controller holding an unsaved classic session (shown behind the menu).
    pub fn new(store: Box<dyn Store>, mut rng: StdRng) -> Self {
        let high_score = storage::load_high_score(store.as_ref());
        let session = GameSession::new(GameMode::Classic, high_score, &mut rng);
        Self {
            session,
            store,
            rng,
            events: Vec::new(),
        }
    }

    pub fn has_saved_session(&self) -> bool {
        session::exists(self.store.as_ref())
    }

    pub fn high_score(&self) -> u32 {
        self.session.score.high_score()
    }

    /// Begin a fresh game in `mode` and save it.
    pub fn start(&mut self, mode: GameMode) {
        let high_score = storage::load_high_score(self.store.as_ref()).max(self.high_score());
        self.session = GameSession::new(mode, high_score, &mut self.rng);
        self.events.clear();
        tracing::info!(mode = mode.label(), high_score, "new game");
        self.persist();
    }

    /// Load the saved game. False (and nothing changes) if there is none.
    pub fn resume(&mut self) -> bool {
        let Some(saved) = session::load(self.store.as_ref()) else {
            return false;
        };
        let high_score = storage::load_high_score(self.store.as_ref()).max(self.high_score());
        self.session = GameSession::restore(saved, high_score);
        self.events.clear();
        if self.session.hand_is_empty() {
            self.session.deal_hand(&mut self.rng);
            self.persist();
        }
        tracing::info!(
            mode = self.session.mode.label(),
            score = self.session.score.score(),
            time_left = self.session.time_left,
            "resumed saved game"
        );
        // a restored hand may already be stuck
        self.check_no_moves();
        true
    }

    pub fn rotate_hand(&mut self) {
        if self.session.is_over() {
            return;
        }
        self.session.rotate_hand();
        self.events.push(GameEvent::Sound(SoundCue::Rotate));
    }

    /// Commit the piece in `slot` at `pos`: the full pipeline through persistence and the
    /// game-over check.
    pub fn commit(&mut self, slot: usize, pos: GridPos) -> Result<MoveReport, Rejection> {
        let mut report = self
            .session
            .place(slot, pos, &mut self.rng, &mut self.events)?;
        tracing::debug!(
            slot,
            row = pos.row,
            col = pos.col,
            cells = report.cells_placed,
            groups = report.clear.as_ref().map_or(0, ClearReport::group_count),
            points = report.points,
            filled = self.session.board.filled_count(),
            "placed"
        );
        if report.new_high_score {
            self.store_high_score();
        }
        if let Some(reason) = report.game_over {
            self.finish(reason);
            return Ok(report);
        }

        self.persist();
        if self.session.hand_is_empty() {
            self.session.deal_hand(&mut self.rng);
            report.refilled = true;
            self.persist();
        }
        report.game_over = self.check_no_moves();
        Ok(report)
    }

    /// One second of the countdown.
    pub fn tick_second(&mut self) -> Option<GameOverReason> {
        let reason = self.session.tick_second(&mut self.events)?;
        self.finish(reason);
        Some(reason)
    }

    /// Queued cues since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    fn check_no_moves(&mut self) -> Option<GameOverReason> {
        if self.session.is_over() || self.session.has_legal_move() {
            return None;
        }
        self.session.end(GameOverReason::NoMoves, &mut self.events);
        self.finish(GameOverReason::NoMoves);
        Some(GameOverReason::NoMoves)
    }

    /// Terminal bookkeeping: drop the save slot and settle the best score.
    fn finish(&mut self, reason: GameOverReason) {
        tracing::info!(
            ?reason,
            score = self.session.score.score(),
            moves = self.session.moves,
            "game over"
        );
        if let Err(e) = session::clear(self.store.as_mut()) {
            tracing::warn!(error = %e, "could not clear saved session");
        }
        self.store_high_score();
    }

    fn persist(&mut self) {
        if let Err(e) = session::save(self.store.as_mut(), &self.session) {
            tracing::warn!(error = %e, "could not save session");
        }
    }

    fn store_high_score(&mut self) {
        if let Err(e) = storage::save_high_score(self.store.as_mut(), self.session.score.high_score())
        {
            tracing::warn!(error = %e, "could not save high score");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::session::SESSION_KEY;
    use crate::storage::{HIGH_SCORE_KEY, MemoryStore};
    use rand::SeedableRng;

    fn shape(rows: Vec<Vec<u8>>) -> Shape {
        Shape::try_from(rows).unwrap()
    }

    fn mono() -> HandItem {
        HandItem {
            shape: shape(vec![vec![1]]),
            color: BlockColor::Cyan,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn game(mode: GameMode) -> Game {
        let mut g = Game::new(Box::new(MemoryStore::new()), rng());
        g.start(mode);
        g
    }

    /// Session with three 1x1 pieces on an empty board.
    fn monos(mode: GameMode) -> GameSession {
        let mut s = GameSession::new(mode, 0, &mut rng());
        s.hand = [Some(mono()), Some(mono()), Some(mono())];
        s
    }

    #[test]
    fn test_single_cell_scenario() {
        let mut s = monos(GameMode::Classic);
        let mut events = Vec::new();
        let report = s
            .place(0, GridPos::new(4, 4), &mut rng(), &mut events)
            .unwrap();
        assert!(s.board.is_filled(4, 4));
        assert_eq!(s.score.score(), 10);
        assert_eq!(report.points, 10);
        assert!(report.clear.is_none());
        assert_eq!(s.moves, 1);
        assert!(s.hand[0].is_none());
        assert!(events.contains(&GameEvent::Sound(SoundCue::Place)));
    }

    #[test]
    fn test_row_completion_scenario() {
        let mut s = monos(GameMode::Classic);
        for c in 0..8 {
            s.board.set(0, c, Some(Cell::plain(BlockColor::Cyan)));
        }
        let report = s
            .place(1, GridPos::new(0, 8), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.points, 110);
        assert_eq!(s.score.score(), 110);
        assert_eq!(s.board.filled_count(), 0);
    }

    #[test]
    fn test_rejected_place_changes_nothing() {
        let mut s = monos(GameMode::Classic);
        s.board.set(4, 4, Some(Cell::rock()));
        let before_board = s.board;
        let mut events = Vec::new();
        assert_eq!(
            s.place(0, GridPos::new(4, 4), &mut rng(), &mut events),
            Err(Rejection::Blocked)
        );
        assert_eq!(
            s.place(0, GridPos::new(9, 0), &mut rng(), &mut events),
            Err(Rejection::Blocked)
        );
        s.hand[2] = None;
        assert_eq!(
            s.place(2, GridPos::new(0, 0), &mut rng(), &mut events),
            Err(Rejection::EmptySlot)
        );
        assert_eq!(
            s.place(7, GridPos::new(0, 0), &mut rng(), &mut events),
            Err(Rejection::EmptySlot)
        );
        assert_eq!(s.board, before_board);
        assert_eq!(s.moves, 0);
        assert_eq!(s.score.score(), 0);
        assert!(s.hand[0].is_some());
        assert!(events.is_empty());
    }

    #[test]
    fn test_placement_points_ignore_clears() {
        let mut s = monos(GameMode::Classic);
        s.hand[0] = Some(HandItem {
            shape: shape(vec![vec![0, 1, 0], vec![1, 1, 1], vec![0, 1, 0]]),
            color: BlockColor::Cyan,
        });
        let report = s
            .place(0, GridPos::new(2, 2), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.cells_placed, 5);
        assert_eq!(report.points, 50);
    }

    #[test]
    fn test_color_mode_multiplier() {
        let mut s = monos(GameMode::Color);
        for c in 0..8 {
            s.board.set(0, c, Some(Cell::plain(BlockColor::Cyan)));
        }
        // column 8 all red except the top cell
        for r in 1..9 {
            s.board.set(r, 8, Some(Cell::plain(BlockColor::Red)));
        }
        let mut events = Vec::new();
        let report = s
            .place(0, GridPos::new(0, 8), &mut rng(), &mut events)
            .unwrap();
        let clear = report.clear.unwrap();
        // row 0 all cyan -> monochrome; column 8 has one cyan -> not
        assert_eq!(clear.group_count(), 2);
        assert_eq!(clear.multiplier, 3);
        assert_eq!(report.points, 10 + 2 * 100 * 3);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Fx(FxCue::Text { tint: Tint::Match, .. })
        )));
    }

    #[test]
    fn test_time_mode_clear_adds_seconds() {
        let mut s = monos(GameMode::Time);
        s.time_left = 30;
        for c in 0..8 {
            s.board.set(3, c, Some(Cell::plain(BlockColor::Cyan)));
        }
        s.place(0, GridPos::new(3, 8), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(s.time_left, 35);
    }

    #[test]
    fn test_bomb_detonates_on_ninth_placement() {
        let mut s = monos(GameMode::Bomb);
        let mut bomb = Cell::plain(BlockColor::Red);
        bomb.bomb = Some(obstacles::BOMB_FUSE);
        s.board.set(8, 8, Some(bomb));
        let mut events = Vec::new();
        let mut spots = (0..8).map(|c| GridPos::new(0, c as i32));
        for n in 1..=9 {
            s.hand = [Some(mono()), Some(mono()), Some(mono())];
            let report = s
                .place(0, spots.next().unwrap_or(GridPos::new(2, 2)), &mut rng(), &mut events)
                .unwrap();
            if n < 9 {
                assert_eq!(report.game_over, None, "placement {}", n);
            } else {
                assert_eq!(report.game_over, Some(GameOverReason::BombExploded));
            }
        }
        assert_eq!(s.status, Status::Over(GameOverReason::BombExploded));
        assert!(events.contains(&GameEvent::Sound(SoundCue::GameOver)));
    }

    #[test]
    fn test_bombs_ignored_outside_bomb_mode() {
        let mut s = monos(GameMode::Classic);
        let mut bomb = Cell::plain(BlockColor::Red);
        bomb.bomb = Some(1);
        s.board.set(8, 8, Some(bomb));
        let report = s
            .place(0, GridPos::new(0, 0), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.game_over, None);
        assert_eq!(s.board.get(8, 8).unwrap().bomb, Some(1));
    }

    #[test]
    fn test_cleared_bomb_is_defused() {
        let mut s = monos(GameMode::Bomb);
        for c in 0..8 {
            s.board.set(6, c, Some(Cell::plain(BlockColor::Cyan)));
        }
        s.board.get_mut(6, 0).unwrap().bomb = Some(1);
        s.moves = 1;
        let report = s
            .place(0, GridPos::new(6, 8), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.game_over, None);
        assert_eq!(s.board.bomb_count(), 0);
    }

    #[test]
    fn test_rotate_hand_rotates_every_piece() {
        let mut s = monos(GameMode::Classic);
        let bar = shape(vec![vec![1, 1, 1]]);
        s.hand = [
            Some(HandItem {
                shape: bar.clone(),
                color: BlockColor::Cyan,
            }),
            None,
            Some(HandItem {
                shape: bar.clone(),
                color: BlockColor::Blue,
            }),
        ];
        s.rotate_hand();
        let upright = bar.rotated();
        assert_eq!(s.hand[0].as_ref().unwrap().shape, upright);
        assert!(s.hand[1].is_none());
        assert_eq!(s.hand[2].as_ref().unwrap().shape, upright);
    }

    #[test]
    fn test_has_legal_move() {
        let mut s = monos(GameMode::Classic);
        for r in 0..9 {
            for c in 0..9 {
                if (r, c) != (0, 0) {
                    s.board.set(r, c, Some(Cell::rock()));
                }
            }
        }
        assert!(s.has_legal_move());
        let bar = HandItem {
            shape: shape(vec![vec![1, 1]]),
            color: BlockColor::Cyan,
        };
        s.hand = [Some(bar.clone()), None, Some(bar)];
        assert!(!s.has_legal_move());
        s.hand = [None, None, None];
        assert!(s.has_legal_move());
    }

    #[test]
    fn test_timer_runs_out() {
        let mut s = monos(GameMode::Time);
        s.time_left = 2;
        let mut events = Vec::new();
        assert_eq!(s.tick_second(&mut events), None);
        assert!(events.contains(&GameEvent::Sound(SoundCue::LowTime)));
        assert_eq!(s.tick_second(&mut events), Some(GameOverReason::TimeUp));
        assert_eq!(s.status, Status::Over(GameOverReason::TimeUp));
        assert_eq!(s.tick_second(&mut events), None);
    }

    #[test]
    fn test_timer_idle_outside_time_mode() {
        let mut s = monos(GameMode::Bomb);
        assert_eq!(s.tick_second(&mut Vec::new()), None);
        assert_eq!(s.time_left, TIME_LIMIT_SECS);
    }

    #[test]
    fn test_ice_spawns_on_fifteenth_placement() {
        let mut s = monos(GameMode::Classic);
        s.moves = 14;
        s.board.set(8, 0, Some(Cell::plain(BlockColor::Blue)));
        let report = s
            .place(0, GridPos::new(0, 0), &mut rng(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.spawned.len(), 1);
        assert_eq!(report.spawned[0].kind, Obstacle::Ice);
        let iced = s.board.filled_cells().filter(|(_, _, c)| c.ice).count();
        assert_eq!(iced, 1);
    }

    #[test]
    fn test_game_start_saves_and_loads_high_score() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "500").unwrap();
        let mut g = Game::new(Box::new(store), rng());
        assert!(!g.has_saved_session());
        g.start(GameMode::Classic);
        assert!(g.has_saved_session());
        assert_eq!(g.high_score(), 500);
    }

    #[test]
    fn test_commit_refills_only_when_tray_empty() {
        let mut g = game(GameMode::Classic);
        g.session.hand = [Some(mono()), Some(mono()), None];
        let r = g.commit(0, GridPos::new(0, 0)).unwrap();
        assert!(!r.refilled);
        assert!(g.session.hand[0].is_none());
        assert!(g.session.hand[1].is_some());
        assert!(g.session.hand[2].is_none());
        let r = g.commit(1, GridPos::new(8, 8)).unwrap();
        assert!(r.refilled);
        assert!(g.session.hand.iter().all(Option::is_some));
    }

    #[test]
    fn test_commit_persists_each_move() {
        let mut g = game(GameMode::Classic);
        g.session.hand = [Some(mono()), Some(mono()), Some(mono())];
        g.commit(2, GridPos::new(5, 5)).unwrap();
        let saved = session::load(g.store.as_ref()).unwrap();
        assert!(saved.grid.is_filled(5, 5));
        assert_eq!(saved.score, 10);
        assert!(saved.hand[2].is_none());
        assert_eq!(saved.moves, 1);
    }

    #[test]
    fn test_rejected_commit_does_not_save() {
        let mut g = game(GameMode::Classic);
        g.session.hand = [Some(mono()), Some(mono()), Some(mono())];
        g.commit(0, GridPos::new(1, 1)).unwrap();
        let saved_before = g.store.get(SESSION_KEY).unwrap();
        let err = g.commit(1, GridPos::new(1, 1)).unwrap_err();
        assert_eq!(err, Rejection::Blocked);
        assert_eq!(g.store.get(SESSION_KEY).unwrap(), saved_before);
        assert_eq!(g.session.moves, 1);
    }

    #[test]
    fn test_no_moves_ends_game_and_clears_slot() {
        let mut g = game(GameMode::Classic);
        for r in 0..9 {
            for c in 0..9 {
                if (r + c) % 2 == 1 {
                    g.session.board.set(r, c, Some(Cell::rock()));
                }
            }
        }
        let bar = HandItem {
            shape: shape(vec![vec![1, 1]]),
            color: BlockColor::Cyan,
        };
        g.session.hand = [Some(mono()), Some(bar), None];
        let r = g.commit(0, GridPos::new(0, 0)).unwrap();
        assert_eq!(r.game_over, Some(GameOverReason::NoMoves));
        assert_eq!(g.session.status, Status::Over(GameOverReason::NoMoves));
        assert!(!g.has_saved_session());
        let sounds: Vec<_> = g
            .drain_events()
            .filter(|e| *e == GameEvent::Sound(SoundCue::GameOver))
            .collect();
        assert_eq!(sounds.len(), 1);
        assert_eq!(
            g.commit(1, GridPos::new(2, 2)),
            Err(Rejection::NotPlaying)
        );
    }

    #[test]
    fn test_high_score_written_when_beaten() {
        let mut g = game(GameMode::Classic);
        g.session.hand = [Some(mono()), Some(mono()), Some(mono())];
        g.commit(0, GridPos::new(0, 0)).unwrap();
        assert_eq!(storage::load_high_score(g.store.as_ref()), 10);
        g.commit(1, GridPos::new(0, 1)).unwrap();
        assert_eq!(storage::load_high_score(g.store.as_ref()), 20);
    }

    #[test]
    fn test_time_up_clears_slot() {
        let mut g = game(GameMode::Time);
        assert!(g.has_saved_session());
        g.session.time_left = 1;
        assert_eq!(g.tick_second(), Some(GameOverReason::TimeUp));
        assert!(!g.has_saved_session());
    }

    #[test]
    fn test_resume_restores_session() {
        let mut g = game(GameMode::Time);
        g.session.hand = [Some(mono()), Some(mono()), Some(mono())];
        g.session.time_left = 77;
        g.commit(0, GridPos::new(3, 3)).unwrap();
        let hand = g.session.hand.clone();

        let store = std::mem::replace(&mut g.store, Box::new(MemoryStore::new()));
        let mut resumed = Game::new(store, rng());
        assert!(resumed.has_saved_session());
        assert!(resumed.resume());
        assert_eq!(resumed.session.mode, GameMode::Time);
        assert_eq!(resumed.session.time_left, 77);
        assert_eq!(resumed.session.score.score(), 10);
        assert_eq!(resumed.session.hand, hand);
        assert!(resumed.session.board.is_filled(3, 3));
        assert_eq!(resumed.session.moves, 1);
    }

    #[test]
    fn test_resume_deals_into_empty_tray() {
        let mut g = game(GameMode::Classic);
        g.session.hand = [None, None, None];
        g.session.moves = 4;
        g.persist();

        let store = std::mem::replace(&mut g.store, Box::new(MemoryStore::new()));
        let mut resumed = Game::new(store, rng());
        assert!(resumed.resume());
        assert_eq!(resumed.session.status, Status::Playing);
        assert!(resumed.session.hand.iter().all(Option::is_some));
        assert_eq!(resumed.session.moves, 4);
        // the dealt tray is what a second resume sees
        let saved = session::load(resumed.store.as_ref()).unwrap();
        assert_eq!(saved.hand, resumed.session.hand);
    }

    #[test]
    fn test_resume_without_save() {
        let mut g = Game::new(Box::new(MemoryStore::new()), rng());
        let before = g.session.hand.clone();
        assert!(!g.resume());
        assert_eq!(g.session.hand, before);
    }

    #[test]
    fn test_color_mode_deals_palette_colors() {
        let mut r = rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..30 {
            let s = GameSession::new(GameMode::Color, 0, &mut r);
            for item in s.hand.iter().flatten() {
                assert!(BlockColor::PALETTE.contains(&item.color));
                seen.insert(item.color);
            }
        }
        assert!(seen.len() > 1);
        let classic = GameSession::new(GameMode::Classic, 0, &mut r);
        assert!(classic.hand.iter().flatten().all(|i| i.color == BlockColor::Cyan));
    }
}
