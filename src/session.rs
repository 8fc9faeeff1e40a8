//! The single resumable save slot.

use crate::GameMode;
use crate::board::Board;
use crate::game::{GameSession, HAND_SIZE, HandItem, TIME_LIMIT_SECS};
use crate::storage::{StorageError, Store};
use serde::{Deserialize, Serialize};

/// Key of the save slot.
pub const SESSION_KEY: &str = "session.json";

/// On-disk form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub grid: Board,
    pub hand: [Option<HandItem>; HAND_SIZE],
    pub score: u32,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub time_left: u32,
    #[serde(default)]
    pub moves: u32,
}

impl SavedSession {
    pub fn capture(session: &GameSession) -> Self {
        Self {
            grid: session.board,
            hand: session.hand.clone(),
            score: session.score.score(),
            mode: session.mode,
            time_left: session.time_left,
            moves: session.moves,
        }
    }

    /// Countdown to resume with; an unset timer restarts at the full limit.
    pub fn resume_time(&self) -> u32 {
        if self.time_left == 0 {
            TIME_LIMIT_SECS
        } else {
            self.time_left
        }
    }
}

/// Overwrite the slot with `session`. Skipped (Ok(false)) when its timer has run out.
pub fn save(store: &mut dyn Store, session: &GameSession) -> Result<bool, StorageError> {
    if session.time_left == 0 {
        return Ok(false);
    }
    let json = serde_json::to_string(&SavedSession::capture(session))?;
    store.set(SESSION_KEY, &json)?;
    Ok(true)
}

/// The saved session, or `None` when the slot is empty or unreadable.
pub fn load(store: &dyn Store) -> Option<SavedSession> {
    let json = match store.get(SESSION_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "could not read saved session");
            return None;
        }
    };
    match serde_json::from_str(&json) {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable saved session");
            None
        }
    }
}

/// True if a readable session is waiting.
pub fn exists(store: &dyn Store) -> bool {
    load(store).is_some()
}

/// Empty the slot.
pub fn clear(store: &mut dyn Store) -> Result<(), StorageError> {
    store.remove(SESSION_KEY)
}
