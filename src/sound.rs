//! Sound cues. The terminal can only beep, so most cues are silent.

use crate::game::SoundCue;
use std::io::{self, Write};

pub trait Sound {
    fn play(&mut self, cue: SoundCue);
}

/// Rings the terminal bell on the cues worth interrupting for.
pub struct TerminalBell<W: Write> {
    out: W,
    enabled: bool,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout(enabled: bool) -> Self {
        Self::new(io::stdout(), enabled)
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }
}

/// Cues that ring.
pub fn rings(cue: SoundCue) -> bool {
    matches!(
        cue,
        SoundCue::Clear(_) | SoundCue::GameOver | SoundCue::LowTime
    )
}

impl<W: Write> Sound for TerminalBell<W> {
    fn play(&mut self, cue: SoundCue) {
        if !self.enabled || !rings(cue) {
            return;
        }
        if let Err(e) = self.out.write_all(b"\x07").and_then(|()| self.out.flush()) {
            tracing::debug!(error = %e, "bell failed");
        }
    }
}
