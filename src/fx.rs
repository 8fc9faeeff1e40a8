//! Transient visual effects: floating text, spark bursts and the clear fade. Drawn by `ui`, aged
//! by the app loop; gameplay never reads them.

use crate::game::{FxCue, Tint};
use std::time::Instant;
use tachyonfx::Effect;

/// Floating text lifetime.
pub const TEXT_LIFETIME_MS: u32 = 1500;
/// Text rises one terminal row per this many ms.
const TEXT_RISE_STEP_MS: u32 = 150;
pub const BURST_LIFETIME_MS: u32 = 300;
/// Fade of swept cells after a clear.
pub const CLEAR_FADE_MS: u32 = 250;

/// Spark glyphs around a burst centre, as (dx, dy) in terminal cells. Cycled by spark index.
pub const SPARK_OFFSETS: [(i16, i16); 8] = [
    (-2, -1),
    (3, 1),
    (0, -1),
    (-3, 1),
    (4, -1),
    (1, 1),
    (-1, 0),
    (4, 0),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingText {
    pub row: usize,
    pub col: usize,
    pub text: String,
    pub tint: Tint,
    pub age_ms: u32,
    /// Terminal rows risen so far.
    pub rise: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    pub row: usize,
    pub col: usize,
    pub tint: Tint,
    pub count: u32,
    pub age_ms: u32,
}

impl Burst {
    /// Sparks still shown; they go out one by one over the lifetime.
    pub fn live_sparks(&self) -> u32 {
        let left = BURST_LIFETIME_MS.saturating_sub(self.age_ms);
        (self.count * left).div_ceil(BURST_LIFETIME_MS)
    }
}

/// Cells swept by the last clear and the fade running over them.
pub struct ClearFade {
    pub cells: Vec<(usize, usize)>,
    /// Created by the renderer on first draw, when the board rect is known.
    pub effect: Option<Effect>,
    pub last_process: Option<Instant>,
}

pub struct VisualFx {
    enabled: bool,
    pub texts: Vec<FloatingText>,
    pub bursts: Vec<Burst>,
    pub fade: Option<ClearFade>,
}

impl VisualFx {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            texts: Vec::new(),
            bursts: Vec::new(),
            fade: None,
        }
    }

    pub fn push(&mut self, cue: FxCue) {
        if !self.enabled {
            return;
        }
        match cue {
            FxCue::Burst {
                row,
                col,
                tint,
                count,
            } => self.bursts.push(Burst {
                row,
                col,
                tint,
                count,
                age_ms: 0,
            }),
            FxCue::Text {
                row,
                col,
                text,
                tint,
            } => self.texts.push(FloatingText {
                row,
                col,
                text,
                tint,
                age_ms: 0,
                rise: 0,
            }),
            FxCue::Flash(cells) => {
                if !cells.is_empty() {
                    self.fade = Some(ClearFade {
                        cells,
                        effect: None,
                        last_process: None,
                    });
                }
            }
        }
    }

    pub fn tick(&mut self, delta_ms: u32) {
        self.texts.retain_mut(|t| {
            let old_steps = t.age_ms / TEXT_RISE_STEP_MS;
            t.age_ms += delta_ms;
            let new_steps = t.age_ms / TEXT_RISE_STEP_MS;
            if new_steps > old_steps {
                t.rise += 1;
            }
            t.age_ms < TEXT_LIFETIME_MS
        });
        self.bursts.retain_mut(|b| {
            b.age_ms += delta_ms;
            b.age_ms < BURST_LIFETIME_MS
        });
        if self
            .fade
            .as_ref()
            .and_then(|f| f.effect.as_ref())
            .is_some_and(Effect::done)
        {
            self.fade = None;
        }
    }

    /// Drop everything, e.g. when a new game starts.
    pub fn clear(&mut self) {
        self.texts.clear();
        self.bursts.clear();
        self.fade = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BlockColor;

    fn text() -> FxCue {
        FxCue::Text {
            row: 4,
            col: 4,
            text: "+100".to_string(),
            tint: Tint::Bonus,
        }
    }

    #[test]
    fn test_text_rises_and_expires() {
        let mut fx = VisualFx::new(true);
        fx.push(text());
        fx.tick(16);
        assert_eq!(fx.texts[0].rise, 0);
        fx.tick(150);
        assert_eq!(fx.texts[0].rise, 1);
        fx.tick(1300);
        assert_eq!(fx.texts.len(), 1);
        fx.tick(100);
        assert!(fx.texts.is_empty());
    }

    #[test]
    fn test_burst_sparks_die_out() {
        let mut fx = VisualFx::new(true);
        fx.push(FxCue::Burst {
            row: 1,
            col: 1,
            tint: Tint::Block(BlockColor::Red),
            count: 5,
        });
        assert_eq!(fx.bursts[0].live_sparks(), 5);
        fx.tick(150);
        assert!(fx.bursts[0].live_sparks() < 5);
        fx.tick(150);
        assert!(fx.bursts.is_empty());
    }

    #[test]
    fn test_disabled_ignores_cues() {
        let mut fx = VisualFx::new(false);
        fx.push(text());
        fx.push(FxCue::Flash(vec![(0, 0)]));
        assert!(fx.texts.is_empty());
        assert!(fx.fade.is_none());
    }

    #[test]
    fn test_flash_waits_for_renderer() {
        let mut fx = VisualFx::new(true);
        fx.push(FxCue::Flash(Vec::new()));
        assert!(fx.fade.is_none());
        fx.push(FxCue::Flash(vec![(2, 3)]));
        fx.tick(1000);
        // no effect built yet, so the fade stays pending
        assert_eq!(fx.fade.as_ref().map(|f| f.cells.clone()), Some(vec![(2, 3)]));
        fx.clear();
        assert!(fx.fade.is_none());
    }
}
