//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::board::BlockColor;
use crate::game::Tint;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Neon palette and UI colours, optionally overridden by a theme file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Piece colours in palette order: cyan, blue, red, yellow.
    pub blocks: [Color; 4],
    pub rock: Color,
    /// Ice overlay.
    pub ice: Color,
    /// Bomb countdown digits.
    pub bomb: Color,
    /// Ghost outline where the piece fits.
    pub ghost_ok: Color,
    /// Ghost outline where it does not.
    pub ghost_blocked: Color,
    /// Cells a drop would clear.
    pub highlight: Color,
    /// Board background.
    pub bg: Color,
    /// Alternate 3x3 square background.
    pub square_bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text, dimmed tray slot.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon_default()
    }
}

impl Theme {
    /// Built-in neon colours; block hexes match the saved-game colour names.
    pub const fn neon_default() -> Self {
        Self {
            blocks: [
                Color::Rgb(0x00, 0xF3, 0xFF),
                Color::Rgb(0x3B, 0x82, 0xF6),
                Color::Rgb(0xEF, 0x44, 0x44),
                Color::Rgb(0xFF, 0xE6, 0x00),
            ],
            rock: Color::Rgb(0x55, 0x55, 0x66),
            ice: Color::Rgb(0xBF, 0xEF, 0xFF),
            bomb: Color::Rgb(0xFF, 0x6B, 0x00),
            ghost_ok: Color::Rgb(0x00, 0xF3, 0xFF),
            ghost_blocked: Color::Rgb(0xEF, 0x44, 0x44),
            highlight: Color::Rgb(0xFF, 0xFF, 0xFF),
            bg: Color::Rgb(0x0B, 0x0B, 0x1A),
            square_bg: Color::Rgb(0x14, 0x14, 0x2B),
            div_line: Color::Rgb(0x2A, 0x2A, 0x4A),
            main_fg: Color::Rgb(0xE0, 0xE0, 0xF0),
            title: Color::Rgb(0xFF, 0x00, 0xE6),
            inactive_fg: Color::Rgb(0x6B, 0x6B, 0x8A),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// No path (or a missing file) gives the neon defaults. `palette` is applied last.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default().with_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        Ok(Self::from_map(&map).with_palette(palette))
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.apply_palette(palette);
        self
    }

    /// Override block colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.blocks = [
                    Color::Rgb(0x00, 0xFF, 0xFF),
                    Color::Rgb(0x00, 0x66, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                ];
                self.rock = Color::Rgb(0x99, 0x99, 0x99);
                self.bg = Color::Rgb(0x00, 0x00, 0x00);
                self.square_bg = Color::Rgb(0x1A, 0x1A, 0x1A);
            }
            Palette::Colorblind => {
                // Okabe-Ito: no red/green pair
                self.blocks = [
                    Color::Rgb(0x56, 0xB4, 0xE9),
                    Color::Rgb(0x00, 0x72, 0xB2),
                    Color::Rgb(0xE6, 0x9F, 0x00),
                    Color::Rgb(0xF0, 0xE4, 0x42),
                ];
                self.ghost_blocked = Color::Rgb(0xD5, 0x5E, 0x00);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::neon_default();
        // neon keys first, then the closest btop key
        Self {
            blocks: [
                get("block_cyan").or_else(|| get("hi_fg")).unwrap_or(d.blocks[0]),
                get("block_blue").or_else(|| get("cpu_box")).unwrap_or(d.blocks[1]),
                get("block_red").or_else(|| get("cpu_end")).unwrap_or(d.blocks[2]),
                get("block_yellow").or_else(|| get("cpu_mid")).unwrap_or(d.blocks[3]),
            ],
            rock: get("rock").unwrap_or(d.rock),
            ice: get("ice").unwrap_or(d.ice),
            bomb: get("bomb").or_else(|| get("temp_end")).unwrap_or(d.bomb),
            ghost_ok: get("ghost_ok").unwrap_or(d.ghost_ok),
            ghost_blocked: get("ghost_blocked").unwrap_or(d.ghost_blocked),
            highlight: get("highlight").or_else(|| get("selected_fg")).unwrap_or(d.highlight),
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(d.bg),
            square_bg: get("square_bg").or_else(|| get("selected_bg")).unwrap_or(d.square_bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    pub fn block_color(&self, color: BlockColor) -> Color {
        match color {
            BlockColor::Cyan => self.blocks[0],
            BlockColor::Blue => self.blocks[1],
            BlockColor::Red => self.blocks[2],
            BlockColor::Yellow => self.blocks[3],
            BlockColor::Rock => self.rock,
        }
    }

    /// Colour for an effect tint.
    pub fn tint(&self, tint: Tint) -> Color {
        match tint {
            Tint::Block(c) => self.block_color(c),
            Tint::Ice => self.ice,
            Tint::Bonus => self.highlight,
            Tint::Time => self.ghost_ok,
            Tint::Match => self.title,
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').trim();
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    match s.len() {
        6 => Ok(Color::Rgb(
            channel(&s[0..2])?,
            channel(&s[2..4])?,
            channel(&s[4..6])?,
        )),
        3 => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(bad()),
    }
}
