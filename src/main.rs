//! Neon Blocks — 9x9 block-placement puzzle (1010!/Block Blast style) in the terminal.

mod app;
mod board;
mod clear;
mod fx;
mod game;
mod input;
mod obstacles;
mod placement;
mod score;
mod session;
mod shapes;
mod sound;
mod storage;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use storage::{FileStore, MemoryStore, Store};

fn main() -> Result<()> {
    let args = Args::parse();
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(storage::default_data_dir);
    init_logging(&args, &data_dir)?;

    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to the default theme");
            theme::Theme::default().with_palette(args.palette)
        }
    };
    let store: Box<dyn Store> = if args.no_save {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(&data_dir))
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    tracing::info!(
        mode = args.mode.label(),
        data_dir = %data_dir.display(),
        no_save = args.no_save,
        seed = ?args.seed,
        "starting"
    );

    let mut app = App::new(args, theme, store, rng)?;
    app.run()?;
    Ok(())
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging(args: &Args, data_dir: &std::path::Path) -> Result<()> {
    let path = args
        .log_file
        .clone()
        .unwrap_or_else(|| data_dir.join("neon-blocks.log"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();
    Ok(())
}

/// Neon Blocks puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "neon-blocks",
    version,
    about = "Neon Blocks: drag polyomino pieces onto a 9x9 grid and clear rows, columns and 3x3 squares.",
    long_about = "Neon Blocks is a terminal block-placement puzzle in the style of 1010! and Block Blast.\n\n\
        Drag one of three pieces from the tray onto the 9x9 board. Filling a row, a column or a \
        3x3 square clears it. The game ends when no piece in the tray fits.\n\n\
        MODES:\n  classic  No timer.\n  time     120 second countdown; every cleared group adds 5 s.\n  \
        bomb     A bomb is armed every 5th placement and explodes after 9 more.\n  \
        color    Pieces come in four colours; one-colour groups multiply the bonus.\n\n\
        CONTROLS:\n  Mouse       Drag a piece from the tray, release on the board. Right click cancels.\n  \
        1 / 2 / 3   Pick up a piece     Arrows      Move it one cell\n  \
        Enter/Space Drop it             Esc         Put it back\n  \
        r           Rotate all pieces   q           Menu (resume / main menu / exit)\n\n\
        Progress is saved after every move; use --resume or the menu entry to continue."
)]
pub struct Args {
    /// Game mode used by --no-menu.
    #[arg(short, long, default_value = "classic")]
    pub mode: GameMode,

    /// Skip the main menu and start a fresh game in --mode.
    #[arg(long)]
    pub no_menu: bool,

    /// Resume the saved game immediately if there is one.
    #[arg(long)]
    pub resume: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the neon palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Where the high score, saved game and log live. Defaults to $XDG_CONFIG_HOME/neon-blocks.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep the high score and saved game in memory only.
    #[arg(long)]
    pub no_save: bool,

    /// Seed for piece and obstacle draws (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// No terminal bell.
    #[arg(long)]
    pub mute: bool,

    /// Disable bursts, floating text and the clear fade.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Log file. Defaults to neon-blocks.log in the data directory.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Time,
    Bomb,
    Color,
}

impl GameMode {
    pub const ALL: [Self; 4] = [Self::Classic, Self::Time, Self::Bomb, Self::Color];
}
