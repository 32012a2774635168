//! Snaketris — Snake-style falling chains with Tetris-style row clears, in the terminal.

mod app;
mod audio;
mod board;
mod game;
mod highscores;
mod input;
mod logging;
mod piece;
mod ramp;
mod rng;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::Parser;
use log::LevelFilter;
use ramp::RampConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Engine options derived from the CLI (board size, speed ramp, sticky chance, seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub cols: i32,
    pub rows: i32,
    pub stick_chance: f64,
    pub ramp: RampConfig,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cols: board::DEFAULT_COLS,
            rows: board::DEFAULT_ROWS,
            stick_chance: 0.10,
            ramp: RampConfig::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("board must be at least {min} columns wide so every chain can spawn (got {got})")]
    TooNarrow { min: i32, got: i32 },
    #[error("board must be at least 2 rows tall (got {0})")]
    TooShort(i32),
    #[error("board is limited to {max}x{max} (got {cols}x{rows})")]
    TooLarge { max: i32, cols: i32, rows: i32 },
    #[error("stick chance must be within 0..=1 (got {0})")]
    StickChance(f64),
    #[error("interval floor {floor} ms is above the start interval {start} ms")]
    Floor { floor: u64, start: u64 },
    #[error("ramp step and start interval must be non-zero")]
    ZeroInterval,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let cols = i32::from(args.cols);
        let rows = i32::from(args.rows);
        if cols < piece::MIN_COLS {
            return Err(ConfigError::TooNarrow {
                min: piece::MIN_COLS,
                got: cols,
            });
        }
        if rows < 2 {
            return Err(ConfigError::TooShort(rows));
        }
        if cols > board::MAX_EDGE || rows > board::MAX_EDGE {
            return Err(ConfigError::TooLarge {
                max: board::MAX_EDGE,
                cols,
                rows,
            });
        }
        if !(0.0..=1.0).contains(&args.stick_chance) {
            return Err(ConfigError::StickChance(args.stick_chance));
        }
        if args.start_interval_ms == 0 || args.ramp_step_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if args.min_interval_ms > args.start_interval_ms {
            return Err(ConfigError::Floor {
                floor: args.min_interval_ms,
                start: args.start_interval_ms,
            });
        }
        Ok(Self {
            cols,
            rows,
            stick_chance: args.stick_chance,
            ramp: RampConfig {
                start: Duration::from_millis(args.start_interval_ms),
                floor: Duration::from_millis(args.min_interval_ms),
                step: Duration::from_millis(args.ramp_step_ms),
                period: Duration::from_secs(args.ramp_period_secs),
            },
            seed: args.seed,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        logging::init_file_log(path, args.log_level)?;
    }
    let config = GameConfig::from_args(&args)?;
    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("theme not loaded, using defaults: {e}");
            theme::Theme::default()
        }
    };
    log::info!("starting with {config:?}");
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Snake-meets-Tetris falling-chain puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "snaketris",
    version,
    about = "Snake-meets-Tetris in the terminal. \
        Steer falling snakes, fill rows, dodge the sticky red leftovers.",
    long_about = "Snaketris drops snakes of 3 to 7 segments onto a 15x25 board.\n\n\
        Nudge the falling snake left, right or down; sideways and down nudges pull the body \
        along behind the head. When any segment touches the floor or a landed block the whole \
        snake freezes. Full rows clear for rows² × 100 points, but each block has a small chance \
        to turn red and stay behind, holding up everything above it. Red blocks always clear the \
        next time their row fills.\n\n\
        CONTROLS:\n  Left/Right, h/l  Nudge    Down, j   Nudge down   Up, k  (disabled)\n  \
        Enter/Space      Start    r         Restart      p      Pause\n  \
        a / o / m        Toggle ahh / ouch / music        q / Esc Quit"
)]
pub struct Args {
    /// Board width in columns.
    #[arg(long, default_value = "15", value_name = "COLS")]
    pub cols: u16,

    /// Board height in rows.
    #[arg(long, default_value = "25", value_name = "ROWS")]
    pub rows: u16,

    /// Starting tick interval in milliseconds.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub start_interval_ms: u64,

    /// Fastest tick interval the ramp will reach.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub min_interval_ms: u64,

    /// How much the ramp shortens the interval each period.
    #[arg(long, default_value = "10", value_name = "MS")]
    pub ramp_step_ms: u64,

    /// Seconds between ramp steps.
    #[arg(long, default_value = "10", value_name = "SECS")]
    pub ramp_period_secs: u64,

    /// Chance that a block in a cleared row turns red and stays.
    #[arg(long, default_value = "0.1", value_name = "P")]
    pub stick_chance: f64,

    /// Fixed RNG seed for reproducible games.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the row-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Ring the terminal bell on impacts (when the ouch channel is unmuted).
    #[arg(long)]
    pub bell: bool,

    /// Path to a theme file (`key = "#RRGGBB"` lines).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Where to keep the high score. Defaults to the user config directory.
    #[arg(long, value_name = "FILE")]
    pub high_score_file: Option<PathBuf>,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: LevelFilter,
}
