//! Persist the high score to disk (XDG config or ~/.config/snaketris).

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscore";

/// Default location: config dir / snaketris / highscore.
fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("snaketris").join(FILENAME)
}

/// A single integer stored as text.
#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map_or_else(config_path, Path::to_path_buf),
        }
    }

    /// Stored score; 0 when missing or unparsable.
    pub fn load(&self) -> u32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Save. Creates the parent directory if needed.
    pub fn save(&self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{score}\n"))?;
        Ok(())
    }

    /// Saves `score` only when it beats the stored one. Returns whether it did.
    pub fn record(&self, score: u32) -> Result<bool> {
        if score <= self.load() {
            return Ok(false);
        }
        self.save(score)?;
        Ok(true)
    }
}
