//! Colours: dark slate board, white text, green snakes, red sticky blocks.
//! Optionally overridden from a `key = "#RRGGBB"` file.

use crate::board::Tint;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub border: Color,
    /// Score and help text.
    pub text: Color,
    /// Titles and highlights.
    pub title: Color,
    /// Sticky (red) blocks.
    pub sticky: Color,
    /// Eyes on the falling head.
    pub eyes: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("unknown theme key: {0}")]
    UnknownKey(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(0x2F, 0x4F, 0x4F), // darkslategray
            border: Color::Rgb(0x5F, 0x7F, 0x7F),
            text: Color::White,
            title: Color::Rgb(0x00, 0xDC, 0x00),
            sticky: Color::Rgb(0xFF, 0x00, 0x00),
            eyes: Color::White,
        }
    }
}

impl Theme {
    /// Defaults when `path` is None or missing; otherwise defaults overridden by the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        for (key, value) in map {
            let color = parse_hex(value)?;
            let slot = match key.as_str() {
                "background" | "bg" => &mut theme.bg,
                "border" => &mut theme.border,
                "text" => &mut theme.text,
                "title" => &mut theme.title,
                "sticky" => &mut theme.sticky,
                "eyes" => &mut theme.eyes,
                other => return Err(ThemeError::UnknownKey(other.to_string())),
            };
            *slot = color;
        }
        Ok(theme)
    }

    /// Colour for a segment or landed block.
    pub fn tint(&self, tint: Tint) -> Color {
        match tint {
            Tint::Green(g) => Color::Rgb(0, g, 0),
            Tint::Sticky => self.sticky,
        }
    }
}

/// `key = "value"` per line; `#` starts a comment line, quotes are optional.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(bad)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(bad()),
    };
    Ok(Color::Rgb(r, g, b))
}
