//! Layout and drawing: title screen, board, sidebar, pause and game-over overlays.

use crate::app::Screen;
use crate::board::Shape;
use crate::game::GameState;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per grid block (cells are roughly twice as tall as wide).
const BLOCK_W: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;

/// Length of the white flash over cleared rows.
const CLEAR_FLASH_MS: u32 = 250;

/// Sidebar state that lives outside the engine.
#[derive(Debug, Clone, Copy)]
pub struct Hud {
    pub best: u32,
    pub new_record: bool,
    pub paused: bool,
    /// Ahh, ouch, music.
    pub muted: [bool; 3],
    pub music_playing: bool,
}

/// Row-clear flash: rows to highlight plus the running effect.
#[derive(Default)]
pub struct ClearFlash {
    pub rows: Vec<i32>,
    pub effect: Option<Effect>,
    pub process_time: Option<Instant>,
}

impl ClearFlash {
    pub fn start(&mut self, rows: &[i32]) {
        self.rows = rows.to_vec();
        self.effect = None;
        self.process_time = None;
    }

    pub fn is_active(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Drop the effect once it has run its course.
    pub fn finish_if_done(&mut self) {
        if self.effect.as_ref().is_some_and(Effect::done) {
            *self = Self::default();
        }
    }
}

/// Board size in terminal cells including the border.
fn board_outer_size(state: &GameState) -> (u16, u16) {
    let cols = u16::try_from(state.board.cols).unwrap_or(u16::MAX);
    let rows = u16::try_from(state.board.rows).unwrap_or(u16::MAX);
    (cols.saturating_mul(BLOCK_W).saturating_add(2), rows.saturating_add(2))
}

/// Outer board rect and sidebar rect, centred in `area`.
fn game_layout(area: Rect, state: &GameState) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(state);
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

fn fits(area: Rect, state: &GameState) -> bool {
    let (bw, bh) = board_outer_size(state);
    area.width >= bw.saturating_add(SIDEBAR_WIDTH) && area.height >= bh
}

/// Draw the current screen. While `flash` holds rows (and animation is on),
/// a TachyonFX fade runs over those board rows.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    hud: &Hud,
    flash: &mut ClearFlash,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    if !fits(area, state) {
        draw_too_small(frame, state, theme, area);
        return;
    }
    match screen {
        Screen::Menu => draw_menu(frame, theme, hud, area),
        Screen::Playing => {
            let board_rect = draw_game(frame, state, theme, hud, area);
            if flash.is_active() && !no_animation {
                apply_clear_flash(frame, board_rect, flash, now);
            }
            if hud.paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, hud, area);
            draw_game_over(frame, state, theme, hud, area);
        }
    }
}

fn draw_too_small(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let (bw, bh) = board_outer_size(state);
    let lines = vec![
        Line::from(Span::styled(
            "Terminal too small",
            Style::default().fg(theme.sticky).bold(),
        )),
        Line::from(format!(
            "need {}×{}, have {}×{}",
            bw.saturating_add(SIDEBAR_WIDTH),
            bh,
            area.width,
            area.height
        )),
        Line::from("Resize or press Q to quit"),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.text))
        .render(area, frame.buffer_mut());
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn popup_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
}

fn draw_menu(frame: &mut Frame, theme: &Theme, hud: &Hud, area: Rect) {
    let popup = centered(area, 44, 17);
    let key = Style::default().fg(theme.title).bold();
    let text = Style::default().fg(theme.text);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" SNAKE", Style::default().fg(theme.title).bold()),
            Span::styled("TRIS ", Style::default().fg(theme.text).bold()),
        ]),
        Line::from(""),
        Line::from(Span::styled(format!("High Score: {}", hud.best), text)),
        Line::from(""),
        Line::from(vec![Span::styled(" ← → ", key), Span::styled("nudge sideways", text)]),
        Line::from(vec![Span::styled(" ↓ ", key), Span::styled("nudge down", text)]),
        Line::from(vec![Span::styled(" P ", key), Span::styled("pause", text)]),
        Line::from(vec![Span::styled(" A / O / M ", key), Span::styled("sound toggles", text)]),
        Line::from(""),
        Line::from(Span::styled("Fill rows. Watch out for red blocks.", text)),
        Line::from(""),
        Line::from(Span::styled(
            " [ ENTER ] START ",
            Style::default().fg(Color::Black).bg(theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Q  quit ", Style::default().fg(theme.sticky))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

/// Board + sidebar. Returns the inner board rect.
fn draw_game(frame: &mut Frame, state: &GameState, theme: &Theme, hud: &Hud, area: Rect) -> Rect {
    let (board_outer, sidebar) = game_layout(area, state);
    let board_rect = draw_board(frame, state, theme, board_outer);
    draw_sidebar(frame, state, theme, hud, sidebar);
    board_rect
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.bg))
        .style(Style::default().bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let mut put = |col: i32, row: i32, glyph: [&str; 2], style: Style| {
        if col < 0 || row < 0 {
            return;
        }
        let x = inner.x + col as u16 * BLOCK_W;
        let y = inner.y + row as u16;
        for (dx, g) in glyph.iter().enumerate() {
            let pos = Position::new(x + dx as u16, y);
            if inner.contains(pos) {
                buf[pos].set_symbol(g).set_style(style);
            }
        }
    };

    for landed in state.board.blocks() {
        let glyph = match landed.shape {
            Shape::Head => ["▓", "▓"],
            Shape::Body => ["█", "█"],
            Shape::Tail => ["▒", "▒"],
        };
        let style = Style::default().fg(theme.tint(landed.tint)).bg(theme.bg);
        put(landed.col, landed.row, glyph, style);
    }

    if let Some(piece) = state.piece() {
        for seg in &piece.body {
            let style = Style::default().fg(theme.tint(seg.tint)).bg(theme.bg);
            put(seg.col, seg.row, ["█", "█"], style);
        }
        let head = theme.tint(piece.head.tint);
        let style = Style::default().fg(theme.eyes).bg(head).bold();
        put(piece.head.col, piece.head.row, ["•", "•"], style);
    }
    inner
}

fn on_off(muted: bool) -> &'static str {
    if muted { "off" } else { "on" }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, hud: &Hud, area: Rect) {
    let title = Style::default().fg(theme.title);
    let text = Style::default().fg(theme.text);
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title), Span::styled(value, text)])
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // stats
            Constraint::Length(1),
            Constraint::Length(5), // sound
            Constraint::Length(1),
            Constraint::Min(6), // keys
        ])
        .split(area);

    let stats = vec![
        stat("Score: ", state.score.to_string()),
        stat("High Score: ", hud.best.max(state.score).to_string()),
        stat("Lines: ", state.lines_cleared.to_string()),
        stat("Snakes: ", state.pieces_landed.to_string()),
        stat("Tick: ", format!("{} ms", state.interval().as_millis())),
    ];
    Paragraph::new(Text::from(stats))
        .block(popup_block(theme).title(Span::styled(" Snaketris ", title)))
        .render(chunks[0], frame.buffer_mut());

    let [ahh, ouch, music] = hud.muted;
    let sound = vec![
        stat("Ahh (A): ", on_off(ahh).to_string()),
        stat("Ouch (O): ", on_off(ouch).to_string()),
        stat(
            "Music (M): ",
            if hud.music_playing && !music { "♪".to_string() } else { on_off(music).to_string() },
        ),
    ];
    Paragraph::new(Text::from(sound))
        .block(popup_block(theme).title(Span::styled(" Sound ", title)))
        .render(chunks[2], frame.buffer_mut());

    let keys = vec![
        Line::from(Span::styled("←/→  nudge", text)),
        Line::from(Span::styled("↓    nudge down", text)),
        Line::from(Span::styled("P    pause", text)),
        Line::from(Span::styled("Q    quit", text)),
    ];
    Paragraph::new(Text::from(keys))
        .block(popup_block(theme).title(Span::styled(" Keys ", title)))
        .render(chunks[4], frame.buffer_mut());
}

/// Create the fade on first use, then advance it by the time since the last frame.
fn apply_clear_flash(frame: &mut Frame, board_rect: Rect, flash: &mut ClearFlash, now: Instant) {
    let delta = flash
        .process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.process_time = Some(now);

    if flash.effect.is_none() {
        let screen_rows: HashSet<u16> = flash
            .rows
            .iter()
            .filter_map(|&r| u16::try_from(r).ok())
            .map(|r| board_rect.y + r)
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            screen_rows.contains(&pos.y)
        }));
        let timer = (CLEAR_FLASH_MS, Interpolation::Linear);
        let effect = fx::fade_from(Color::White, Color::White, timer)
            .with_filter(filter)
            .with_area(board_rect);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(" Paused ", Style::default().fg(Color::Black).bg(Color::Yellow))),
        Line::from(Span::styled(" P — Resume    Q — Quit ", Style::default().fg(theme.text))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, hud: &Hud, area: Rect) {
    let popup = centered(area, 34, 10);
    let text = Style::default().fg(theme.text);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " GAME OVER ",
            Style::default().fg(Color::White).bg(theme.sticky).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Final Score: {}", state.score), text)),
        Line::from(Span::styled(format!("High Score: {}", hud.best), text)),
    ];
    if hud.new_record {
        lines.push(Line::from(Span::styled(
            "NEW HIGH SCORE!",
            Style::default().fg(Color::Yellow).bold(),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Enter — Play again    Q — Quit", text)));
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}
