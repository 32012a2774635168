//! App: terminal init, main loop, tick scheduling and key handling.
//!
//! The loop owns the `GameState` outright. Key presses and tick deadlines are
//! turned into `Command`s and handed to the engine one at a time, in the order
//! they arrive; engine events then drive audio, the high score and the UI.

use crate::Args;
use crate::GameConfig;
use crate::audio::{Channel, Cue, Jukebox};
use crate::game::{Command, GameEvent, GameState};
use crate::highscores::HighScoreStore;
use crate::input::{Action, key_to_action};
use crate::rng::make_dice;
use crate::theme::Theme;
use crate::ui::{ClearFlash, Hud};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, info, warn};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Upper bound on how long the loop waits for input before redrawing (~60 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

/// Whether the loop should keep going after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    args: Args,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// Start of the current tick period; a tick fires once `state.interval()` has passed.
    last_tick: Instant,
    high_scores: HighScoreStore,
    best: u32,
    new_record: bool,
    jukebox: Jukebox,
    flash: ClearFlash,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let now = Instant::now();
        let state = GameState::new(&config, make_dice(config.seed), now);
        let high_scores = HighScoreStore::new(args.high_score_file.as_deref());
        let best = high_scores.load();
        let jukebox = Jukebox::new(args.bell);
        let mut app = Self {
            args,
            theme,
            state,
            screen: Screen::Menu,
            paused: false,
            last_tick: now,
            high_scores,
            best,
            new_record: false,
            jukebox,
            flash: ClearFlash::default(),
        };
        if app.args.no_menu {
            app.start_game();
        }
        Ok(app)
    }

    fn start_game(&mut self) {
        let now = Instant::now();
        let events = self.state.handle(Command::Restart(now));
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = now;
        self.flash = ClearFlash::default();
        self.apply_events(events);
    }

    /// React to engine events: sounds, row flash, speed changes, game over.
    fn apply_events(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::Started => {
                    self.new_record = false;
                    self.jukebox.play(Cue::GameStart);
                }
                GameEvent::Spawned { length } => {
                    debug!("spawned snake of length {length}");
                    self.jukebox.play(Cue::Spawn);
                }
                GameEvent::Landed {
                    cleared_rows,
                    stuck,
                    points,
                } => {
                    if points > 0 {
                        debug!("+{points} points, {stuck} blocks turned sticky");
                    }
                    self.jukebox.play(Cue::Land);
                    if !cleared_rows.is_empty() && !self.args.no_animation {
                        self.flash.start(&cleared_rows);
                    }
                }
                GameEvent::SpeedUp(interval) => {
                    // Restart the tick period at the new rate.
                    self.last_tick = Instant::now();
                    info!("tick interval now {} ms", interval.as_millis());
                }
                GameEvent::GameOver { score } => self.finish_game(score),
            }
        }
    }

    fn finish_game(&mut self, score: u32) {
        self.screen = Screen::GameOver;
        self.jukebox.play(Cue::GameOver);
        let (best, new_record) = settle_high_score(&self.high_scores, self.best, score);
        self.best = best;
        self.new_record = new_record;
        info!("game over: score {score}, best {}", self.best);
    }

    fn handle_action(&mut self, action: Action) -> Flow {
        if action == Action::Quit {
            return Flow::Exit;
        }
        if let Action::ToggleSound(channel) = action {
            self.jukebox.toggle(channel);
            return Flow::Continue;
        }
        match self.screen {
            Screen::Menu => {
                if action == Action::Confirm {
                    self.start_game();
                }
            }
            Screen::Playing => match action {
                Action::Pause => self.paused = !self.paused,
                _ if self.paused => {}
                Action::Steer(dir) => {
                    let events = self.state.handle(Command::Steer(dir));
                    self.apply_events(events);
                }
                Action::Restart => self.start_game(),
                _ => {}
            },
            Screen::GameOver => {
                if matches!(action, Action::Confirm | Action::Restart) {
                    self.start_game();
                }
            }
        }
        Flow::Continue
    }

    fn hud(&self) -> Hud {
        Hud {
            best: self.best,
            new_record: self.new_record,
            paused: self.paused,
            muted: [
                self.jukebox.is_muted(Channel::Ahh),
                self.jukebox.is_muted(Channel::Ouch),
                self.jukebox.is_muted(Channel::Music),
            ],
            music_playing: self.jukebox.is_looping(),
        }
    }

    fn ticking(&self) -> bool {
        self.screen == Screen::Playing && !self.paused
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let hud = self.hud();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    &hud,
                    &mut self.flash,
                    now,
                    self.args.no_animation,
                );
            })?;
            self.flash.finish_if_done();

            let timeout = if self.ticking() {
                let next_tick = self.state.interval().saturating_sub(self.last_tick.elapsed());
                next_tick.min(FRAME_DURATION)
            } else {
                FRAME_DURATION
            };

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_action(key_to_action(key)) == Flow::Exit {
                        return Ok(());
                    }
                }
            }

            if self.ticking() && self.last_tick.elapsed() >= self.state.interval() {
                let now = Instant::now();
                self.last_tick = now;
                let events = self.state.handle(Command::Tick(now));
                self.apply_events(events);
            }
        }
    }
}

/// Best score after a game ending at `score`, and whether it set a new record.
/// A failed save is logged and leaves `best` as it was.
fn settle_high_score(store: &HighScoreStore, best: u32, score: u32) -> (u32, bool) {
    match store.record(score) {
        Ok(true) => (score, true),
        Ok(false) => (best, false),
        Err(e) => {
            warn!("could not save high score: {e:#}");
            (best, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::block;
    use crate::rng::Scripted;

    fn temp_store(name: &str) -> HighScoreStore {
        let dir = std::env::temp_dir()
            .join(format!("snaketris-app-test-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        HighScoreStore::new(Some(&dir.join("highscore")))
    }

    /// Plays a game whose next spawn is blocked and returns the final score it reports.
    fn blocked_game(score: u32) -> u32 {
        let mut state =
            GameState::new(&GameConfig::default(), Scripted::constant(0.0), Instant::now());
        state.board.push(block(3, 0));
        state.score = score;
        let events = state.handle(Command::Tick(Instant::now()));
        match events.as_slice() {
            [GameEvent::GameOver { score }] => *score,
            other => panic!("expected game over, got {other:?}"),
        }
    }

    #[test]
    fn test_game_over_saves_only_strictly_better_scores() {
        let store = temp_store("settle");
        let mut best = store.load();
        assert_eq!(best, 0);

        let (b, record) = settle_high_score(&store, best, blocked_game(500));
        assert!(record);
        best = b;
        assert_eq!((best, store.load()), (500, 500));

        let (b, record) = settle_high_score(&store, best, blocked_game(500));
        assert!(!record);
        assert_eq!(b, 500);

        let (b, record) = settle_high_score(&store, best, blocked_game(300));
        assert!(!record);
        assert_eq!((b, store.load()), (500, 500));
    }

    #[test]
    fn test_unwritable_store_keeps_previous_best() {
        // A regular file where the parent directory should be makes the save fail.
        let dir = std::env::temp_dir()
            .join(format!("snaketris-app-test-{}-blocked", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let not_a_dir = dir.join("file");
        std::fs::write(&not_a_dir, "").unwrap();
        let store = HighScoreStore::new(Some(&not_a_dir.join("highscore")));

        assert_eq!(settle_high_score(&store, 200, 900), (200, false));
    }
}
