//! Game state: board, falling chain, landing, row clears, spawning, speed ramp.

use crate::GameConfig;
use crate::board::{Board, clear_points};
use crate::piece::{Direction, GRAVITY, Nudge, Piece, SpawnRoll};
use crate::ramp::Ramp;
use crate::rng::Dice;
use log::{debug, info};
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

/// Where the game is between ticks. Landing and row clearing finish inside the
/// tick that detects the collision, leaving the game in `Spawning`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Next tick spawns a new chain.
    Spawning,
    Falling(Piece),
    GameOver,
}

/// Input to the engine, handled strictly in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tick(Instant),
    Steer(Direction),
    Restart(Instant),
}

/// What happened while handling a command. Consumed by UI, audio and high scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Spawned { length: u32 },
    Landed {
        /// Row indices found full during the clear pass, bottom first.
        cleared_rows: Vec<i32>,
        stuck: u32,
        points: u32,
    },
    SpeedUp(Duration),
    GameOver { score: u32 },
}

/// Whole engine state. Owned by one loop; every mutation goes through `handle`.
#[derive(Debug)]
pub struct GameState<D = StdRng> {
    pub board: Board,
    pub phase: Phase,
    /// Pending one-tick input.
    pub nudge: Nudge,
    pub score: u32,
    pub lines_cleared: u32,
    pub pieces_landed: u32,
    /// Probability that a block in a cleared row turns sticky instead of vanishing.
    pub stick_chance: f64,
    ramp: Ramp,
    dice: D,
}

impl<D: Dice> GameState<D> {
    pub fn new(config: &GameConfig, dice: D, now: Instant) -> Self {
        Self {
            board: Board::new(config.cols, config.rows),
            phase: Phase::Spawning,
            nudge: Nudge::default(),
            score: 0,
            lines_cleared: 0,
            pieces_landed: 0,
            stick_chance: config.stick_chance,
            ramp: Ramp::new(config.ramp, now),
            dice,
        }
    }

    pub fn handle(&mut self, command: Command) -> Vec<GameEvent> {
        match command {
            Command::Tick(now) => self.tick(now),
            Command::Steer(dir) => {
                self.steer(dir);
                Vec::new()
            }
            Command::Restart(now) => self.restart(now),
        }
    }

    /// Current tick interval.
    pub fn interval(&self) -> Duration {
        self.ramp.interval()
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn piece(&self) -> Option<&Piece> {
        match &self.phase {
            Phase::Falling(piece) => Some(piece),
            _ => None,
        }
    }

    /// Record a key for the next tick; replaces any earlier key. Ignored unless a chain is falling.
    pub fn steer(&mut self, dir: Direction) {
        if !matches!(self.phase, Phase::Falling(_)) {
            return;
        }
        if let Some(nudge) = Nudge::from_direction(dir) {
            self.nudge = nudge;
        }
    }

    /// Empty board, zero score, ramp back to its start interval.
    pub fn restart(&mut self, now: Instant) -> Vec<GameEvent> {
        self.board.clear();
        self.phase = Phase::Spawning;
        self.nudge = Nudge::default();
        self.score = 0;
        self.lines_cleared = 0;
        self.pieces_landed = 0;
        self.ramp.reset(now);
        info!("game started ({}x{})", self.board.cols, self.board.rows);
        vec![GameEvent::Started]
    }

    /// One simulation step. No-op once the game is over.
    pub fn tick(&mut self, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        if let Some(interval) = self.ramp.check(now) {
            debug!("speed up: tick interval {} ms", interval.as_millis());
            events.push(GameEvent::SpeedUp(interval));
        }
        match std::mem::replace(&mut self.phase, Phase::Spawning) {
            Phase::Spawning => events.push(self.spawn()),
            Phase::Falling(piece) => events.extend(self.advance(piece)),
            Phase::GameOver => self.phase = Phase::GameOver,
        }
        events
    }

    fn spawn(&mut self) -> GameEvent {
        let roll = SpawnRoll::roll(&mut self.dice);
        let col = roll.head_col();
        if self.board.collides(col, 0) {
            self.phase = Phase::GameOver;
            info!("spawn cell ({col}, 0) blocked; game over at {}", self.score);
            return GameEvent::GameOver { score: self.score };
        }
        let piece = roll.build(&mut self.dice);
        debug!("spawned length {} at column {col}", roll.length);
        self.phase = Phase::Falling(piece);
        GameEvent::Spawned {
            length: roll.length,
        }
    }

    /// Apply the pending nudge (or gravity) to the falling chain; lands it on collision.
    fn advance(&mut self, mut piece: Piece) -> Option<GameEvent> {
        let vertical = self.nudge.effective_vertical();
        let mut next_col = piece.head.col + self.nudge.horizontal;
        let mut next_row = piece.head.row + vertical;

        // Off the board: drop the override and fall straight down instead.
        if !self.board.in_bounds(next_col, next_row) {
            self.nudge.override_gravity = false;
            next_col = piece.head.col;
            next_row = piece.head.row + GRAVITY;
        }

        // Body is probed with the vertical step chosen before the wall check.
        let will_collide = self.board.collides(next_col, next_row)
            || piece
                .body
                .iter()
                .any(|seg| self.board.collides(seg.col, seg.row + vertical));
        if next_row >= self.board.rows || will_collide {
            return Some(self.land(piece));
        }

        if self.nudge.override_gravity {
            piece.slither_to(next_col, next_row);
        } else {
            piece.drop_to(next_col, next_row);
        }

        if self.board.collides(piece.head.col, piece.head.row) {
            return Some(self.land(piece));
        }

        self.nudge = Nudge::default();
        self.phase = Phase::Falling(piece);
        None
    }

    /// Freeze the chain, run one clear pass, score it. The pending nudge is kept
    /// and applies to the next chain's first move.
    fn land(&mut self, piece: Piece) -> GameEvent {
        let length = piece.len();
        self.board.extend(piece.into_landed());
        let report = self.board.clear_full_rows(&mut self.dice, self.stick_chance);
        let cleared = report.count();
        let points = clear_points(cleared);
        self.score += points;
        self.lines_cleared += cleared;
        self.pieces_landed += 1;
        self.phase = Phase::Spawning;
        debug!(
            "landed length {length}; cleared {cleared} (stuck {}), +{points}",
            report.stuck
        );
        GameEvent::Landed {
            cleared_rows: report.rows,
            stuck: report.stuck,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Shape, Tint, block};
    use crate::piece::Segment;
    use crate::ramp::RampConfig;
    use crate::rng::{Scripted, make_dice};

    fn game(dice: Scripted) -> GameState<Scripted> {
        GameState::new(&GameConfig::default(), dice, Instant::now())
    }

    fn seg(col: i32, row: i32) -> Segment {
        Segment {
            col,
            row,
            tint: Tint::Green(200),
        }
    }

    fn head_at(state: &GameState<Scripted>) -> (i32, i32) {
        let piece = state.piece().expect("piece should be falling");
        (piece.head.col, piece.head.row)
    }

    #[test]
    fn test_spawn_then_forced_landing() {
        let mut state = game(Scripted::constant(0.0));
        let now = Instant::now();
        let events = state.tick(now);
        assert_eq!(events, vec![GameEvent::Spawned { length: 3 }]);
        assert_eq!(head_at(&state), (3, 0));

        let bottom = state.board.rows - 1;
        if let Phase::Falling(piece) = &mut state.phase {
            piece.head.row = bottom;
        }
        let events = state.tick(now);
        assert!(matches!(events.as_slice(), [GameEvent::Landed { points: 0, .. }]));
        assert_eq!(state.phase, Phase::Spawning);

        let landed = state.board.blocks();
        assert_eq!(landed.len(), 3);
        assert_eq!(landed[0].shape, Shape::Head);
        assert_eq!((landed[0].col, landed[0].row), (3, bottom));
        assert_eq!(landed[1].shape, Shape::Body);
        assert_eq!(landed[2].shape, Shape::Tail);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut state = game(Scripted::constant(0.0));
        state.board.push(block(3, 0));
        state.score = 700;

        let events = state.tick(Instant::now());
        assert_eq!(events, vec![GameEvent::GameOver { score: 700 }]);
        assert!(state.is_over());

        // Ticking stops mattering once the game is over.
        assert!(state.tick(Instant::now()).is_empty());
        assert_eq!(state.score, 700);
        assert_eq!(state.board.blocks().len(), 1);
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut state = game(Scripted::constant(0.0));
        state.board.push(block(3, 0));
        state.score = 300;
        state.tick(Instant::now());
        assert!(state.is_over());

        let events = state.handle(Command::Restart(Instant::now()));
        assert_eq!(events, vec![GameEvent::Started]);
        assert_eq!(state.phase, Phase::Spawning);
        assert_eq!(state.score, 0);
        assert!(state.board.blocks().is_empty());
    }

    #[test]
    fn test_steer_ignored_while_spawning() {
        let mut state = game(Scripted::constant(0.0));
        state.handle(Command::Steer(Direction::Left));
        assert_eq!(state.nudge, Nudge::default());
    }

    #[test]
    fn test_sideways_nudge_slithers_without_gravity() {
        let mut state = game(Scripted::constant(0.0));
        let now = Instant::now();
        state.tick(now);
        state.handle(Command::Steer(Direction::Right));
        assert!(state.tick(now).is_empty());

        let piece = state.piece().expect("falling");
        let cells: Vec<(i32, i32)> = piece.segments().map(|s| (s.col, s.row)).collect();
        assert_eq!(cells, vec![(4, 0), (3, 0), (2, 0)]);
        assert_eq!(state.nudge, Nudge::default());

        state.tick(now);
        let piece = state.piece().expect("falling");
        let cells: Vec<(i32, i32)> = piece.segments().map(|s| (s.col, s.row)).collect();
        assert_eq!(cells, vec![(4, 1), (3, 1), (2, 1)]);
    }

    #[test]
    fn test_latest_key_wins() {
        let mut state = game(Scripted::constant(0.0));
        let now = Instant::now();
        state.tick(now);
        state.steer(Direction::Left);
        state.steer(Direction::Down);
        state.tick(now);
        // Down only: head moves one row, body follows the chain.
        let piece = state.piece().expect("falling");
        let cells: Vec<(i32, i32)> = piece.segments().map(|s| (s.col, s.row)).collect();
        assert_eq!(cells, vec![(3, 1), (3, 0), (2, 0)]);
    }

    #[test]
    fn test_wall_turns_nudge_into_gravity() {
        let mut state = game(Scripted::constant(0.0));
        state.phase = Phase::Falling(Piece {
            head: seg(0, 5),
            body: vec![seg(0, 4)],
        });
        state.steer(Direction::Left);
        assert!(state.tick(Instant::now()).is_empty());

        let piece = state.piece().expect("falling");
        assert_eq!((piece.head.col, piece.head.row), (0, 6));
        assert_eq!((piece.body[0].col, piece.body[0].row), (0, 5));
        assert!(!state.nudge.override_gravity);
    }

    #[test]
    fn test_wall_bump_probes_body_without_gravity() {
        // The body is checked one step sideways (no fall), then dropped a row,
        // so it can end up sharing a cell with a landed block.
        let mut state = game(Scripted::constant(0.0));
        state.board.push(block(1, 6));
        state.phase = Phase::Falling(Piece {
            head: seg(0, 5),
            body: vec![seg(1, 5)],
        });
        state.steer(Direction::Left);
        assert!(state.tick(Instant::now()).is_empty());

        let piece = state.piece().expect("still falling");
        assert_eq!((piece.head.col, piece.head.row), (0, 6));
        assert_eq!((piece.body[0].col, piece.body[0].row), (1, 6));
        assert!(state.board.block_at(1, 6).is_some());
    }

    #[test]
    fn test_body_collision_lands_chain() {
        let mut state = game(Scripted::constant(0.0));
        state.board.push(block(1, 6));
        state.phase = Phase::Falling(Piece {
            head: seg(2, 5),
            body: vec![seg(1, 5)],
        });
        let events = state.tick(Instant::now());
        assert!(matches!(events.as_slice(), [GameEvent::Landed { .. }]));
        assert!(state.board.block_at(2, 5).is_some());
        assert!(state.board.block_at(1, 5).is_some());
    }

    #[test]
    fn test_pending_key_carries_over_landing() {
        let mut state = game(Scripted::constant(0.0));
        let now = Instant::now();
        state.board.push(block(4, 10));
        state.phase = Phase::Falling(Piece {
            head: seg(3, 10),
            body: Vec::new(),
        });
        state.steer(Direction::Right);
        let events = state.tick(now);
        assert!(matches!(events.as_slice(), [GameEvent::Landed { .. }]));

        state.tick(now);
        assert_eq!(head_at(&state), (3, 0));
        state.tick(now);
        assert_eq!(head_at(&state), (4, 0));
    }

    #[test]
    fn test_completing_row_with_full_stick_chance() {
        let config = GameConfig {
            stick_chance: 1.0,
            ..GameConfig::default()
        };
        let mut state = GameState::new(&config, Scripted::constant(0.5), Instant::now());
        let bottom = state.board.rows - 1;
        for col in (0..state.board.cols).filter(|&c| c != 3) {
            state.board.push(block(col, bottom));
        }
        state.phase = Phase::Falling(Piece {
            head: seg(3, bottom - 1),
            body: Vec::new(),
        });

        let now = Instant::now();
        assert!(state.tick(now).is_empty());
        let events = state.tick(now);
        assert_eq!(
            events,
            vec![GameEvent::Landed {
                cleared_rows: vec![bottom],
                stuck: state.board.cols as u32,
                points: 100,
            }]
        );
        assert_eq!(state.score, 100);
        assert!(state.board.row_is_full(bottom));
        assert!(state.board.blocks().iter().all(|b| b.is_sticky()));
    }

    #[test]
    fn test_incomplete_row_scores_nothing() {
        let mut state = game(Scripted::constant(0.0));
        let bottom = state.board.rows - 1;
        for col in (0..state.board.cols).filter(|&c| c != 3 && c != 9) {
            state.board.push(block(col, bottom));
        }
        state.board.push(block(0, bottom - 1));
        state.phase = Phase::Falling(Piece {
            head: seg(3, bottom),
            body: Vec::new(),
        });
        state.tick(Instant::now());
        assert_eq!(state.score, 0);
        assert!(state.board.block_at(0, bottom - 1).is_some());
    }

    #[test]
    fn test_ramp_reports_speed_up() {
        let config = GameConfig {
            ramp: RampConfig {
                start: Duration::from_millis(150),
                ..RampConfig::default()
            },
            ..GameConfig::default()
        };
        let t0 = Instant::now();
        let mut state = GameState::new(&config, Scripted::constant(0.0), t0);
        let events = state.tick(t0 + Duration::from_secs(11));
        assert_eq!(events[0], GameEvent::SpeedUp(Duration::from_millis(140)));
        assert_eq!(state.interval(), Duration::from_millis(140));
    }

    #[test]
    fn test_random_play_keeps_blocks_on_board() {
        let mut state = GameState::new(&GameConfig::default(), make_dice(Some(11)), Instant::now());
        let mut keys = make_dice(Some(12));
        let now = Instant::now();
        let mut games = 0;
        for _ in 0..5000 {
            match keys.below(6) {
                0 => state.steer(Direction::Left),
                1 => state.steer(Direction::Right),
                2 => state.steer(Direction::Down),
                _ => {}
            }
            let events = state.tick(now);
            if events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })) {
                games += 1;
                state.restart(now);
            }
            let board = &state.board;
            assert!(board.blocks().iter().all(|b| board.in_bounds(b.col, b.row)));
            if let Some(piece) = state.piece() {
                assert!(piece.segments().all(|s| board.in_bounds(s.col, s.row)));
            }
        }
        assert!(games > 0);
    }
}
