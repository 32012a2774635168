//! Falling chain: head + body segments, spawning and one-tick nudges.

use crate::board::{HEAD_TINT, LandedBlock, Shape, Tint};
use crate::rng::Dice;

/// Downward step applied every tick unless the player overrides it.
pub const GRAVITY: i32 = 1;

/// Chain length range (inclusive) and horizontal spawn offset range.
pub const MIN_LENGTH: u32 = 3;
pub const MAX_LENGTH: u32 = 7;
pub const MAX_OFFSET: u32 = 4;

/// Narrowest board that fits every spawn.
pub const MIN_COLS: i32 = (MAX_LENGTH + MAX_OFFSET + 1) as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub col: i32,
    pub row: i32,
    pub tint: Tint,
}

/// The player-controlled chain. `body[0]` trails the head directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub head: Segment,
    pub body: Vec<Segment>,
}

impl Piece {
    pub fn len(&self) -> usize {
        self.body.len() + 1
    }

    /// Head first, then body towards the tail.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        std::iter::once(&self.head).chain(self.body.iter())
    }

    /// Freeze into landed blocks tagged by chain position.
    pub fn into_landed(self) -> Vec<LandedBlock> {
        let last = self.body.len();
        self.segments()
            .enumerate()
            .map(|(i, seg)| LandedBlock {
                col: seg.col,
                row: seg.row,
                shape: if i == 0 {
                    Shape::Head
                } else if i == last {
                    Shape::Tail
                } else {
                    Shape::Body
                },
                tint: seg.tint,
            })
            .collect()
    }

    /// Snake-style follow: every segment takes its predecessor's cell and the
    /// head goes to `(col, row)`.
    pub fn slither_to(&mut self, col: i32, row: i32) {
        for i in (1..self.body.len()).rev() {
            self.body[i].col = self.body[i - 1].col;
            self.body[i].row = self.body[i - 1].row;
        }
        if let Some(first) = self.body.first_mut() {
            first.col = self.head.col;
            first.row = self.head.row;
        }
        self.head.col = col;
        self.head.row = row;
    }

    /// Passive fall: body drops straight down, head goes to `(col, row)`.
    pub fn drop_to(&mut self, col: i32, row: i32) {
        for seg in &mut self.body {
            seg.row += GRAVITY;
        }
        self.head.col = col;
        self.head.row = row;
    }
}

/// Dice outcome for a new chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRoll {
    pub length: u32,
    pub offset: u32,
}

impl SpawnRoll {
    pub fn roll<D: Dice + ?Sized>(dice: &mut D) -> Self {
        let length = MIN_LENGTH + dice.below(MAX_LENGTH - MIN_LENGTH + 1);
        let offset = dice.below(MAX_OFFSET + 1);
        Self { length, offset }
    }

    /// Head column; the body trails to the left of it on row 0.
    pub fn head_col(&self) -> i32 {
        (self.length + self.offset) as i32
    }

    /// Lay out the chain on the top row, shading each body segment a little darker.
    pub fn build<D: Dice + ?Sized>(&self, dice: &mut D) -> Piece {
        let col = self.head_col();
        let body = (1..self.length)
            .map(|i| Segment {
                col: col - i as i32,
                row: 0,
                tint: Tint::Green(body_shade(i, dice.roll())),
            })
            .collect();
        Piece {
            head: Segment {
                col,
                row: 0,
                tint: HEAD_TINT,
            },
            body,
        }
    }
}

/// Green channel `255 - roll*50 - 25*i`.
fn body_shade(i: u32, roll: f64) -> u8 {
    let g = 255.0 - roll * 50.0 - f64::from(i) * 25.0;
    g.clamp(0.0, 255.0) as u8
}

/// Key direction for a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
    /// Disabled; accepted and ignored.
    Up,
}

/// One-tick input. `override_gravity` replaces the gravity step with `vertical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nudge {
    pub horizontal: i32,
    pub vertical: i32,
    pub override_gravity: bool,
}

impl Nudge {
    /// Nudge for a key; the latest key replaces any earlier one.
    pub fn from_direction(dir: Direction) -> Option<Self> {
        let (horizontal, vertical) = match dir {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Up => return None,
        };
        Some(Self {
            horizontal,
            vertical,
            override_gravity: true,
        })
    }

    pub fn effective_vertical(&self) -> i32 {
        if self.override_gravity {
            self.vertical
        } else {
            GRAVITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Scripted, make_dice};

    #[test]
    fn test_spawn_rolls_stay_in_range() {
        let mut dice = make_dice(Some(2024));
        for _ in 0..1000 {
            let roll = SpawnRoll::roll(&mut dice);
            assert!((MIN_LENGTH..=MAX_LENGTH).contains(&roll.length));
            assert!(roll.offset <= MAX_OFFSET);
            let piece = roll.build(&mut dice);
            assert_eq!(piece.body.len(), roll.length as usize - 1);
            assert_eq!(piece.head.col, roll.head_col());
            assert!(piece.segments().all(|s| s.row == 0 && s.col >= 0 && s.col < MIN_COLS));
        }
    }

    #[test]
    fn test_spawn_rolls_cover_every_value() {
        let mut dice = make_dice(Some(9));
        let mut lengths = [false; 8];
        let mut offsets = [false; 5];
        for _ in 0..1000 {
            let roll = SpawnRoll::roll(&mut dice);
            lengths[roll.length as usize] = true;
            offsets[roll.offset as usize] = true;
        }
        assert!(lengths[3..].iter().all(|&seen| seen));
        assert!(offsets.iter().all(|&seen| seen));
    }

    #[test]
    fn test_body_trails_left_with_darker_shades() {
        let roll = SpawnRoll { length: 4, offset: 2 };
        let piece = roll.build(&mut Scripted::constant(0.0));
        let cols: Vec<i32> = piece.segments().map(|s| s.col).collect();
        assert_eq!(cols, vec![6, 5, 4, 3]);
        assert_eq!(piece.head.tint, HEAD_TINT);
        let shades: Vec<Tint> = piece.body.iter().map(|s| s.tint).collect();
        assert_eq!(shades, vec![Tint::Green(230), Tint::Green(205), Tint::Green(180)]);
    }

    #[test]
    fn test_into_landed_tags_head_body_tail() {
        let piece = SpawnRoll { length: 5, offset: 0 }.build(&mut Scripted::constant(0.5));
        let shapes: Vec<Shape> = piece.into_landed().iter().map(|b| b.shape).collect();
        assert_eq!(
            shapes,
            vec![Shape::Head, Shape::Body, Shape::Body, Shape::Body, Shape::Tail]
        );
    }

    #[test]
    fn test_slither_follows_the_head() {
        let mut piece = SpawnRoll { length: 3, offset: 0 }.build(&mut Scripted::constant(0.0));
        // head (3,0), body (2,0) (1,0)
        piece.slither_to(3, 1);
        let cells: Vec<(i32, i32)> = piece.segments().map(|s| (s.col, s.row)).collect();
        assert_eq!(cells, vec![(3, 1), (3, 0), (2, 0)]);
    }

    #[test]
    fn test_drop_moves_every_segment_down() {
        let mut piece = SpawnRoll { length: 3, offset: 1 }.build(&mut Scripted::constant(0.0));
        piece.drop_to(4, 1);
        let cells: Vec<(i32, i32)> = piece.segments().map(|s| (s.col, s.row)).collect();
        assert_eq!(cells, vec![(4, 1), (3, 1), (2, 1)]);
    }

    #[test]
    fn test_up_is_ignored() {
        assert_eq!(Nudge::from_direction(Direction::Up), None);
        let down = Nudge::from_direction(Direction::Down).unwrap_or_default();
        assert_eq!(down.effective_vertical(), 1);
        let left = Nudge::from_direction(Direction::Left).unwrap_or_default();
        assert_eq!(left.effective_vertical(), 0);
        assert_eq!(Nudge::default().effective_vertical(), GRAVITY);
    }
}
