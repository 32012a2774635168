//! Random source for spawning and sticky rolls, injectable so tests can pin outcomes.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Source of uniform randomness used by the engine.
pub trait Dice {
    /// Uniform float in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform integer in `[0, n)`. `n` must be non-zero.
    fn below(&mut self, n: u32) -> u32 {
        let pick = (self.roll() * f64::from(n)) as u32;
        pick.min(n.saturating_sub(1))
    }
}

impl Dice for StdRng {
    fn roll(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn below(&mut self, n: u32) -> u32 {
        self.random_range(0..n)
    }
}

/// Seeded generator when `seed` is given, OS entropy otherwise.
pub fn make_dice(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Replays a fixed list of rolls, cycling when exhausted.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Scripted {
    rolls: Vec<f64>,
    pos: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: rolls.to_vec(),
            pos: 0,
        }
    }

    /// Always returns the same roll.
    pub fn constant(roll: f64) -> Self {
        Self::new(&[roll])
    }
}

#[cfg(test)]
impl Dice for Scripted {
    fn roll(&mut self) -> f64 {
        let r = self.rolls[self.pos % self.rolls.len()];
        self.pos += 1;
        r
    }
}
