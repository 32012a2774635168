//! Difficulty ramp: wall-clock driven speed-up of the tick interval.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampConfig {
    pub start: Duration,
    pub floor: Duration,
    pub step: Duration,
    pub period: Duration,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            start: Duration::from_millis(100),
            floor: Duration::from_millis(100),
            step: Duration::from_millis(10),
            period: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ramp {
    config: RampConfig,
    interval: Duration,
    since: Instant,
}

impl Ramp {
    pub fn new(config: RampConfig, now: Instant) -> Self {
        Self {
            config,
            interval: config.start,
            since: now,
        }
    }

    /// Current tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reset(&mut self, now: Instant) {
        self.interval = self.config.start;
        self.since = now;
    }

    /// Speeds up by one step once a full period has passed and the interval is
    /// still above the floor. Returns the new interval when it changed.
    pub fn check(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed <= self.config.period || self.interval <= self.config.floor {
            return None;
        }
        self.interval = self
            .interval
            .saturating_sub(self.config.step)
            .max(self.config.floor);
        self.since = now;
        Some(self.interval)
    }
}
