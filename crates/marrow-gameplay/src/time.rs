//! Game speed and the periodic tick cadence.
//!
//! The speed multiplier only changes how often ticks fire. Deferred tasks
//! keep running on wall-clock time.

use std::time::Duration;

use marrow_common::{GrowError, Timestamp};
use serde::{Deserialize, Serialize};

/// Supported game speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GameSpeed {
    /// One tick per second.
    #[default]
    X1,
    /// Two ticks per second.
    X2,
    /// Three ticks per second.
    X3,
    /// Ten ticks per second.
    X10,
}

impl GameSpeed {
    /// Every speed, slowest first.
    pub const ALL: [Self; 4] = [Self::X1, Self::X2, Self::X3, Self::X10];

    /// Speed multiplier.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X3 => 3,
            Self::X10 => 10,
        }
    }

    /// Wall-clock time between ticks.
    #[must_use]
    pub const fn tick_interval(self) -> Duration {
        Duration::from_millis(1000 / self.multiplier() as u64)
    }

    /// Next speed in the toggle order, wrapping back to 1x.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::X1 => Self::X2,
            Self::X2 => Self::X3,
            Self::X3 => Self::X10,
            Self::X10 => Self::X1,
        }
    }
}

impl TryFrom<u32> for GameSpeed {
    type Error = GrowError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            3 => Ok(Self::X3),
            10 => Ok(Self::X10),
            other => Err(GrowError::InvalidSpeed(other)),
        }
    }
}

impl From<GameSpeed> for u32 {
    fn from(speed: GameSpeed) -> Self {
        speed.multiplier()
    }
}

impl std::fmt::Display for GameSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// Schedule of the periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickCadence {
    speed: GameSpeed,
    next_tick: Option<Timestamp>,
}

impl TickCadence {
    /// Create a stopped cadence.
    #[must_use]
    pub const fn new(speed: GameSpeed) -> Self {
        Self {
            speed,
            next_tick: None,
        }
    }

    /// Current speed.
    #[must_use]
    pub const fn speed(&self) -> GameSpeed {
        self.speed
    }

    /// Whether ticks are being scheduled.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Due time of the next tick, if running.
    #[must_use]
    pub const fn next_due(&self) -> Option<Timestamp> {
        self.next_tick
    }

    /// Start ticking one interval after `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.next_tick = Some(now.after(self.speed.tick_interval()));
    }

    /// Switch speed. A running cadence restarts one new interval after `now`.
    pub fn restart(&mut self, now: Timestamp, speed: GameSpeed) {
        self.speed = speed;
        if self.is_running() {
            self.start(now);
        }
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Consume the next tick if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<Timestamp> {
        let due = self.next_tick.filter(|due| *due <= now)?;
        self.next_tick = Some(due.after(self.speed.tick_interval()));
        Some(due)
    }
}
