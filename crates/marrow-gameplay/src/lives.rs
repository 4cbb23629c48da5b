//! Lives and the lockout gate.
//!
//! Starting a cycle costs one life (a seed). Running out starts a lockout;
//! once it expires the grower gets a fresh set of lives.

use std::time::Duration;

use marrow_common::{LockoutError, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-grower life counter and lockout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeLedger {
    lives: u32,
    locked_since: Option<Timestamp>,
}

impl LifeLedger {
    /// New grower with `starting` lives.
    #[must_use]
    pub const fn new(starting: u32) -> Self {
        Self {
            lives: starting,
            locked_since: None,
        }
    }

    /// Lives left.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// When the current lockout started, if any.
    #[must_use]
    pub const fn locked_since(&self) -> Option<Timestamp> {
        self.locked_since
    }

    /// Time left before lives are restored. Zero when not locked out.
    #[must_use]
    pub fn remaining_lockout(&self, now: Timestamp, lockout: Duration) -> Duration {
        match self.locked_since {
            Some(since) if self.lives == 0 => lockout.saturating_sub(now.since(since)),
            _ => Duration::ZERO,
        }
    }

    /// Check whether a cycle may start, restoring lives if the lockout expired.
    pub fn admit(&mut self, now: Timestamp, starting: u32, lockout: Duration) -> Result<(), LockoutError> {
        if self.lives > 0 {
            return Ok(());
        }
        let since = *self.locked_since.get_or_insert(now);
        let elapsed = now.since(since);
        if elapsed >= lockout {
            self.lives = starting;
            self.locked_since = None;
            info!("Lockout expired, lives restored to {}", starting);
            return Ok(());
        }
        Err(LockoutError::OutOfLives {
            remaining: lockout - elapsed,
        })
    }

    /// Spend one life to start a cycle. Returns the lives left.
    pub fn consume(&mut self, now: Timestamp, starting: u32, lockout: Duration) -> Result<u32, LockoutError> {
        self.admit(now, starting, lockout)?;
        self.lives -= 1;
        if self.lives == 0 {
            self.locked_since = Some(now);
            info!("Out of lives, lockout started at {}", now);
        }
        Ok(self.lives)
    }

    /// Give back a life spent on a cycle that never started.
    pub fn refund(&mut self) {
        self.grant(1);
    }

    /// Add lives, e.g. from harvest seed rewards. Clears a pending lockout.
    pub fn grant(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.lives = self.lives.saturating_add(count);
        self.locked_since = None;
    }
}
