//! Error types for Marrow Grow.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for grow-cycle operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrowError {
    /// Seed or soil was not chosen before starting a cycle
    #[error("Missing selection: {0} must be chosen before a cycle can start")]
    MissingSelection(&'static str),

    /// A cycle is already growing
    #[error("A grow cycle is already active")]
    CycleActive,

    /// Operation needs a cycle that does not exist
    #[error("No grow cycle is active")]
    NoActiveCycle,

    /// Harvest requested before the plant matured
    #[error("Plant has not matured yet")]
    NotReady,

    /// Game speed outside the supported set
    #[error("Unsupported game speed: {0}x (expected 1, 2, 3 or 10)")]
    InvalidSpeed(u32),

    /// Unknown seed key
    #[error("Unknown seed type: {0}")]
    UnknownSeed(String),

    /// Unknown soil key
    #[error("Unknown soil type: {0}")]
    UnknownSoil(String),

    /// Unknown nutrient mix key
    #[error("Unknown nutrient mix: {0}")]
    UnknownMix(String),

    /// Lives gate rejected the request
    #[error("Lockout: {0}")]
    Lockout(#[from] LockoutError),
}

/// Lives/lockout gate errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockoutError {
    /// No lives left and the lockout has not expired yet
    #[error("Out of seeds, come back in {}s", remaining.as_secs())]
    OutOfLives {
        /// Time left until lives are restored
        remaining: Duration,
    },
}

impl LockoutError {
    /// Returns the remaining lockout duration.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        match self {
            Self::OutOfLives { remaining } => *remaining,
        }
    }
}

/// Persistence errors raised by score stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Schema version mismatch
    #[error("Score book version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for grow operations.
pub type GrowResult<T> = Result<T, GrowError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
