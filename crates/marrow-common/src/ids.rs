//! ID types for growers and grow cycles.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for cycle IDs.
static CYCLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a player. Records, lives and lockouts are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowerId(String);

impl GrowerId {
    /// Creates a grower ID from a display name.
    ///
    /// Surrounding whitespace is trimmed. Returns `None` for blank names.
    #[must_use]
    pub fn new(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the grower name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GrowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one seed-to-harvest playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(u64);

impl CycleId {
    /// Creates a new unique cycle ID.
    #[must_use]
    pub fn next() -> Self {
        Self(CYCLE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a cycle ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}
