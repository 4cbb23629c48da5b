//! Schema versions for the score book file.

use serde::{Deserialize, Serialize};

/// `major.minor.patch` version stamped into persisted data.
///
/// Only the major number gates reading: minor and patch bumps add optional
/// fields that older readers skip and newer readers default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Breaking layout changes
    pub major: u16,
    /// Added fields
    pub minor: u16,
    /// Fixes
    pub patch: u16,
}

impl SchemaVersion {
    /// Score book layout written by this build.
    pub const SCORE_BOOK: Self = Self::new(1, 0, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }

    /// Whether a reader at this version understands data written at `stored`.
    #[must_use]
    pub const fn can_read(&self, stored: &Self) -> bool {
        self.major == stored.major
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
