//! In-game event log and the notice bus.
//!
//! The [`EventLog`] is what the grower reads: at most ten messages, most
//! recent first. The [`NoticeBus`] carries lifecycle notices to whatever
//! drives the session (a renderer, the headless runner, tests).

use std::collections::VecDeque;

use crossbeam_channel::{bounded, Receiver, Sender};
use marrow_common::CycleId;
use serde::{Deserialize, Serialize};

use crate::catalog::SeedKind;
use crate::plant::GrowthStage;

/// Maximum number of entries kept in the event log.
pub const EVENT_LOG_CAPACITY: usize = 10;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    #[default]
    Info,
    /// Something needs attention.
    Warning,
    /// Something hurt the plant.
    Error,
    /// One-shot disaster, deflected or not.
    ActOfGod,
}

impl Severity {
    /// Get the display name of this severity.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::ActOfGod => "GOD",
        }
    }
}

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Message shown to the grower.
    pub message: String,
    /// Severity.
    pub severity: Severity,
}

/// Bounded, most-recent-first event log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    #[serde(skip)]
    pushed: u64,
}

impl EventLog {
    /// Add a message at the front, dropping the oldest past capacity.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        self.entries.push_front(LogEntry {
            message: message.into(),
            severity,
        });
        self.entries.truncate(EVENT_LOG_CAPACITY);
        self.pushed += 1;
    }

    /// Number of messages ever pushed. Use as a mark for [`EventLog::since`].
    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// Entries pushed after `mark` that are still retained, oldest first.
    #[must_use]
    pub fn since(&self, mark: u64) -> Vec<LogEntry> {
        let fresh = usize::try_from(self.pushed.saturating_sub(mark)).unwrap_or(usize::MAX);
        self.entries
            .iter()
            .take(fresh)
            .rev()
            .cloned()
            .collect()
    }

    /// Most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Copy of the entries, most recent first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Whether any entry contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.message.contains(needle))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// Harvested and scored.
    Harvested {
        /// Final potency.
        potency: u32,
        /// Final weight.
        weight: u32,
    },
    /// Health hit zero. Nothing was scored.
    Died,
    /// Reset before completion.
    Abandoned,
}

/// Lifecycle notices published by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrowNotice {
    /// A cycle was configured and started.
    CycleStarted {
        /// Cycle
        cycle: CycleId,
        /// Strain
        seed: SeedKind,
    },
    /// The plant entered a new stage.
    StageAdvanced {
        /// Cycle
        cycle: CycleId,
        /// New stage
        stage: GrowthStage,
    },
    /// A message was added to the event log.
    Logged {
        /// Cycle
        cycle: CycleId,
        /// Entry
        entry: LogEntry,
    },
    /// The plant matured and its stats were frozen.
    Matured {
        /// Cycle
        cycle: CycleId,
    },
    /// Seeds were awarded after a harvest.
    SeedsAwarded {
        /// Cycle
        cycle: CycleId,
        /// Strain of the seeds
        seed: SeedKind,
        /// Count
        count: u32,
    },
    /// The cycle ended.
    CycleEnded {
        /// Cycle
        cycle: CycleId,
        /// Outcome
        outcome: CycleOutcome,
    },
}

/// Bus for broadcasting notices to the session driver.
#[derive(Debug)]
pub struct NoticeBus {
    /// Sender for broadcasting notices
    sender: Sender<GrowNotice>,
    /// Receiver for collecting notices
    receiver: Receiver<GrowNotice>,
    /// Channel capacity
    capacity: usize,
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NoticeBus {
    /// Creates a new notice bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes a notice.
    pub fn publish(&self, notice: GrowNotice) {
        // Non-blocking send - if full, the notice is dropped
        let _ = self.sender.try_send(notice);
    }

    /// Drains all pending notices.
    pub fn drain(&self) -> Vec<GrowNotice> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending notices.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a receiver handle for consuming notices on another thread.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<GrowNotice> {
        self.receiver.clone()
    }
}
