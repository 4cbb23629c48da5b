//! Deferred wall-clock tasks.
//!
//! Event resolutions, the act-of-god timer and the harvest-window deadline
//! are scheduled here against wall-clock time, independent of the tick
//! cadence. Ending a cycle cancels everything still queued.

use std::collections::{BTreeMap, HashMap};

use marrow_common::Timestamp;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Queue of tasks ordered by due time, then by scheduling order.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    tasks: BTreeMap<(Timestamp, u64), T>,
    due_by_id: HashMap<u64, Timestamp>,
    next_id: u64,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            due_by_id: HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to run at `due`.
    pub fn schedule(&mut self, due: Timestamp, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert((due, id), task);
        self.due_by_id.insert(id, due);
        TaskHandle(id)
    }

    /// Cancel one task. Returns it if it was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let due = self.due_by_id.remove(&handle.0)?;
        self.tasks.remove(&(due, handle.0))
    }

    /// Cancel every pending task. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        self.due_by_id.clear();
        count
    }

    /// Whether the task behind `handle` is still pending.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.due_by_id.contains_key(&handle.0)
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Timestamp> {
        self.tasks.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(Timestamp, T)> {
        let (&(due, id), _) = self.tasks.iter().next()?;
        if due > now {
            return None;
        }
        self.due_by_id.remove(&id);
        self.tasks.remove(&(due, id)).map(|task| (due, task))
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
