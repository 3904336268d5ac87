//! Per-identity task lists.
//!
//! Tasks are addressed positionally: index `i` is the `i`-th task of the
//! identity's list in insertion order. An index is only meaningful until the
//! next structural change to that list, so every index-taking operation
//! revalidates it against the current length.

pub mod store;

pub use store::TaskStore;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Maximum allowed task name length in characters.
pub const MAX_TASK_NAME_LENGTH: usize = 256;

/// Errors returned by [`TaskStore`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The index does not address a task in the current list.
    #[error("task index {index} out of range (list has {len} tasks)")]
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// List length at the time of the check.
        len: usize,
    },
}

/// A single task owned by one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Free-text name, never empty.
    pub name: String,
    /// Local wall-clock deadline, minute precision.
    pub deadline: NaiveDateTime,
    /// Whether the task has been marked done.
    pub done: bool,
}

impl Task {
    /// Creates a pending task.
    pub fn new(name: impl Into<String>, deadline: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            deadline,
            done: false,
        }
    }
}

/// Partial update merged into an existing task by [`TaskStore::update`].
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement deadline.
    pub deadline: Option<NaiveDateTime>,
    /// Replacement completion flag.
    pub done: Option<bool>,
}

impl TaskPatch {
    /// A patch that only marks the task done.
    #[must_use]
    pub const fn mark_done() -> Self {
        Self {
            name: None,
            deadline: None,
            done: Some(true),
        }
    }

    /// A patch that rewrites name and deadline, leaving `done` alone.
    #[must_use]
    pub const fn rename(name: String, deadline: NaiveDateTime) -> Self {
        Self {
            name: Some(name),
            deadline: Some(deadline),
            done: None,
        }
    }

    fn apply(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(done) = self.done {
            task.done = done;
        }
    }
}
