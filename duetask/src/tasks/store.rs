//! In-memory task store with one lock per identity.

use duetask_proto::Identity;
use parking_lot::RwLock;

use super::{StoreError, Task, TaskPatch};

/// Owns every identity's ordered task list.
///
/// Each identity has its own [`RwLock`], so mutations to one identity's list
/// are serialized against each other while the other identity proceeds
/// independently. Readers get a cloned snapshot taken under the read lock and
/// therefore never observe a half-applied mutation.
pub struct TaskStore {
    lists: [RwLock<Vec<Task>>; 2],
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates a store with an empty list for every identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: [RwLock::new(Vec::new()), RwLock::new(Vec::new())],
        }
    }

    const fn slot(&self, identity: Identity) -> &RwLock<Vec<Task>> {
        match identity {
            Identity::A => &self.lists[0],
            Identity::B => &self.lists[1],
        }
    }

    /// Returns a snapshot of the identity's tasks in insertion order.
    #[must_use]
    pub fn list(&self, identity: Identity) -> Vec<Task> {
        self.slot(identity).read().clone()
    }

    /// Returns the number of tasks the identity currently has.
    #[must_use]
    pub fn len(&self, identity: Identity) -> usize {
        self.slot(identity).read().len()
    }

    /// Returns `true` if the identity has no tasks.
    #[must_use]
    pub fn is_empty(&self, identity: Identity) -> bool {
        self.slot(identity).read().is_empty()
    }

    /// Appends a task to the end of the identity's list.
    pub fn append(&self, identity: Identity, task: Task) {
        let mut tasks = self.slot(identity).write();
        tasks.push(task);
        tracing::debug!(identity = %identity, len = tasks.len(), "task appended");
    }

    /// Merges `patch` into the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfRange`] if `index` is not valid for
    /// the list as it is now; the list is left unchanged.
    pub fn update(&self, identity: Identity, index: usize, patch: TaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.slot(identity).write();
        let len = tasks.len();
        let task = tasks
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        patch.apply(task);
        drop(tasks);
        tracing::debug!(identity = %identity, index, "task updated");
        Ok(())
    }

    /// Removes and returns the task at `index`, shifting later tasks down.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfRange`] if `index` is not valid for
    /// the list as it is now; the list is left unchanged.
    pub fn delete(&self, identity: Identity, index: usize) -> Result<Task, StoreError> {
        let mut tasks = self.slot(identity).write();
        let len = tasks.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        let removed = tasks.remove(index);
        drop(tasks);
        tracing::debug!(identity = %identity, index, "task deleted");
        Ok(removed)
    }

    /// Empties the identity's list.
    pub fn clear(&self, identity: Identity) {
        let removed = std::mem::take(&mut *self.slot(identity).write()).len();
        tracing::debug!(identity = %identity, removed, "tasks cleared");
    }
}
