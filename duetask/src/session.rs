//! Per-actor conversation state.
//!
//! Every actor gets one [`Session`] holding the identity it selected, the
//! step of the flow it is in, and the task draft under construction. Sessions
//! live behind their own async mutex so that all events from one actor are
//! handled one at a time, while different actors never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use duetask_proto::{ActorId, Identity};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Where an actor is inside a multi-step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Waiting for the task name as free text.
    AwaitingName,
    /// Waiting for a date from the date picker.
    AwaitingDate,
    /// Waiting for a time from the time picker.
    AwaitingTime,
}

/// A task under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Name entered by the actor.
    pub name: Option<String>,
    /// Date picked by the actor.
    pub date: Option<NaiveDate>,
    /// Index of the task being edited; `None` for a new task.
    pub edit_index: Option<usize>,
}

impl TaskDraft {
    /// Draft for a brand new task.
    #[must_use]
    pub fn new_task() -> Self {
        Self::default()
    }

    /// Draft that will overwrite the task at `index` on commit.
    #[must_use]
    pub fn editing(index: usize) -> Self {
        Self {
            edit_index: Some(index),
            ..Self::default()
        }
    }

    fn merge(&mut self, fields: Self) {
        if fields.name.is_some() {
            self.name = fields.name;
        }
        if fields.date.is_some() {
            self.date = fields.date;
        }
        if fields.edit_index.is_some() {
            self.edit_index = fields.edit_index;
        }
    }
}

/// Transient state of one actor.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
    step: Option<Step>,
    draft: Option<TaskDraft>,
}

impl Session {
    /// Sets or overwrites the active identity. Any draft is left in place.
    pub fn select_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    /// Returns the active identity, if one has been selected.
    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Sets the pending step; `None` means "at rest in the menu".
    pub fn set_step(&mut self, step: Option<Step>) {
        self.step = step;
    }

    /// Returns the pending step.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        self.step
    }

    /// Starts a new draft, discarding any unfinished one.
    pub fn start_draft(&mut self, fields: TaskDraft) {
        if self.draft.is_some() {
            tracing::debug!("discarding unfinished draft");
        }
        self.draft = Some(fields);
    }

    /// Merges `fields` into the current draft, creating it if needed.
    pub fn merge_draft(&mut self, fields: TaskDraft) -> &TaskDraft {
        let draft = self.draft.get_or_insert_with(TaskDraft::default);
        draft.merge(fields);
        draft
    }

    /// Returns the current draft without removing it.
    #[must_use]
    pub const fn draft(&self) -> Option<&TaskDraft> {
        self.draft.as_ref()
    }

    /// Removes and returns the draft. A second call returns `None`, so a
    /// draft can be committed at most once.
    pub fn take_draft(&mut self) -> Option<TaskDraft> {
        self.draft.take()
    }
}

/// Shared handle to one actor's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Registry of all actor sessions.
///
/// The outer map lock is only held long enough to look up or insert a
/// handle; all real work happens under the per-actor lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: parking_lot::Mutex<HashMap<ActorId, SessionHandle>>,
}

impl SessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actor's session handle, creating an empty session for a
    /// never-seen actor.
    pub fn handle(&self, actor: ActorId) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        Arc::clone(sessions.entry(actor).or_default())
    }

    /// Locks the actor's session for the duration of one event.
    pub async fn lock(&self, actor: ActorId) -> OwnedMutexGuard<Session> {
        self.handle(actor).lock_owned().await
    }

    /// Sets or overwrites the actor's identity.
    pub async fn select_identity(&self, actor: ActorId, identity: Identity) {
        self.lock(actor).await.select_identity(identity);
    }

    /// Returns the actor's identity, if any.
    pub async fn get_identity(&self, actor: ActorId) -> Option<Identity> {
        self.lock(actor).await.identity()
    }

    /// Sets the actor's pending step.
    pub async fn set_step(&self, actor: ActorId, step: Option<Step>) {
        self.lock(actor).await.set_step(step);
    }

    /// Returns the actor's pending step.
    pub async fn get_step(&self, actor: ActorId) -> Option<Step> {
        self.lock(actor).await.step()
    }

    /// Starts a fresh draft for the actor, discarding any previous one.
    pub async fn start_draft(&self, actor: ActorId, fields: TaskDraft) {
        self.lock(actor).await.start_draft(fields);
    }

    /// Merges fields into the actor's draft and returns the result.
    pub async fn merge_draft(&self, actor: ActorId, fields: TaskDraft) -> TaskDraft {
        self.lock(actor).await.merge_draft(fields).clone()
    }

    /// Removes and returns the actor's draft.
    pub async fn take_draft(&self, actor: ActorId) -> Option<TaskDraft> {
        self.lock(actor).await.take_draft()
    }

    /// Lists every actor that has selected an identity, ordered by actor id.
    ///
    /// Each session is read under its own lock, so an actor in the middle of
    /// an event is observed either before or after that event.
    pub async fn known_actors(&self) -> Vec<(ActorId, Identity)> {
        let handles: Vec<(ActorId, SessionHandle)> = self
            .sessions
            .lock()
            .iter()
            .map(|(actor, handle)| (*actor, Arc::clone(handle)))
            .collect();

        let mut known = Vec::with_capacity(handles.len());
        for (actor, handle) in handles {
            if let Some(identity) = handle.lock().await.identity() {
                known.push((actor, identity));
            }
        }
        known.sort_unstable_by_key(|(actor, _)| *actor);
        known
    }
}
