//! Runs conversation effects against the session and the task store.

use std::sync::Arc;

use chrono::NaiveTime;
use duetask_proto::Identity;

use super::menus::{self, Menu};
use super::state::{ConversationState, Effect, Transition, transition};
use super::{ConversationError, Event, IdentityNames, Reply};
use crate::clock::Clock;
use crate::session::{Session, TaskDraft};
use crate::tasks::{MAX_TASK_NAME_LENGTH, StoreError, Task, TaskPatch, TaskStore};

const RESTART_PROMPT: &str = "Please use /start to begin.";

/// Interprets actor events and drives the add/edit flows.
///
/// The controller is stateless itself: everything it remembers lives in the
/// [`Session`] handed to [`handle`](Self::handle) and in the shared
/// [`TaskStore`]. Callers must hold the actor's session lock for the whole
/// call.
pub struct Controller {
    store: Arc<TaskStore>,
    clock: Arc<dyn Clock>,
    names: IdentityNames,
}

impl Controller {
    /// Creates a controller over the given store.
    pub fn new(store: Arc<TaskStore>, clock: Arc<dyn Clock>, names: IdentityNames) -> Self {
        Self {
            store,
            clock,
            names,
        }
    }

    /// The store this controller mutates.
    #[must_use]
    pub const fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Handles one event and returns the replies to show, in order.
    ///
    /// Never fails: stale indices, missing identities, and incomplete drafts
    /// are turned into a safe menu re-render.
    pub fn handle(&self, session: &mut Session, event: &Event) -> Vec<Reply> {
        let state = ConversationState::of(session);
        let Transition { effect, next } = transition(state, event);
        tracing::debug!(?state, ?effect, ?next, "conversation transition");

        match self.apply(session, state, effect) {
            Ok(replies) => {
                session.set_step(next.step());
                replies
            }
            Err(err) => self.recover(session, &err),
        }
    }

    fn apply(
        &self,
        session: &mut Session,
        state: ConversationState,
        effect: Effect,
    ) -> Result<Vec<Reply>, ConversationError> {
        let replies = match effect {
            Effect::ShowIdentityPicker => vec![Reply::send(
                "Who is using the bot?",
                Some(menus::render(Menu::IdentityPicker(&self.names))),
            )],
            Effect::SelectIdentity(identity) => {
                session.select_identity(identity);
                vec![Reply::replace(
                    format!("Welcome {}! Choose an action:", self.names.name(identity)),
                    Some(menus::render(Menu::Main)),
                )]
            }
            Effect::PromptRestart => {
                let keyboard = session
                    .identity()
                    .is_none()
                    .then(|| menus::render(Menu::IdentityPicker(&self.names)));
                vec![Reply::send(RESTART_PROMPT, keyboard)]
            }
            Effect::ShowMenu => {
                let identity = require_identity(session)?;
                if session.take_draft().is_some() {
                    tracing::debug!("draft abandoned via back");
                }
                vec![Reply::replace(
                    format!("What would you like to do, {}?", self.names.name(identity)),
                    Some(menus::render(Menu::Main)),
                )]
            }
            Effect::BeginDraft { edit_index } => {
                let identity = require_identity(session)?;
                let (draft, prompt) = match edit_index {
                    Some(index) => {
                        let len = self.store.len(identity);
                        if index >= len {
                            return Err(StoreError::IndexOutOfRange { index, len }.into());
                        }
                        (TaskDraft::editing(index), "Enter the *new task name*:")
                    }
                    None => (TaskDraft::new_task(), "Enter the *task name*:"),
                };
                session.start_draft(draft);
                vec![Reply::replace(prompt, None)]
            }
            Effect::ListTasks => self.list_tasks(require_identity(session)?),
            Effect::MarkDone(index) => {
                let identity = require_identity(session)?;
                self.store.update(identity, index, TaskPatch::mark_done())?;
                vec![post_action("Task marked done.")]
            }
            Effect::Delete(index) => {
                let identity = require_identity(session)?;
                self.store.delete(identity, index)?;
                vec![post_action("Task deleted.")]
            }
            Effect::ClearTasks => {
                let identity = require_identity(session)?;
                self.store.clear(identity);
                vec![post_action("All tasks cleared.")]
            }
            Effect::RecordName(text) => {
                let name = validate_name(&text)?;
                session.merge_draft(TaskDraft {
                    name: Some(name),
                    ..TaskDraft::default()
                });
                vec![Reply::send(
                    "Now choose a deadline date:",
                    Some(self.date_picker()),
                )]
            }
            Effect::RecordDate(date) => {
                let today = self.clock.now().date();
                if !menus::picker_dates(today).any(|offered| offered == date) {
                    return Err(ConversationError::DateOutsidePicker(date));
                }
                session.merge_draft(TaskDraft {
                    date: Some(date),
                    ..TaskDraft::default()
                });
                vec![Reply::replace(
                    "Select the time:",
                    Some(menus::render(Menu::TimePicker)),
                )]
            }
            Effect::Commit(time) => self.commit(session, time)?,
            Effect::RepromptPicker => match state {
                ConversationState::AwaitingTime => vec![Reply::send(
                    "Please select the time from the menu:",
                    Some(menus::render(Menu::TimePicker)),
                )],
                _ => vec![Reply::send(
                    "Please choose a deadline date from the menu:",
                    Some(self.date_picker()),
                )],
            },
            Effect::Expired => vec![Reply::replace("That selection has expired.", None)],
        };
        Ok(replies)
    }

    fn list_tasks(&self, identity: Identity) -> Vec<Reply> {
        let tasks = self.store.list(identity);
        if tasks.is_empty() {
            return vec![Reply::replace(
                "No tasks found.",
                Some(menus::render(Menu::TaskListNav)),
            )];
        }

        let mut replies = Vec::with_capacity(tasks.len() + 2);
        replies.push(Reply::replace("Here are your tasks:", None));
        for (index, task) in tasks.iter().enumerate() {
            replies.push(Reply::send(
                menus::task_line(index, task),
                Some(menus::render(Menu::TaskActions(index))),
            ));
        }
        replies.push(Reply::send(
            "What next?",
            Some(menus::render(Menu::TaskListNav)),
        ));
        replies
    }

    fn commit(&self, session: &mut Session, time: NaiveTime) -> Result<Vec<Reply>, ConversationError> {
        let identity = require_identity(session)?;
        let draft = session.take_draft().ok_or(ConversationError::DraftIncomplete)?;
        let (Some(name), Some(date)) = (draft.name, draft.date) else {
            return Err(ConversationError::DraftIncomplete);
        };
        let deadline = date.and_time(time);

        let text = if let Some(index) = draft.edit_index {
            self.store
                .update(identity, index, TaskPatch::rename(name, deadline))?;
            "✅ Task updated!"
        } else {
            self.store.append(identity, Task::new(name, deadline));
            "✅ Task added!"
        };
        tracing::info!(identity = %identity, %deadline, "task committed");
        Ok(vec![post_action(text)])
    }

    fn recover(&self, session: &mut Session, err: &ConversationError) -> Vec<Reply> {
        tracing::info!(error = %err, "recovering from conversation error");
        match err {
            ConversationError::UnknownIdentity => {
                session.set_step(None);
                vec![Reply::send(
                    RESTART_PROMPT,
                    Some(menus::render(Menu::IdentityPicker(&self.names))),
                )]
            }
            ConversationError::Store(StoreError::IndexOutOfRange { .. }) => {
                session.set_step(None);
                vec![post_action("That task no longer exists.")]
            }
            ConversationError::DraftIncomplete => {
                session.set_step(None);
                vec![Reply::replace(
                    "That task draft is no longer available. Please start again.",
                    Some(menus::render(Menu::Main)),
                )]
            }
            ConversationError::EmptyName => {
                vec![Reply::send("Task name cannot be empty. Enter the *task name*:", None)]
            }
            ConversationError::NameTooLong => vec![Reply::send(
                format!(
                    "Task name is too long (max {MAX_TASK_NAME_LENGTH} characters). Enter the *task name*:"
                ),
                None,
            )],
            ConversationError::DateOutsidePicker(_) => vec![Reply::send(
                "Please choose a deadline date from the menu:",
                Some(self.date_picker()),
            )],
        }
    }

    fn date_picker(&self) -> duetask_proto::Keyboard {
        menus::render(Menu::DatePicker {
            today: self.clock.now().date(),
        })
    }
}

fn require_identity(session: &Session) -> Result<Identity, ConversationError> {
    session.identity().ok_or(ConversationError::UnknownIdentity)
}

fn validate_name(text: &str) -> Result<String, ConversationError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(ConversationError::EmptyName);
    }
    if name.chars().count() > MAX_TASK_NAME_LENGTH {
        return Err(ConversationError::NameTooLong);
    }
    Ok(name.to_string())
}

fn post_action(text: &str) -> Reply {
    Reply::replace(text, Some(menus::render(Menu::PostAction)))
}
