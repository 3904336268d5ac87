//! Conversation flows: inbound events, the step state machine, and the
//! replies it produces.
//!
//! The [`Controller`] turns one [`Event`] from one actor into a list of
//! [`Reply`] values. It never talks to the gateway itself; delivery is done
//! by [`crate::bot::Bot`] so the state machine stays synchronous and easy to
//! test.

pub mod controller;
pub mod menus;
pub mod state;

pub use controller::Controller;
pub use menus::Menu;
pub use state::{ConversationState, Effect, Transition, transition};

use chrono::{NaiveDate, NaiveTime};
use duetask_proto::{CallbackData, Identity, Keyboard, ProtoError};
use thiserror::Error;

use crate::tasks::StoreError;

/// Errors recovered inside the controller.
///
/// None of these ever reach an actor as raw text: each one is mapped to a
/// re-render of a safe menu.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// The actor acted before selecting an identity.
    #[error("no identity selected")]
    UnknownIdentity,
    /// A task index no longer addresses a task.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A commit was attempted without a complete draft.
    #[error("task draft is incomplete")]
    DraftIncomplete,
    /// The typed task name is blank.
    #[error("task name cannot be empty")]
    EmptyName,
    /// The typed task name exceeds [`crate::tasks::MAX_TASK_NAME_LENGTH`].
    #[error("task name too long")]
    NameTooLong,
    /// A picked date is not one the date picker currently offers.
    #[error("date {0} is outside the picker window")]
    DateOutsidePicker(NaiveDate),
}

/// Actions offered by the main menu and the per-task rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Start the add flow.
    AddTask,
    /// List the identity's tasks.
    ViewTasks,
    /// Remove every task of the identity.
    ClearTasks,
    /// Return to the main menu.
    Back,
    /// Mark the task at the index done.
    Done(usize),
    /// Start the edit flow for the task at the index.
    Edit(usize),
    /// Delete the task at the index.
    Delete(usize),
}

/// An inbound event from one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The `/start` command.
    Start,
    /// An identity was picked.
    IdentitySelected(Identity),
    /// A menu button was pressed.
    Menu(MenuAction),
    /// A date was picked.
    DatePicked(NaiveDate),
    /// A time was picked.
    TimePicked(NaiveTime),
    /// Free text was typed.
    FreeText(String),
}

impl TryFrom<CallbackData> for Event {
    type Error = ProtoError;

    fn try_from(data: CallbackData) -> Result<Self, Self::Error> {
        Ok(match data {
            CallbackData::SelectIdentity(identity) => Self::IdentitySelected(identity),
            CallbackData::AddTask => Self::Menu(MenuAction::AddTask),
            CallbackData::ViewTasks => Self::Menu(MenuAction::ViewTasks),
            CallbackData::ClearTasks => Self::Menu(MenuAction::ClearTasks),
            CallbackData::BackToMenu => Self::Menu(MenuAction::Back),
            CallbackData::Done(index) => Self::Menu(MenuAction::Done(index)),
            CallbackData::Edit(index) => Self::Menu(MenuAction::Edit(index)),
            CallbackData::Delete(index) => Self::Menu(MenuAction::Delete(index)),
            CallbackData::Date { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .map(Self::DatePicked)
                .ok_or_else(|| ProtoError::MalformedCallback(data.encode()))?,
            CallbackData::Time { hour, minute } => NaiveTime::from_hms_opt(hour, minute, 0)
                .map(Self::TimePicked)
                .ok_or_else(|| ProtoError::MalformedCallback(data.encode()))?,
        })
    }
}

/// A message the controller wants shown to the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Replace the message whose button triggered the event. When the event
    /// did not come from a button, this is sent as a new message.
    Replace {
        /// Message body.
        text: String,
        /// Optional keyboard.
        keyboard: Option<Keyboard>,
    },
    /// Send a new message.
    Send {
        /// Message body.
        text: String,
        /// Optional keyboard.
        keyboard: Option<Keyboard>,
    },
}

impl Reply {
    pub(crate) fn replace(text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Self::Replace {
            text: text.into(),
            keyboard,
        }
    }

    pub(crate) fn send(text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Self::Send {
            text: text.into(),
            keyboard,
        }
    }

    /// The reply's message body.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Replace { text, .. } | Self::Send { text, .. } => text,
        }
    }

    /// The reply's keyboard, if any.
    #[must_use]
    pub const fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Replace { keyboard, .. } | Self::Send { keyboard, .. } => keyboard.as_ref(),
        }
    }
}

/// Display names of the two identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityNames {
    a: String,
    b: String,
}

impl Default for IdentityNames {
    fn default() -> Self {
        Self::new("A", "B")
    }
}

impl IdentityNames {
    /// Creates the name table.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Display name of `identity`.
    #[must_use]
    pub fn name(&self, identity: Identity) -> &str {
        match identity {
            Identity::A => &self.a,
            Identity::B => &self.b,
        }
    }
}
