//! The conversation state machine as a pure transition table.
//!
//! ```text
//! IDLE          --identity-->  MENU
//! MENU          --add-->       AWAITING_NAME   (fresh draft)
//! MENU          --edit(i)-->   AWAITING_NAME   (draft with edit index)
//! AWAITING_NAME --text-->      AWAITING_DATE
//! AWAITING_DATE --date-->      AWAITING_TIME
//! AWAITING_TIME --time-->      MENU            (commit)
//! MENU          --view/done/delete/clear--> MENU
//! any           --back-->      MENU
//! ```
//!
//! [`transition`] only decides the effect and the state reached when the
//! effect succeeds. The controller runs the effect and falls back to the
//! menu when it fails (stale index, incomplete draft).

use chrono::{NaiveDate, NaiveTime};
use duetask_proto::Identity;

use super::{Event, MenuAction};
use crate::session::{Session, Step};

/// Where an actor is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// No identity selected yet.
    Idle,
    /// Identity selected, no flow in progress.
    Menu,
    /// Waiting for the task name.
    AwaitingName,
    /// Waiting for the deadline date.
    AwaitingDate,
    /// Waiting for the deadline time.
    AwaitingTime,
}

impl ConversationState {
    /// Every state, for exhaustive tests.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::Menu,
        Self::AwaitingName,
        Self::AwaitingDate,
        Self::AwaitingTime,
    ];

    /// Derives the state from a session.
    #[must_use]
    pub const fn of(session: &Session) -> Self {
        match (session.identity(), session.step()) {
            (None, _) => Self::Idle,
            (Some(_), None) => Self::Menu,
            (Some(_), Some(Step::AwaitingName)) => Self::AwaitingName,
            (Some(_), Some(Step::AwaitingDate)) => Self::AwaitingDate,
            (Some(_), Some(Step::AwaitingTime)) => Self::AwaitingTime,
        }
    }

    /// The session step that represents this state.
    #[must_use]
    pub const fn step(self) -> Option<Step> {
        match self {
            Self::Idle | Self::Menu => None,
            Self::AwaitingName => Some(Step::AwaitingName),
            Self::AwaitingDate => Some(Step::AwaitingDate),
            Self::AwaitingTime => Some(Step::AwaitingTime),
        }
    }
}

/// What the controller must do for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the identity picker.
    ShowIdentityPicker,
    /// Remember the identity and show the main menu.
    SelectIdentity(Identity),
    /// Tell the actor to start over with `/start`.
    PromptRestart,
    /// Show the main menu.
    ShowMenu,
    /// Start a draft and ask for the task name.
    BeginDraft {
        /// Task to overwrite on commit, if editing.
        edit_index: Option<usize>,
    },
    /// List the identity's tasks.
    ListTasks,
    /// Mark the task done.
    MarkDone(usize),
    /// Delete the task.
    Delete(usize),
    /// Clear the identity's tasks.
    ClearTasks,
    /// Store the typed name in the draft and offer the date picker.
    RecordName(String),
    /// Store the picked date in the draft and offer the time picker.
    RecordDate(NaiveDate),
    /// Build the deadline and commit the draft.
    Commit(NaiveTime),
    /// Re-send the picker the actor is expected to use.
    RepromptPicker,
    /// A picker button from an earlier flow was pressed.
    Expired,
}

/// Result of looking up an event in the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Work to perform.
    pub effect: Effect,
    /// State after the effect succeeds.
    pub next: ConversationState,
}

const fn to(effect: Effect, next: ConversationState) -> Transition {
    Transition { effect, next }
}

/// Looks up the transition for `event` in `state`.
#[must_use]
pub fn transition(state: ConversationState, event: &Event) -> Transition {
    use ConversationState::{AwaitingDate, AwaitingName, AwaitingTime, Idle, Menu};

    match (state, event) {
        (Idle, Event::Start) => to(Effect::ShowIdentityPicker, Idle),
        (_, Event::Start) => to(Effect::ShowIdentityPicker, Menu),
        (_, Event::IdentitySelected(identity)) => to(Effect::SelectIdentity(*identity), Menu),
        (Idle, _) => to(Effect::PromptRestart, Idle),

        (_, Event::Menu(action)) => match *action {
            MenuAction::Back => to(Effect::ShowMenu, Menu),
            MenuAction::AddTask => to(Effect::BeginDraft { edit_index: None }, AwaitingName),
            MenuAction::Edit(index) => to(
                Effect::BeginDraft {
                    edit_index: Some(index),
                },
                AwaitingName,
            ),
            MenuAction::ViewTasks => to(Effect::ListTasks, Menu),
            MenuAction::Done(index) => to(Effect::MarkDone(index), Menu),
            MenuAction::Delete(index) => to(Effect::Delete(index), Menu),
            MenuAction::ClearTasks => to(Effect::ClearTasks, Menu),
        },

        (AwaitingName, Event::FreeText(text)) => to(Effect::RecordName(text.clone()), AwaitingDate),
        (Menu, Event::FreeText(_)) => to(Effect::PromptRestart, Menu),
        (AwaitingDate | AwaitingTime, Event::FreeText(_)) => to(Effect::RepromptPicker, state),

        (AwaitingDate, Event::DatePicked(date)) => to(Effect::RecordDate(*date), AwaitingTime),
        (AwaitingTime, Event::TimePicked(time)) => to(Effect::Commit(*time), Menu),
        (_, Event::DatePicked(_) | Event::TimePicked(_)) => to(Effect::Expired, state),
    }
}
