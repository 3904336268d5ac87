//! Button payloads.
//!
//! Every inline button carries a short ASCII string that the client sends
//! back verbatim when the button is pressed. The format is fixed:
//!
//! | payload                   | meaning                         |
//! |---------------------------|---------------------------------|
//! | `user_a`, `user_b`        | identity selection              |
//! | `add_task`                | start the add flow              |
//! | `view_tasks`              | list tasks                      |
//! | `clear_tasks`             | clear the identity's list       |
//! | `back_to_menu`            | return to the main menu         |
//! | `done_3`, `edit_3`, `delete_3` | per-task action on index 3 |
//! | `date_2026_10_19`         | deadline date pick              |
//! | `time_14_0`               | deadline time pick              |

use crate::ProtoError;
use crate::identity::Identity;

/// Decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    /// An identity was picked from the identity menu.
    SelectIdentity(Identity),
    /// "Add Task" / "Add More Tasks".
    AddTask,
    /// "View Tasks".
    ViewTasks,
    /// "Clear Tasks".
    ClearTasks,
    /// "Back to Menu".
    BackToMenu,
    /// Mark the task at the index done.
    Done(usize),
    /// Start editing the task at the index.
    Edit(usize),
    /// Delete the task at the index.
    Delete(usize),
    /// A calendar date from the date picker.
    Date {
        /// Four-digit year.
        year: i32,
        /// Month, 1-12.
        month: u32,
        /// Day of month, 1-31.
        day: u32,
    },
    /// A wall-clock time from the time picker.
    Time {
        /// Hour, 0-23.
        hour: u32,
        /// Minute. The picker only offers whole hours, so this is always 0.
        minute: u32,
    },
}

impl CallbackData {
    /// Encodes the payload into its wire string.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::SelectIdentity(identity) => format!("user_{}", identity.key()),
            Self::AddTask => "add_task".to_string(),
            Self::ViewTasks => "view_tasks".to_string(),
            Self::ClearTasks => "clear_tasks".to_string(),
            Self::BackToMenu => "back_to_menu".to_string(),
            Self::Done(index) => format!("done_{index}"),
            Self::Edit(index) => format!("edit_{index}"),
            Self::Delete(index) => format!("delete_{index}"),
            Self::Date { year, month, day } => format!("date_{year:04}_{month:02}_{day:02}"),
            Self::Time { hour, minute } => format!("time_{hour}_{minute}"),
        }
    }

    /// Parses a wire string back into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnknownCallback`] if the prefix is not
    /// recognised, or [`ProtoError::MalformedCallback`] if the arguments
    /// are missing, non-numeric, or out of range.
    pub fn parse(data: &str) -> Result<Self, ProtoError> {
        match data {
            "add_task" => return Ok(Self::AddTask),
            "view_tasks" => return Ok(Self::ViewTasks),
            "clear_tasks" => return Ok(Self::ClearTasks),
            "back_to_menu" => return Ok(Self::BackToMenu),
            _ => {}
        }

        let Some((prefix, rest)) = data.split_once('_') else {
            return Err(ProtoError::UnknownCallback(data.to_string()));
        };
        let malformed = || ProtoError::MalformedCallback(data.to_string());

        match prefix {
            "user" => Identity::from_key(rest)
                .map(Self::SelectIdentity)
                .ok_or_else(malformed),
            "done" => parse_number::<usize>(rest).map(Self::Done).ok_or_else(malformed),
            "edit" => parse_number::<usize>(rest).map(Self::Edit).ok_or_else(malformed),
            "delete" => parse_number::<usize>(rest).map(Self::Delete).ok_or_else(malformed),
            "date" => {
                let mut parts = rest.split('_');
                let (Some(y), Some(m), Some(d), None) =
                    (parts.next(), parts.next(), parts.next(), parts.next())
                else {
                    return Err(malformed());
                };
                let year = parse_number::<i32>(y).ok_or_else(malformed)?;
                let month = parse_number::<u32>(m).filter(|m| (1..=12).contains(m));
                let day = parse_number::<u32>(d).filter(|d| (1..=31).contains(d));
                match (month, day) {
                    (Some(month), Some(day)) => Ok(Self::Date { year, month, day }),
                    _ => Err(malformed()),
                }
            }
            "time" => {
                let Some((h, m)) = rest.split_once('_') else {
                    return Err(malformed());
                };
                let hour = parse_number::<u32>(h).filter(|h| *h < 24);
                let minute = parse_number::<u32>(m).filter(|m| *m == 0);
                match (hour, minute) {
                    (Some(hour), Some(minute)) => Ok(Self::Time { hour, minute }),
                    _ => Err(malformed()),
                }
            }
            _ => Err(ProtoError::UnknownCallback(data.to_string())),
        }
    }
}

/// Parses a plain decimal number; signs and whitespace are rejected.
fn parse_number<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
