//! Menu rendering and message text.

use chrono::{Datelike, Days, NaiveDate};
use duetask_proto::{Button, CallbackData, Identity, Keyboard};

use super::IdentityNames;
use crate::tasks::Task;

/// Number of calendar days offered by the date picker, starting today.
pub const DATE_PICKER_DAYS: u64 = 8;

/// Button labels, shared with tests and clients that drive the menus.
pub mod labels {
    /// Main menu: start the add flow.
    pub const ADD_TASK: &str = "➕ Add Task";
    /// Main menu and post-action row: list tasks.
    pub const VIEW_TASKS: &str = "📋 View Tasks";
    /// Main menu: clear the list.
    pub const CLEAR_TASKS: &str = "🗑️ Clear Tasks";
    /// Task list navigation: start the add flow.
    pub const ADD_MORE_TASKS: &str = "➕ Add More Tasks";
    /// Return to the main menu.
    pub const BACK_TO_MENU: &str = "🔙 Back to Menu";
    /// Per-task row: mark done.
    pub const DONE: &str = "✅ Done";
    /// Per-task row: edit.
    pub const EDIT: &str = "✏️ Edit";
    /// Per-task row: delete.
    pub const DELETE: &str = "🗑️ Delete";
}

/// The kinds of inline menus the bot renders.
#[derive(Debug, Clone, Copy)]
pub enum Menu<'a> {
    /// One button per identity.
    IdentityPicker(&'a IdentityNames),
    /// Add / View / Clear.
    Main,
    /// Shown under a task listing: Add More / Back.
    TaskListNav,
    /// Shown after a mutation: View / Back.
    PostAction,
    /// The next [`DATE_PICKER_DAYS`] days starting at `today`.
    DatePicker {
        /// First day offered.
        today: NaiveDate,
    },
    /// 24 whole-hour slots.
    TimePicker,
    /// Done / Edit / Delete for the task at the index.
    TaskActions(usize),
}

/// Renders a menu into an inline keyboard.
#[must_use]
pub fn render(menu: Menu<'_>) -> Keyboard {
    match menu {
        Menu::IdentityPicker(names) => Identity::ALL
            .into_iter()
            .fold(Keyboard::new(), |kb, identity| {
                kb.single(names.name(identity), &CallbackData::SelectIdentity(identity))
            }),
        Menu::Main => Keyboard::new()
            .single(labels::ADD_TASK, &CallbackData::AddTask)
            .single(labels::VIEW_TASKS, &CallbackData::ViewTasks)
            .single(labels::CLEAR_TASKS, &CallbackData::ClearTasks),
        Menu::TaskListNav => Keyboard::new()
            .single(labels::ADD_MORE_TASKS, &CallbackData::AddTask)
            .single(labels::BACK_TO_MENU, &CallbackData::BackToMenu),
        Menu::PostAction => Keyboard::new()
            .single(labels::VIEW_TASKS, &CallbackData::ViewTasks)
            .single(labels::BACK_TO_MENU, &CallbackData::BackToMenu),
        Menu::DatePicker { today } => picker_dates(today).fold(Keyboard::new(), |kb, date| {
            let data = CallbackData::Date {
                year: date.year(),
                month: date.month(),
                day: date.day(),
            };
            kb.single(date.format("%A, %d %B").to_string(), &data)
        }),
        Menu::TimePicker => (0..24).fold(Keyboard::new(), |kb, hour| {
            kb.single(format!("{hour:02}:00"), &CallbackData::Time { hour, minute: 0 })
        }),
        Menu::TaskActions(index) => Keyboard::new().row(vec![
            Button::new(labels::DONE, &CallbackData::Done(index)),
            Button::new(labels::EDIT, &CallbackData::Edit(index)),
            Button::new(labels::DELETE, &CallbackData::Delete(index)),
        ]),
    }
}

/// The dates offered by the date picker, in chronological order.
pub fn picker_dates(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..DATE_PICKER_DAYS).filter_map(move |offset| today.checked_add_days(Days::new(offset)))
}

/// Completion marker used in listings and digests.
#[must_use]
pub const fn status_marker(task: &Task) -> &'static str {
    if task.done { "✅" } else { "❌" }
}

/// One task as shown in a listing: `"1. ❌ *name*\n⏰ 19 Oct 2026 14:00"`.
#[must_use]
pub fn task_line(index: usize, task: &Task) -> String {
    format!(
        "{}. {} *{}*\n⏰ {}",
        index + 1,
        status_marker(task),
        task.name,
        task.deadline.format("%d %b %Y %H:%M")
    )
}
