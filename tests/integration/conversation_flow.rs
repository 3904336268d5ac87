//! Integration tests for the conversation flows.
//!
//! Drives a [`Bot`] over a [`RecordingGateway`] the way a chat client would:
//! buttons are found in delivered keyboards, their payloads parsed back into
//! events, and the message carrying the button passed as the origin.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use duetask::bot::Bot;
use duetask::clock::FixedClock;
use duetask::conversation::menus::labels;
use duetask::conversation::{Controller, Event, IdentityNames, MenuAction};
use duetask::gateway::recording::{Delivery, RecordingGateway};
use duetask::session::SessionStore;
use duetask::tasks::{Task, TaskStore};
use duetask_proto::{ActorId, CallbackData, Identity, MessageRef};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ALICE: ActorId = ActorId(101);
const BOB: ActorId = ActorId(202);
const CAROL: ActorId = ActorId(303);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn deadline(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

struct Harness {
    bot: Bot<RecordingGateway>,
}

impl Harness {
    fn new() -> Self {
        let controller = Controller::new(
            Arc::new(TaskStore::new()),
            Arc::new(FixedClock(today().and_hms_opt(10, 30, 0).unwrap())),
            IdentityNames::new("Arshad", "Rahmu"),
        );
        Self {
            bot: Bot::new(
                controller,
                Arc::new(SessionStore::new()),
                Arc::new(RecordingGateway::new()),
            ),
        }
    }

    fn deliveries(&self, actor: ActorId) -> Vec<Delivery> {
        self.bot.gateway().deliveries_to(actor)
    }

    fn last_text(&self, actor: ActorId) -> String {
        self.deliveries(actor)
            .last()
            .map(|d| d.text().to_string())
            .unwrap_or_default()
    }

    fn tasks(&self, identity: Identity) -> Vec<Task> {
        self.bot.store().list(identity)
    }

    async fn start(&self, actor: ActorId) {
        self.bot.dispatch(actor, None, Event::Start).await;
    }

    async fn text(&self, actor: ActorId, content: &str) {
        self.bot
            .dispatch(actor, None, Event::FreeText(content.to_string()))
            .await;
    }

    /// Presses the most recently delivered button with `label`.
    async fn press(&self, actor: ActorId, label: &str) {
        let (message, data) = self
            .deliveries(actor)
            .iter()
            .rev()
            .find_map(|d| {
                d.keyboard()
                    .and_then(|kb| kb.find(label))
                    .map(|b| (*d.message(), b.data.clone()))
            })
            .unwrap_or_else(|| panic!("no button labelled {label:?}"));
        self.click(actor, message, &data).await;
    }

    /// Presses the most recently delivered button carrying `data`.
    async fn press_data(&self, actor: ActorId, data: &str) {
        let message = self
            .deliveries(actor)
            .iter()
            .rev()
            .find(|d| {
                d.keyboard()
                    .is_some_and(|kb| kb.buttons().any(|b| b.data == data))
            })
            .map(|d| *d.message())
            .unwrap_or_else(|| panic!("no button with data {data:?}"));
        self.click(actor, message, data).await;
    }

    async fn click(&self, actor: ActorId, message: MessageRef, data: &str) {
        let event = Event::try_from(CallbackData::parse(data).unwrap()).unwrap();
        self.bot.dispatch(actor, Some(message), event).await;
    }

    async fn login(&self, actor: ActorId, name: &str) {
        self.start(actor).await;
        self.press(actor, name).await;
    }

    async fn add_task(&self, actor: ActorId, name: &str, date_label: &str, time_label: &str) {
        self.press(actor, labels::ADD_TASK).await;
        self.text(actor, name).await;
        self.press(actor, date_label).await;
        self.press(actor, time_label).await;
    }
}

// ---------------------------------------------------------------------------
// Add / view / done / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn buy_milk_lifecycle() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    assert_eq!(h.last_text(ALICE), "Welcome Arshad! Choose an action:");

    h.add_task(ALICE, "Buy milk", "Monday, 19 October", "14:00")
        .await;
    assert_eq!(h.last_text(ALICE), "✅ Task added!");
    assert_eq!(
        h.tasks(Identity::A),
        vec![Task::new("Buy milk", deadline(19, 14))]
    );

    h.press(ALICE, labels::VIEW_TASKS).await;
    let listing: Vec<String> = h
        .deliveries(ALICE)
        .iter()
        .rev()
        .take(3)
        .map(|d| d.text().to_string())
        .collect();
    assert_eq!(
        listing,
        [
            "What next?",
            "1. ❌ *Buy milk*\n⏰ 19 Oct 2026 14:00",
            "Here are your tasks:",
        ]
    );

    h.press_data(ALICE, "done_0").await;
    assert_eq!(h.last_text(ALICE), "Task marked done.");
    assert!(h.tasks(Identity::A)[0].done);

    h.press_data(ALICE, "delete_0").await;
    assert_eq!(h.last_text(ALICE), "Task deleted.");
    assert!(h.tasks(Identity::A).is_empty());

    h.press(ALICE, labels::VIEW_TASKS).await;
    assert_eq!(h.last_text(ALICE), "No tasks found.");
}

#[tokio::test]
async fn add_appends_exactly_one_open_task() {
    let h = Harness::new();
    h.bot
        .store()
        .append(Identity::A, Task::new("existing", deadline(18, 9)));
    h.login(ALICE, "Arshad").await;

    h.add_task(ALICE, "second", "Tuesday, 20 October", "08:00")
        .await;

    let tasks = h.tasks(Identity::A);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1], Task::new("second", deadline(20, 8)));
    assert!(!tasks[1].done);
}

#[tokio::test]
async fn edit_keeps_length_and_done_flag() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.add_task(ALICE, "first", "Sunday, 18 October", "09:00")
        .await;
    h.press(ALICE, labels::VIEW_TASKS).await;
    h.press_data(ALICE, "done_0").await;

    h.press(ALICE, labels::VIEW_TASKS).await;
    h.press_data(ALICE, "edit_0").await;
    assert_eq!(h.last_text(ALICE), "Enter the *new task name*:");
    h.text(ALICE, "renamed").await;
    h.press(ALICE, "Saturday, 24 October").await;
    h.press(ALICE, "23:00").await;

    assert_eq!(h.last_text(ALICE), "✅ Task updated!");
    let tasks = h.tasks(Identity::A);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "renamed");
    assert_eq!(tasks[0].deadline, deadline(24, 23));
    assert!(tasks[0].done);
}

#[tokio::test]
async fn double_delete_hits_the_shifted_list() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.add_task(ALICE, "x", "Sunday, 18 October", "09:00").await;
    h.add_task(ALICE, "y", "Sunday, 18 October", "10:00").await;
    h.press(ALICE, labels::VIEW_TASKS).await;

    // Both presses use the button rendered for "x" at index 0.
    let stale = h
        .deliveries(ALICE)
        .iter()
        .find(|d| d.text().starts_with("1. "))
        .map(|d| *d.message())
        .unwrap();
    h.click(ALICE, stale, "delete_0").await;
    assert_eq!(h.tasks(Identity::A)[0].name, "y");

    h.click(ALICE, stale, "delete_0").await;
    assert!(h.tasks(Identity::A).is_empty());

    h.click(ALICE, stale, "delete_0").await;
    assert_eq!(h.last_text(ALICE), "That task no longer exists.");
}

#[tokio::test]
async fn clear_empties_only_the_active_identity() {
    let h = Harness::new();
    h.bot
        .store()
        .append(Identity::B, Task::new("theirs", deadline(18, 9)));
    h.login(ALICE, "Arshad").await;
    h.add_task(ALICE, "mine", "Sunday, 18 October", "09:00")
        .await;

    h.press(ALICE, labels::BACK_TO_MENU).await;
    h.press(ALICE, labels::CLEAR_TASKS).await;

    assert_eq!(h.last_text(ALICE), "All tasks cleared.");
    assert!(h.tasks(Identity::A).is_empty());
    assert_eq!(h.tasks(Identity::B).len(), 1);
}

// ---------------------------------------------------------------------------
// Drafts and stale input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_flow_over_unfinished_draft_leaves_store_unchanged() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.press(ALICE, labels::ADD_TASK).await;
    h.text(ALICE, "abandoned").await;
    h.press(ALICE, "Monday, 19 October").await;

    h.bot
        .dispatch(ALICE, None, Event::Menu(MenuAction::AddTask))
        .await;
    assert!(h.tasks(Identity::A).is_empty());
    assert_eq!(h.last_text(ALICE), "Enter the *task name*:");

    h.text(ALICE, "kept").await;
    h.press(ALICE, "Tuesday, 20 October").await;
    h.press(ALICE, "07:00").await;

    let names: Vec<_> = h.tasks(Identity::A).into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["kept"]);
}

#[tokio::test]
async fn time_button_from_finished_flow_is_expired() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.add_task(ALICE, "once", "Sunday, 18 October", "09:00")
        .await;

    h.press_data(ALICE, "time_10_0").await;

    assert_eq!(h.last_text(ALICE), "That selection has expired.");
    assert_eq!(h.tasks(Identity::A).len(), 1);
}

#[tokio::test]
async fn free_text_without_flow_asks_for_start() {
    let h = Harness::new();
    h.text(CAROL, "hello?").await;
    assert_eq!(h.last_text(CAROL), "Please use /start to begin.");

    h.login(CAROL, "Rahmu").await;
    h.text(CAROL, "hello again").await;
    assert_eq!(h.last_text(CAROL), "Please use /start to begin.");
    assert!(h.tasks(Identity::B).is_empty());
}

#[tokio::test]
async fn identity_switch_mid_flow_resets_the_step() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.press(ALICE, labels::ADD_TASK).await;
    h.text(ALICE, "half").await;

    h.bot
        .dispatch(ALICE, None, Event::IdentitySelected(Identity::B))
        .await;
    assert_eq!(h.bot.sessions().get_step(ALICE).await, None);

    h.press(ALICE, "Monday, 19 October").await;
    assert_eq!(h.last_text(ALICE), "That selection has expired.");
    assert!(h.tasks(Identity::A).is_empty());
    assert!(h.tasks(Identity::B).is_empty());
}

// ---------------------------------------------------------------------------
// Shared identities
// ---------------------------------------------------------------------------

#[tokio::test]
async fn actors_sharing_an_identity_share_its_list() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.login(BOB, "Arshad").await;
    h.login(CAROL, "Rahmu").await;

    h.add_task(ALICE, "shared", "Sunday, 18 October", "12:00")
        .await;

    h.press(BOB, labels::VIEW_TASKS).await;
    assert!(
        h.deliveries(BOB)
            .iter()
            .any(|d| d.text().starts_with("1. ❌ *shared*"))
    );

    h.press(CAROL, labels::VIEW_TASKS).await;
    assert_eq!(h.last_text(CAROL), "No tasks found.");
}

#[tokio::test]
async fn interleaved_flows_of_two_actors_stay_separate() {
    let h = Harness::new();
    h.login(ALICE, "Arshad").await;
    h.login(BOB, "Arshad").await;

    h.press(ALICE, labels::ADD_TASK).await;
    h.press(BOB, labels::ADD_TASK).await;
    h.text(ALICE, "from alice").await;
    h.text(BOB, "from bob").await;
    h.press(BOB, "Sunday, 18 October").await;
    h.press(ALICE, "Monday, 19 October").await;
    h.press(ALICE, "10:00").await;
    h.press(BOB, "11:00").await;

    let tasks = h.tasks(Identity::A);
    assert_eq!(
        tasks,
        vec![
            Task::new("from alice", deadline(19, 10)),
            Task::new("from bob", deadline(18, 11)),
        ]
    );
}
