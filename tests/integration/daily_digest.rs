//! Integration tests for the daily digest.
//!
//! Sessions are created through the bot, tasks through the store, and the
//! scheduler runs on tokio's paused clock.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use duetask::bot::Bot;
use duetask::clock::{Clock, TokioClock};
use duetask::conversation::{Controller, Event, IdentityNames};
use duetask::gateway::recording::RecordingGateway;
use duetask::reminder::{DigestReport, ReminderScheduler};
use duetask::session::SessionStore;
use duetask::tasks::{Task, TaskStore};
use duetask_proto::{ActorId, Identity};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ACTOR_A: ActorId = ActorId(1);
const ACTOR_B: ActorId = ActorId(2);

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

struct World {
    bot: Bot<RecordingGateway>,
    scheduler: ReminderScheduler<RecordingGateway>,
}

fn world(start: NaiveDateTime) -> World {
    let store = Arc::new(TaskStore::new());
    let sessions = Arc::new(SessionStore::new());
    let gateway = Arc::new(RecordingGateway::new());
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(start));
    let names = IdentityNames::new("Arshad", "Rahmu");

    let controller = Controller::new(Arc::clone(&store), Arc::clone(&clock), names.clone());
    let bot = Bot::new(controller, Arc::clone(&sessions), Arc::clone(&gateway));
    let scheduler = ReminderScheduler::new(store, sessions, gateway, clock, names);
    World { bot, scheduler }
}

impl World {
    async fn pick(&self, actor: ActorId, identity: Identity) {
        self.bot
            .dispatch(actor, None, Event::IdentitySelected(identity))
            .await;
        self.bot.gateway().clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_delivery_does_not_block_other_recipients() {
    let w = world(at(17, 8));
    w.pick(ACTOR_A, Identity::A).await;
    w.pick(ACTOR_B, Identity::B).await;
    w.bot
        .store()
        .append(Identity::A, Task::new("Buy milk", at(19, 14)));
    w.bot.gateway().fail_for(ACTOR_A);

    let report = w.scheduler.send_digests().await;

    assert_eq!(report, DigestReport { sent: 1, failed: 1 });
    assert_eq!(w.bot.gateway().attempts(), 2);
    let delivered = w.bot.gateway().deliveries();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].actor(), ACTOR_B);
    assert_eq!(
        delivered[0].text(),
        "Good morning, Rahmu! You have no tasks. 🎉"
    );
}

#[tokio::test(start_paused = true)]
async fn digest_reflects_completion_state() {
    let w = world(at(17, 8));
    w.pick(ACTOR_A, Identity::A).await;
    w.bot
        .store()
        .append(Identity::A, Task::new("open", at(18, 9)));
    w.bot
        .store()
        .append(Identity::A, Task::new("closed", at(18, 10)));
    w.bot
        .store()
        .update(Identity::A, 1, duetask::tasks::TaskPatch::mark_done())
        .unwrap();

    let text = w.scheduler.digest(Identity::A);
    assert!(text.contains("1. ❌ *open*"));
    assert!(text.contains("2. ✅ *closed*"));
}

#[tokio::test(start_paused = true)]
async fn scheduled_run_reaches_every_known_actor() {
    let w = world(at(17, 8));
    w.pick(ACTOR_A, Identity::A).await;
    w.pick(ACTOR_B, Identity::B).await;
    w.bot.gateway().fail_for(ACTOR_A);
    let gateway = Arc::clone(w.bot.gateway());

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(
        w.scheduler
            .at(NaiveTime::from_hms_opt(8, 30, 0).unwrap())
            .run(rx),
    );

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    assert_eq!(gateway.attempts(), 2);
    assert_eq!(gateway.deliveries_to(ACTOR_B).len(), 1);
    assert!(gateway.deliveries_to(ACTOR_A).is_empty());

    // A reconnects; the next day's digest reaches both.
    gateway.recover(ACTOR_A);
    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(gateway.attempts(), 4);
    assert_eq!(gateway.deliveries_to(ACTOR_A).len(), 1);
    assert_eq!(gateway.deliveries_to(ACTOR_B).len(), 2);

    tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_the_slot_sends_nothing() {
    let w = world(at(17, 8));
    w.pick(ACTOR_A, Identity::A).await;
    let gateway = Arc::clone(w.bot.gateway());

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(w.scheduler.run(rx));
    tokio::time::sleep(Duration::from_secs(10 * 60)).await;
    drop(tx);
    task.await.unwrap();

    tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(gateway.attempts(), 0);
}
