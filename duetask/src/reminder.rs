//! Daily digest scheduler.
//!
//! Once a day, at a fixed local wall-clock time, every actor that has picked
//! an identity receives a summary of that identity's tasks. Deliveries are
//! independent: a failed send is logged and the loop moves on.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime};
use duetask_proto::Identity;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::conversation::IdentityNames;
use crate::conversation::menus;
use crate::gateway::Gateway;
use crate::session::SessionStore;
use crate::tasks::TaskStore;

/// Default digest time, 09:00 local.
pub const DEFAULT_REMINDER_TIME: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Result of one digest round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestReport {
    /// Digests handed to the gateway successfully.
    pub sent: usize,
    /// Digests the gateway rejected.
    pub failed: usize,
}

/// Sends the daily digest to every known actor.
pub struct ReminderScheduler<G> {
    store: Arc<TaskStore>,
    sessions: Arc<SessionStore>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    at: NaiveTime,
    names: IdentityNames,
}

impl<G: Gateway> ReminderScheduler<G> {
    /// Creates a scheduler firing daily at [`DEFAULT_REMINDER_TIME`].
    pub fn new(
        store: Arc<TaskStore>,
        sessions: Arc<SessionStore>,
        gateway: Arc<G>,
        clock: Arc<dyn Clock>,
        names: IdentityNames,
    ) -> Self {
        Self {
            store,
            sessions,
            gateway,
            clock,
            at: DEFAULT_REMINDER_TIME,
            names,
        }
    }

    /// Fires at `at` instead of the default time.
    #[must_use]
    pub fn at(mut self, at: NaiveTime) -> Self {
        self.at = at;
        self
    }

    /// Digest text for `identity`.
    #[must_use]
    pub fn digest(&self, identity: Identity) -> String {
        let name = self.names.name(identity);
        let tasks = self.store.list(identity);
        if tasks.is_empty() {
            return format!("Good morning, {name}! You have no tasks. 🎉");
        }

        let mut text = format!("Good morning, {name}! Here are your tasks:");
        for (index, task) in tasks.iter().enumerate() {
            text.push_str("\n\n");
            text.push_str(&menus::task_line(index, task));
        }
        text
    }

    /// Sends one digest to every actor with a known identity.
    pub async fn send_digests(&self) -> DigestReport {
        let mut report = DigestReport::default();
        for (actor, identity) in self.sessions.known_actors().await {
            let text = self.digest(identity);
            match self.gateway.send(actor, &text, None).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(actor = %actor, identity = %identity, error = %e, "digest delivery failed");
                }
            }
        }
        report
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A shutdown observed while sleeping exits without sending. Each slot is
    /// served at most once, even if local time steps backwards afterwards.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(at = %self.at, "reminder scheduler started");
        let mut served: Option<NaiveDateTime> = None;
        loop {
            if *shutdown.borrow() {
                break;
            }
            let now = self.clock.now();
            let from = served.map_or(now, |slot| slot.max(now));
            let next = next_occurrence(from, self.at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!(%next, ?wait, "next digest scheduled");

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = tokio::time::sleep(wait) => {
                    let woke = self.clock.now();
                    if woke < next {
                        // Local time moved back while sleeping.
                        tracing::debug!(%woke, %next, "woke before the slot");
                        continue;
                    }
                    let report = self.send_digests().await;
                    served = Some(next);
                    tracing::info!(sent = report.sent, failed = report.failed, "daily digest sent");
                }
            }
        }
        tracing::info!("reminder scheduler stopped");
    }
}

/// The first `at` strictly after `now`: today's slot if it is still ahead,
/// tomorrow's otherwise.
#[must_use]
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        return today;
    }
    now.date()
        .checked_add_days(Days::new(1))
        .map_or(NaiveDateTime::MAX, |date| date.and_time(at))
}
