//! Local wall-clock time source.
//!
//! The date picker and the reminder scheduler both work in local wall-clock
//! time. Going through [`Clock`] lets tests pin "today" or drive time from
//! tokio's paused test clock.

use chrono::{Local, NaiveDateTime};

/// Supplies the current local date and time.
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time zone clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// A clock that starts at `base` and advances with tokio's timer.
///
/// Under `tokio::time::pause()` the timer only moves when the runtime is idle
/// or when a test calls `tokio::time::advance`, which makes scheduler tests
/// deterministic.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base: NaiveDateTime,
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Starts the clock at `base`, anchored to the current tokio instant.
    #[must_use]
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Duration::from_std(self.origin.elapsed())
            .ok()
            .and_then(|elapsed| self.base.checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }
}
