//! Per-issue stopwatch state machine used for local time tracking.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::clock::SharedClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Stopped,
    Running,
}

/// Point-in-time view of one issue timer, as pushed on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub issue_key: String,
    pub status: TimerStatus,
    pub elapsed: u64,
    pub initial_start: Option<DateTime<Utc>>,
}

/// Accumulates elapsed time across start/pause cycles until reset.
///
/// `initial_start` is the wall-clock instant of the first start since the
/// last reset and is what a worklog is attributed to.
#[derive(Clone)]
pub struct IssueTimer {
    clock: SharedClock,
    accumulated: Duration,
    running_since: Option<Instant>,
    initial_start: Option<DateTime<Utc>>,
}

impl IssueTimer {
    /// Creates a stopped timer with no tracked time.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            accumulated: Duration::ZERO,
            running_since: None,
            initial_start: None,
        }
    }

    /// Creates a stopped timer that already holds `elapsed`, e.g. restored from disk.
    pub fn with_elapsed(clock: SharedClock, elapsed: Duration) -> Self {
        let mut timer = Self::new(clock);
        timer.accumulated = elapsed;
        timer
    }

    pub fn status(&self) -> TimerStatus {
        if self.running_since.is_some() {
            TimerStatus::Running
        } else {
            TimerStatus::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Starts a run. No-op while already running.
    pub fn start(&mut self) {
        if self.running_since.is_some() {
            return;
        }
        self.running_since = Some(self.clock.instant());
        if self.initial_start.is_none() {
            self.initial_start = Some(self.clock.wall());
        }
    }

    /// Folds the current run into the accumulated time. No-op while stopped.
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated = self
                .accumulated
                .saturating_add(self.clock.instant().saturating_duration_since(since));
        }
    }

    /// Stops the timer and forgets all tracked time and the initial start.
    pub fn reset(&mut self) {
        self.running_since = None;
        self.accumulated = Duration::ZERO;
        self.initial_start = None;
    }

    pub fn elapsed_now(&self) -> Duration {
        match self.running_since {
            Some(since) => self
                .accumulated
                .saturating_add(self.clock.instant().saturating_duration_since(since)),
            None => self.accumulated,
        }
    }

    /// Replaces the tracked time (manual edit). A running timer keeps running
    /// from the new value.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.accumulated = elapsed;
        if self.running_since.is_some() {
            self.running_since = Some(self.clock.instant());
        }
    }

    pub fn initial_start(&self) -> Option<DateTime<Utc>> {
        self.initial_start
    }

    /// Start instant for a worklog: the initial start when known, otherwise
    /// now minus the tracked time (timers restored from disk have no start).
    /// Falls back to now when the tracked time reaches past the calendar range.
    pub fn attribution_start(&self) -> DateTime<Utc> {
        self.initial_start.unwrap_or_else(|| {
            let wall = self.clock.wall();
            chrono::Duration::from_std(self.elapsed_now())
                .ok()
                .and_then(|elapsed| wall.checked_sub_signed(elapsed))
                .unwrap_or(wall)
        })
    }

    pub fn snapshot(&self, issue_key: &str) -> TimerSnapshot {
        TimerSnapshot {
            issue_key: issue_key.to_string(),
            status: self.status(),
            elapsed: self.elapsed_now().as_secs(),
            initial_start: self.initial_start,
        }
    }
}

impl fmt::Debug for IssueTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueTimer")
            .field("status", &self.status())
            .field("elapsed", &self.elapsed_now())
            .field("initial_start", &self.initial_start)
            .finish()
    }
}
