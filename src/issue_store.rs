//! Tracked issues and their timers, with the timer policies applied across them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jira_api::Issue;
use log::debug;
use thiserror::Error;

use crate::clock::SharedClock;
use crate::config::{PauseAndResumeSetting, SaveTimerSetting, Settings};
use crate::persist::PersistedIssue;
use crate::timer::{IssueTimer, TimerSnapshot, TimerStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueStoreError {
    #[error("'{0}' is not a valid issue key")]
    InvalidKey(String),
    #[error("issue {0} is already tracked")]
    Duplicate(String),
    #[error("issue {0} is not tracked")]
    Unknown(String),
}

pub type StoreResult<T> = std::result::Result<T, IssueStoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPolicy {
    pub allow_multiple_timers: bool,
    pub pause_on_session_lock: PauseAndResumeSetting,
    pub issue_count: usize,
}

impl Default for TimerPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl TimerPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            allow_multiple_timers: settings.allow_multiple_timers,
            pause_on_session_lock: settings.pause_on_session_lock,
            issue_count: settings.issue_count,
        }
    }
}

/// Read-only copy of one tracked issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIssueInfo {
    pub key: String,
    pub summary: Option<String>,
    pub comment: Option<String>,
    pub status: TimerStatus,
    pub elapsed: Duration,
    pub attribution_start: DateTime<Utc>,
    pub(crate) generation: u64,
}

#[derive(Debug)]
struct TrackedIssue {
    key: String,
    summary: Option<String>,
    comment: Option<String>,
    timer: IssueTimer,
    // Bumped whenever the issue's identity or tracked time changes outside a run.
    generation: u64,
}

impl TrackedIssue {
    fn info(&self) -> TrackedIssueInfo {
        TrackedIssueInfo {
            key: self.key.clone(),
            summary: self.summary.clone(),
            comment: self.comment.clone(),
            status: self.timer.status(),
            elapsed: self.timer.elapsed_now(),
            attribution_start: self.timer.attribution_start(),
            generation: self.generation,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    issues: Vec<TrackedIssue>,
    policy: TimerPolicy,
    paused_by_lock: HashSet<String>,
}

impl StoreState {
    fn find(&self, key: &str) -> Option<&TrackedIssue> {
        self.issues.iter().find(|issue| issue.key == key)
    }

    fn find_mut(&mut self, key: &str) -> StoreResult<&mut TrackedIssue> {
        self.issues
            .iter_mut()
            .find(|issue| issue.key == key)
            .ok_or_else(|| IssueStoreError::Unknown(key.to_string()))
    }

    fn pause_others(&mut self, key: &str) {
        for issue in self.issues.iter_mut().filter(|issue| issue.key != key) {
            issue.timer.pause();
        }
    }
}

/// Thread-safe list of tracked issues. Clones share the same state.
#[derive(Clone)]
pub struct IssueStore {
    inner: Arc<Mutex<StoreState>>,
    clock: SharedClock,
}

impl IssueStore {
    pub fn new(clock: SharedClock, policy: TimerPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                policy,
                ..StoreState::default()
            })),
            clock,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> TimerPolicy {
        self.state().policy
    }

    pub fn set_policy(&self, policy: TimerPolicy) {
        self.state().policy = policy;
    }

    /// Starts tracking a new issue and returns its normalized key.
    pub fn add(&self, text: &str) -> StoreResult<String> {
        let key = normalize_issue_key(text).ok_or_else(|| IssueStoreError::InvalidKey(text.to_string()))?;
        let mut state = self.state();
        if state.find(&key).is_some() {
            return Err(IssueStoreError::Duplicate(key));
        }
        state.issues.push(TrackedIssue {
            key: key.clone(),
            summary: None,
            comment: None,
            timer: IssueTimer::new(self.clock.clone()),
            generation: 0,
        });
        debug!("Tracking issue {}", key);
        Ok(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut state = self.state();
        let before = state.issues.len();
        state.issues.retain(|issue| issue.key != key);
        state.paused_by_lock.remove(key);
        state.issues.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state().find(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state().issues.iter().map(|issue| issue.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.state().issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn issue(&self, key: &str) -> Option<TrackedIssueInfo> {
        self.state().find(key).map(TrackedIssue::info)
    }

    pub fn issues(&self) -> Vec<TrackedIssueInfo> {
        self.state().issues.iter().map(TrackedIssue::info).collect()
    }

    /// Stores the worklog comment; blank text clears it.
    pub fn set_comment(&self, key: &str, comment: Option<&str>) -> StoreResult<()> {
        let mut state = self.state();
        state.find_mut(key)?.comment = comment
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Ok(())
    }

    pub fn set_summary(&self, key: &str, summary: Option<String>) -> StoreResult<()> {
        let mut state = self.state();
        state.find_mut(key)?.summary = summary;
        Ok(())
    }

    /// Changes the key of a tracked issue. Tracked time is kept; the summary
    /// belongs to the old issue and is dropped.
    pub fn rename(&self, key: &str, text: &str) -> StoreResult<String> {
        let new_key = normalize_issue_key(text).ok_or_else(|| IssueStoreError::InvalidKey(text.to_string()))?;
        let mut state = self.state();
        if new_key != key && state.find(&new_key).is_some() {
            return Err(IssueStoreError::Duplicate(new_key));
        }
        let issue = state.find_mut(key)?;
        if issue.key != new_key {
            issue.key = new_key.clone();
            issue.summary = None;
            issue.generation += 1;
        }
        if state.paused_by_lock.remove(key) {
            state.paused_by_lock.insert(new_key.clone());
        }
        Ok(new_key)
    }

    /// Starts the issue's timer, pausing the others unless multiple timers are allowed.
    pub fn start(&self, key: &str) -> StoreResult<()> {
        let mut state = self.state();
        state.find_mut(key)?;
        if !state.policy.allow_multiple_timers {
            state.pause_others(key);
        }
        state.find_mut(key)?.timer.start();
        Ok(())
    }

    pub fn pause(&self, key: &str) -> StoreResult<()> {
        let mut state = self.state();
        state.find_mut(key)?.timer.pause();
        Ok(())
    }

    pub fn toggle(&self, key: &str) -> StoreResult<TimerStatus> {
        let running = self.state().find(key).map(|issue| issue.timer.is_running());
        match running {
            Some(true) => self.pause(key)?,
            Some(false) => self.start(key)?,
            None => return Err(IssueStoreError::Unknown(key.to_string())),
        }
        Ok(if running == Some(true) {
            TimerStatus::Stopped
        } else {
            TimerStatus::Running
        })
    }

    pub fn reset(&self, key: &str) -> StoreResult<()> {
        let mut state = self.state();
        let issue = state.find_mut(key)?;
        issue.timer.reset();
        issue.generation += 1;
        Ok(())
    }

    pub fn set_elapsed(&self, key: &str, elapsed: Duration) -> StoreResult<()> {
        let mut state = self.state();
        let issue = state.find_mut(key)?;
        issue.timer.set_elapsed(elapsed);
        issue.generation += 1;
        Ok(())
    }

    pub fn elapsed(&self, key: &str) -> Option<Duration> {
        self.state().find(key).map(|issue| issue.timer.elapsed_now())
    }

    pub fn status(&self, key: &str) -> Option<TimerStatus> {
        self.state().find(key).map(|issue| issue.timer.status())
    }

    pub fn running_snapshots(&self) -> Vec<TimerSnapshot> {
        self.state()
            .issues
            .iter()
            .filter(|issue| issue.timer.is_running())
            .map(|issue| issue.timer.snapshot(&issue.key))
            .collect()
    }

    pub fn snapshots(&self) -> Vec<TimerSnapshot> {
        self.state()
            .issues
            .iter()
            .map(|issue| issue.timer.snapshot(&issue.key))
            .collect()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.state().issues.iter().map(|issue| issue.timer.elapsed_now()).sum()
    }

    pub fn pause_all(&self) {
        for issue in self.state().issues.iter_mut() {
            issue.timer.pause();
        }
    }

    pub fn session_locked(&self) {
        let mut state = self.state();
        if state.policy.pause_on_session_lock == PauseAndResumeSetting::NoPause {
            return;
        }
        // Repeated lock events add to the set so unlock resumes every timer paused since.
        let mut paused = std::mem::take(&mut state.paused_by_lock);
        for issue in state.issues.iter_mut().filter(|issue| issue.timer.is_running()) {
            issue.timer.pause();
            paused.insert(issue.key.clone());
        }
        debug!("Session locked, {} timer(s) paused", paused.len());
        state.paused_by_lock = paused;
    }

    pub fn session_unlocked(&self) {
        let mut state = self.state();
        let paused = std::mem::take(&mut state.paused_by_lock);
        if state.policy.pause_on_session_lock != PauseAndResumeSetting::PauseAndResume {
            return;
        }
        for issue in state.issues.iter_mut().filter(|issue| paused.contains(&issue.key)) {
            issue.timer.start();
        }
    }

    /// Adds search hits that are not tracked yet until `issue_count` issues
    /// are tracked; refreshes summaries of those already tracked.
    pub fn merge_search_results(&self, found: &[Issue], include_project_name: bool) -> Vec<String> {
        let mut state = self.state();
        let limit = state.policy.issue_count;
        let mut added = Vec::new();
        for hit in found {
            let Some(key) = normalize_issue_key(&hit.key) else {
                continue;
            };
            let summary = Some(hit.display_summary(include_project_name)).filter(|text| !text.is_empty());
            if let Ok(existing) = state.find_mut(&key) {
                existing.summary = summary;
                continue;
            }
            if state.issues.len() >= limit {
                continue;
            }
            state.issues.push(TrackedIssue {
                key: key.clone(),
                summary,
                comment: None,
                timer: IssueTimer::new(self.clock.clone()),
                generation: 0,
            });
            added.push(key);
        }
        added
    }

    pub fn to_persisted(&self) -> Vec<PersistedIssue> {
        self.state()
            .issues
            .iter()
            .map(|issue| PersistedIssue {
                key: issue.key.clone(),
                total_time: issue.timer.elapsed_now(),
                comment: issue.comment.clone(),
                timer_running: issue.timer.is_running(),
            })
            .collect()
    }

    /// Replaces the tracked issues with persisted records.
    pub fn restore(&self, records: &[PersistedIssue], mode: SaveTimerSetting) {
        let mut state = self.state();
        state.issues.clear();
        state.paused_by_lock.clear();
        let mut resumed = false;
        for record in records {
            let Some(key) = normalize_issue_key(&record.key) else {
                continue;
            };
            if state.find(&key).is_some() {
                continue;
            }
            let elapsed = match mode {
                SaveTimerSetting::NoSave => Duration::ZERO,
                SaveTimerSetting::SavePause | SaveTimerSetting::SaveRunActive => record.total_time,
            };
            let mut timer = IssueTimer::with_elapsed(self.clock.clone(), elapsed);
            let resume = mode == SaveTimerSetting::SaveRunActive
                && record.timer_running
                && (state.policy.allow_multiple_timers || !resumed);
            if resume {
                timer.start();
                resumed = true;
            }
            state.issues.push(TrackedIssue {
                key,
                summary: None,
                comment: record.comment.clone(),
                timer,
                generation: 0,
            });
        }
    }

    /// Clears the timer only if nothing changed the issue since `generation`
    /// was read. Returns whether the reset happened.
    pub(crate) fn reset_if_current(&self, key: &str, generation: u64) -> bool {
        let mut state = self.state();
        match state.find_mut(key) {
            Ok(issue) if issue.generation == generation => {
                issue.timer.reset();
                issue.generation += 1;
                true
            }
            _ => false,
        }
    }
}

/// Trims the input and reduces a pasted `/browse/KEY` URL to the key.
pub fn normalize_issue_key(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let key = match trimmed.find("/browse/") {
        Some(index) => {
            let rest = &trimmed[index + "/browse/".len()..];
            rest.split(['/', '?', '#']).next().unwrap_or_default()
        }
        None => trimmed,
    };
    let key = key.trim();
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        None
    } else {
        Some(key.to_string())
    }
}
