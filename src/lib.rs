//! Backend of the Jira stopwatch: per-issue timers, their persistence and
//! worklog submission to Jira.

pub mod clock;
pub mod config;
pub mod filters;
pub mod issue_store;
pub mod logging;
pub mod persist;
pub mod scheduler;
pub mod secrets;
pub mod timer;
pub mod transition;
pub mod worklog;

pub use clock::{system_clock, Clock, SharedClock, SystemClock};
pub use config::{
    ConfigError, PauseAndResumeSetting, SaveTimerSetting, Settings, SettingsManager, WorklogCommentSetting,
};
pub use issue_store::{normalize_issue_key, IssueStore, IssueStoreError, TimerPolicy, TrackedIssueInfo};
pub use persist::{IssuePersistence, PersistedIssue};
pub use scheduler::{spawn_scheduler, SchedulerConfig, SchedulerEvent};
pub use secrets::{SecretsError, SecretsManager};
pub use timer::{IssueTimer, TimerSnapshot, TimerStatus};
pub use worklog::{
    SubmitWorklog, WorklogDecision, WorklogError, WorklogFlow, WorklogOutcome, WorklogPrompt, WorklogRemote,
};

/// Builds the tracked-issue store from saved settings, restoring timers
/// according to `save_timer_state`.
pub fn restore_issue_store(settings: &Settings, clock: SharedClock) -> IssueStore {
    let store = IssueStore::new(clock, TimerPolicy::from_settings(settings));
    store.restore(&settings.issues(), settings.save_timer_state);
    store
}
