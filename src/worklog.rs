//! Turning tracked time into a Jira worklog.
//!
//! [`WorklogFlow::prepare`] gathers what the confirmation dialog shows and
//! [`WorklogFlow::apply`] carries out the user's decision. Local timer state
//! only changes after Jira accepted the worklog.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use jira_api::{EstimateAdjustment, JiraClient, JiraError, Timetracking};
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::WorklogCommentSetting;
use crate::issue_store::{IssueStore, IssueStoreError};
use crate::logging::redact_log_details;
use crate::persist::IssuePersistence;

#[derive(Debug, Error)]
pub enum WorklogError {
    #[error("Jira is not configured")]
    NotConfigured,
    #[error("issue {0} is not tracked")]
    UnknownIssue(String),
    #[error("no time tracked for {0}")]
    NothingToLog(String),
    #[error("a worklog for {0} is already being submitted")]
    InProgress(String),
    #[error("Jira rejected the worklog for {0}")]
    SubmitFailed(String),
    #[error(transparent)]
    Jira(#[from] JiraError),
}

impl From<IssueStoreError> for WorklogError {
    fn from(err: IssueStoreError) -> Self {
        match err {
            IssueStoreError::Unknown(key)
            | IssueStoreError::InvalidKey(key)
            | IssueStoreError::Duplicate(key) => WorklogError::UnknownIssue(key),
        }
    }
}

/// The remote operations a worklog submission needs.
#[async_trait]
pub trait WorklogRemote: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn issue_timetracking(&self, issue_key: &str) -> jira_api::Result<Timetracking>;

    async fn post_worklog(
        &self,
        issue_key: &str,
        started: DateTime<Local>,
        time_spent: Duration,
        comment: &str,
        adjustment: &EstimateAdjustment,
    ) -> bool;

    async fn post_comment(&self, issue_key: &str, comment: &str) -> bool;
}

#[async_trait]
impl WorklogRemote for JiraClient {
    fn is_configured(&self) -> bool {
        JiraClient::is_configured(self)
    }

    async fn issue_timetracking(&self, issue_key: &str) -> jira_api::Result<Timetracking> {
        self.get_issue_timetracking(issue_key).await
    }

    async fn post_worklog(
        &self,
        issue_key: &str,
        started: DateTime<Local>,
        time_spent: Duration,
        comment: &str,
        adjustment: &EstimateAdjustment,
    ) -> bool {
        JiraClient::post_worklog(self, issue_key, &started, time_spent, comment, adjustment).await
    }

    async fn post_comment(&self, issue_key: &str, comment: &str) -> bool {
        JiraClient::post_comment(self, issue_key, comment).await
    }
}

/// What the confirmation dialog is filled with.
#[derive(Debug, Clone, PartialEq)]
pub struct WorklogPrompt {
    pub issue_key: String,
    pub started: DateTime<Local>,
    pub elapsed: Duration,
    pub comment: Option<String>,
    pub timetracking: Timetracking,
}

/// Values confirmed by the user for a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitWorklog {
    pub started: DateTime<Local>,
    /// Overrides the tracked time when set.
    pub time_spent: Option<Duration>,
    pub comment: String,
    pub adjustment: EstimateAdjustment,
}

impl SubmitWorklog {
    /// Submission of exactly what was prompted, with automatic estimate adjustment.
    pub fn from_prompt(prompt: &WorklogPrompt) -> Self {
        Self {
            started: prompt.started,
            time_spent: None,
            comment: prompt.comment.clone().unwrap_or_default(),
            adjustment: EstimateAdjustment::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorklogDecision {
    Submit(SubmitWorklog),
    /// Keep the time for later and stop the timer.
    Defer,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklogOutcome {
    Submitted {
        time_spent: Duration,
        /// `None` when no separate comment was due.
        comment_posted: Option<bool>,
        /// False when the issue changed while the worklog was in flight.
        timer_reset: bool,
    },
    Deferred {
        elapsed: Duration,
    },
    Cancelled,
}

pub struct WorklogFlow<R> {
    remote: R,
    store: IssueStore,
    comment_policy: WorklogCommentSetting,
    persistence: Arc<dyn IssuePersistence>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl<R: WorklogRemote> WorklogFlow<R> {
    pub fn new(
        remote: R,
        store: IssueStore,
        comment_policy: WorklogCommentSetting,
        persistence: Arc<dyn IssuePersistence>,
    ) -> Self {
        Self {
            remote,
            store,
            comment_policy,
            persistence,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn set_comment_policy(&mut self, policy: WorklogCommentSetting) {
        self.comment_policy = policy;
    }

    pub async fn prepare(&self, issue_key: &str) -> Result<WorklogPrompt, WorklogError> {
        if !self.remote.is_configured() {
            return Err(WorklogError::NotConfigured);
        }
        let issue = self
            .store
            .issue(issue_key)
            .ok_or_else(|| WorklogError::UnknownIssue(issue_key.to_string()))?;
        if issue.elapsed.is_zero() {
            return Err(WorklogError::NothingToLog(issue.key));
        }

        let timetracking = match self.remote.issue_timetracking(&issue.key).await {
            Ok(timetracking) => timetracking,
            Err(err) => {
                debug!(
                    "Remaining estimate unavailable for {}: {}",
                    issue.key,
                    redact_log_details(&err.to_string())
                );
                Timetracking::default()
            }
        };

        Ok(WorklogPrompt {
            started: issue.attribution_start.with_timezone(&Local),
            elapsed: issue.elapsed,
            comment: issue.comment,
            timetracking,
            issue_key: issue.key,
        })
    }

    pub async fn apply(&self, issue_key: &str, decision: WorklogDecision) -> Result<WorklogOutcome, WorklogError> {
        match decision {
            WorklogDecision::Cancel => Ok(WorklogOutcome::Cancelled),
            WorklogDecision::Defer => {
                let _guard = InFlightGuard::acquire(&self.in_flight, issue_key)?;
                self.store.pause(issue_key)?;
                let elapsed = self.store.elapsed(issue_key).unwrap_or_default();
                self.persist();
                Ok(WorklogOutcome::Deferred { elapsed })
            }
            WorklogDecision::Submit(submit) => self.submit(issue_key, submit).await,
        }
    }

    async fn submit(&self, issue_key: &str, submit: SubmitWorklog) -> Result<WorklogOutcome, WorklogError> {
        if !self.remote.is_configured() {
            return Err(WorklogError::NotConfigured);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight, issue_key)?;
        let issue = self
            .store
            .issue(issue_key)
            .ok_or_else(|| WorklogError::UnknownIssue(issue_key.to_string()))?;
        let time_spent = submit.time_spent.unwrap_or(issue.elapsed);
        if time_spent.is_zero() {
            return Err(WorklogError::NothingToLog(issue.key));
        }

        let comment = submit.comment.trim();
        let (worklog_comment, separate_comment) = match self.comment_policy {
            WorklogCommentSetting::WorklogOnly => (comment, None),
            WorklogCommentSetting::WorklogAndComment => (comment, Some(comment)),
            WorklogCommentSetting::CommentOnly => ("", Some(comment)),
        };
        let separate_comment = separate_comment.filter(|text| !text.is_empty());

        let posted = self
            .remote
            .post_worklog(&issue.key, submit.started, time_spent, worklog_comment, &submit.adjustment)
            .await;
        if !posted {
            return Err(WorklogError::SubmitFailed(issue.key));
        }

        let comment_posted = match separate_comment {
            Some(text) => {
                let ok = self.remote.post_comment(&issue.key, text).await;
                if !ok {
                    warn!("Worklog for {} posted but its comment was not", issue.key);
                }
                Some(ok)
            }
            None => None,
        };

        let timer_reset = self.store.reset_if_current(&issue.key, issue.generation);
        if timer_reset {
            self.persist();
        } else {
            warn!("Issue {} changed while its worklog was submitted; timer left as is", issue.key);
        }
        info!("Logged {} on {}", jira_api::duration::format(time_spent), issue.key);

        Ok(WorklogOutcome::Submitted {
            time_spent,
            comment_posted,
            timer_reset,
        })
    }

    fn persist(&self) {
        if let Err(err) = self.persistence.persist(&self.store.to_persisted()) {
            warn!(
                "Failed to save tracked issues: {}",
                redact_log_details(&err.to_string())
            );
        }
    }
}

/// Marks an issue as having a worklog action in flight until dropped.
struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightGuard {
    fn acquire(keys: &Arc<Mutex<HashSet<String>>>, key: &str) -> Result<Self, WorklogError> {
        let mut active = keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.to_string()) {
            return Err(WorklogError::InProgress(key.to_string()));
        }
        Ok(Self {
            keys: Arc::clone(keys),
            key: key.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
