//! Persistent stopwatch settings model and file-backed manager.

use std::fs;
use std::io;
use std::path::PathBuf;

use jira_api::{Credentials, JiraConfig};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::redact_log_details;
use crate::persist::{self, IssuePersistence, PersistedIssue};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("settings serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What happens to tracked time when the application restarts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveTimerSetting {
    NoSave,
    #[default]
    SavePause,
    SaveRunActive,
}

/// Reaction of running timers to the desktop session being locked.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PauseAndResumeSetting {
    NoPause,
    #[default]
    Pause,
    PauseAndResume,
}

/// Where the worklog comment ends up when a worklog is submitted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorklogCommentSetting {
    #[default]
    WorklogOnly,
    CommentOnly,
    WorklogAndComment,
}

fn default_issue_count() -> usize {
    20
}

/// Settings persisted on disk. The API token is kept in the OS keyring, not here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub jira_base_url: String,
    pub username: String,
    #[serde(default = "default_issue_count")]
    pub issue_count: usize,
    pub allow_multiple_timers: bool,
    pub include_project_name: bool,
    pub save_timer_state: SaveTimerSetting,
    pub pause_on_session_lock: PauseAndResumeSetting,
    pub post_worklog_comment: WorklogCommentSetting,
    pub current_filter: usize,
    pub persisted_issues: String,
    pub logging_enabled: bool,
    pub language_code: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_base_url: String::new(),
            username: String::new(),
            issue_count: default_issue_count(),
            allow_multiple_timers: false,
            include_project_name: false,
            save_timer_state: SaveTimerSetting::default(),
            pause_on_session_lock: PauseAndResumeSetting::default(),
            post_worklog_comment: WorklogCommentSetting::default(),
            current_filter: 0,
            persisted_issues: String::new(),
            logging_enabled: false,
            language_code: String::new(),
        }
    }
}

impl Settings {
    /// Connection config, only when base URL, username and token are all present.
    pub fn jira_config(&self, api_token: Option<&str>) -> Option<JiraConfig> {
        let token = api_token.map(str::trim).filter(|token| !token.is_empty())?;
        let config = JiraConfig::new(
            self.jira_base_url.trim(),
            Credentials::new(self.username.trim(), token),
        );
        config.is_configured().then_some(config)
    }

    pub fn issues(&self) -> Vec<PersistedIssue> {
        persist::decode_issues(&self.persisted_issues)
    }

    pub fn set_issues(&mut self, issues: &[PersistedIssue]) {
        self.persisted_issues = persist::encode_issues(issues);
    }
}

/// Loads and saves [`Settings`] as JSON in the platform config directory.
#[derive(Clone, Debug)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("", "", "jirastopwatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self {
            path: dirs.config_dir().join("settings.json"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads settings, falling back to defaults on read/parse errors.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(&self.path)
            .map_err(ConfigError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(ConfigError::from))
        {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "Ignoring unreadable settings file: {}",
                    redact_log_details(&err.to_string())
                );
                Settings::default()
            }
        }
    }

    /// Persists settings, creating parent directories when needed.
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl IssuePersistence for SettingsManager {
    fn persist(&self, issues: &[PersistedIssue]) -> Result<(), ConfigError> {
        let mut settings = self.load();
        settings.set_issues(issues);
        self.save(&settings)
    }
}
