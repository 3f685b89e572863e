//! Error model used by Jira API client operations.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Represents the failure conditions of Jira API interactions: missing credentials, denied or unreachable endpoints, HTTP failures, timeouts, decoding problems, invalid duration input and the absence of a completion transition.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("username and API token are not set")]
    CredentialsMissing,
    #[error("request denied: {0}")]
    RequestDenied(String),
    #[error("http {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("no completion transition available (available: {})", .available.join(", "))]
    NoCompletionTransition { available: Vec<String> },
    #[error("unexpected error: {0}")]
    Other(String),
}

/// Coarse classification callers branch on when presenting errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CredentialsMissing,
    RequestDenied,
    RequestFailed,
    ParseInvalid,
    NoCompletionTransition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::CredentialsMissing => "credentials missing",
            ErrorKind::RequestDenied => "request denied",
            ErrorKind::RequestFailed => "request failed",
            ErrorKind::ParseInvalid => "invalid input",
            ErrorKind::NoCompletionTransition => "no completion transition",
        };
        f.write_str(label)
    }
}

impl JiraError {
    /// Constructs an HTTP error variant from a non-success response.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        JiraError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JiraError::CredentialsMissing => ErrorKind::CredentialsMissing,
            JiraError::RequestDenied(_) => ErrorKind::RequestDenied,
            JiraError::InvalidDuration(_) => ErrorKind::ParseInvalid,
            JiraError::NoCompletionTransition { .. } => ErrorKind::NoCompletionTransition,
            JiraError::Http { .. }
            | JiraError::Timeout(_)
            | JiraError::Serialization(_)
            | JiraError::Other(_) => ErrorKind::RequestFailed,
        }
    }
}

/// What reqwest reported about a failed request.
#[derive(Debug, Clone, Copy, Default)]
struct TransportFailure {
    connect: bool,
    builder: bool,
    timeout: bool,
    decode: bool,
    status: Option<StatusCode>,
}

impl TransportFailure {
    /// Connect and URL-building failures are denials, including connect-phase
    /// timeouts. Only timeouts after the connection was made stay `Timeout`.
    fn into_error(self, message: String) -> JiraError {
        if self.connect || self.builder {
            return JiraError::RequestDenied(message);
        }
        if self.timeout {
            return JiraError::Timeout(message);
        }
        match self.status {
            Some(status) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                JiraError::RequestDenied(message)
            }
            Some(status) => JiraError::http(status, message),
            None if self.decode => JiraError::Serialization(message),
            None => JiraError::Other(message),
        }
    }
}

impl From<reqwest::Error> for JiraError {
    fn from(err: reqwest::Error) -> Self {
        let failure = TransportFailure {
            connect: err.is_connect(),
            builder: err.is_builder(),
            timeout: err.is_timeout(),
            decode: err.is_decode(),
            status: if err.is_status() { err.status() } else { None },
        };
        failure.into_error(err.to_string())
    }
}

impl From<serde_json::Error> for JiraError {
    /// Converts serde_json decode/encode failures into serialization errors.
    fn from(err: serde_json::Error) -> Self {
        JiraError::Serialization(err.to_string())
    }
}
