//! Typed Jira REST client used by the stopwatch backend.

pub mod client;
pub mod completion;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod request;
pub mod requester;

pub use client::JiraClient;
pub use completion::find_completion_transition;
pub use config::{Credentials, JiraConfig};
pub use error::{ErrorKind, JiraError, Result};
pub use models::{Filter, Issue, IssueFields, NamedField, SearchResult, SessionInfo, Timetracking, Transition};
pub use request::{BodyFormat, EstimateAdjustment, RequestDescriptor};
pub use requester::AuthenticatedRequester;
