mod filter;
mod issue;
mod lenient;
mod session;
mod transition;

pub use filter::Filter;
pub use issue::{Issue, IssueFields, NamedField, SearchResult, Timetracking};
pub use session::SessionInfo;
pub use transition::Transition;
pub(crate) use transition::TransitionList;
