//! Picks the workflow transition that closes an issue.
//!
//! Jira does not flag any transition as "done", so the choice is a
//! case-insensitive substring match on the transition name against a fixed
//! list of English and Polish completion words. Workflows using other
//! languages or unusual names will not match.

use crate::error::{JiraError, Result};
use crate::models::Transition;

const COMPLETION_SYNONYMS: [&str; 9] = [
    "done",
    "closed",
    "resolved",
    "completed",
    "finished",
    "gotowe",
    "zamknięte",
    "zakończone",
    "ukończone",
];

pub fn is_completion_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    COMPLETION_SYNONYMS
        .iter()
        .any(|synonym| lowered.contains(synonym))
}

/// First transition in list order whose name matches a completion word.
pub fn find_completion_transition(transitions: &[Transition]) -> Result<&Transition> {
    transitions
        .iter()
        .find(|transition| is_completion_name(&transition.name))
        .ok_or_else(|| JiraError::NoCompletionTransition {
            available: transitions.iter().map(|t| t.name.clone()).collect(),
        })
}
