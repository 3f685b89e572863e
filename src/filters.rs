//! Issue filters offered for loading issues by JQL.

use jira_api::{Filter, JiraClient};
use log::{debug, warn};

use crate::logging::redact_log_details;

/// Built-in filters used when the user has no favourite filters.
pub fn default_filters() -> Vec<Filter> {
    vec![
        Filter::new(-1, "All", ""),
        Filter::new(-2, "Mine", "assignee = currentUser()"),
        Filter::new(-3, "Recent", "updated > -7d"),
    ]
}

/// Favourite filters of the authenticated user, or the built-in defaults when
/// the session is not valid or the user has none.
pub async fn available_filters(client: &JiraClient) -> Vec<Filter> {
    if !client.is_configured() || !client.validate_session().await {
        debug!("Jira session unavailable, using default filters");
        return default_filters();
    }
    match client.get_favorite_filters().await {
        Ok(filters) if !filters.is_empty() => filters,
        Ok(_) => default_filters(),
        Err(err) => {
            warn!(
                "Failed to load favourite filters: {}",
                redact_log_details(&err.to_string())
            );
            default_filters()
        }
    }
}

/// Returns the stored filter selection, clamped into range.
pub fn select_filter(filters: &[Filter], index: usize) -> Option<(usize, &Filter)> {
    let last = filters.len().checked_sub(1)?;
    let index = index.min(last);
    filters.get(index).map(|filter| (index, filter))
}
