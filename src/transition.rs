use jira_api::{JiraClient, JiraError, Transition};
use log::info;

/// Moves an issue to its completion state.
///
/// Needs a configured client whose session validates; otherwise fails with
/// `CredentialsMissing` or `RequestDenied` without touching the issue.
pub async fn mark_done(client: &JiraClient, issue_key: &str) -> jira_api::Result<Transition> {
    if !client.is_configured() {
        return Err(JiraError::CredentialsMissing);
    }
    if !client.validate_session().await {
        return Err(JiraError::RequestDenied("Jira session is not valid".to_string()));
    }
    let transition = client.transition_to_done(issue_key).await?;
    info!("Moved {} through '{}'", issue_key.trim(), transition.name);
    Ok(transition)
}
