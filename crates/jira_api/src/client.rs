use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use tracing::{debug, warn};

use crate::completion::find_completion_transition;
use crate::config::JiraConfig;
use crate::error::Result;
use crate::models::{Filter, Issue, SearchResult, SessionInfo, Timetracking, Transition, TransitionList};
use crate::request::{self, EstimateAdjustment, RequestDescriptor};
use crate::requester::AuthenticatedRequester;

/// One method per Jira operation used by the stopwatch.
///
/// Reconfiguration builds a new client instead of mutating this one, so a
/// call that is already in flight keeps the credentials it started with.
#[derive(Clone)]
pub struct JiraClient {
    requester: AuthenticatedRequester,
    session_valid: Arc<AtomicBool>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        Ok(Self {
            requester: AuthenticatedRequester::new(config)?,
            session_valid: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns a client for `config`; the session must be validated again.
    pub fn reconfigure(&self, config: JiraConfig) -> Result<Self> {
        Self::new(config)
    }

    pub fn config(&self) -> &JiraConfig {
        self.requester.config()
    }

    pub fn is_configured(&self) -> bool {
        self.config().is_configured()
    }

    /// Outcome of the most recent [`JiraClient::validate_session`] call.
    pub fn session_valid(&self) -> bool {
        self.session_valid.load(Ordering::SeqCst)
    }

    pub async fn validate_session(&self) -> bool {
        let valid = match self
            .requester
            .execute::<SessionInfo>(request::validate_session())
            .await
        {
            Ok(session) => {
                debug!(user = ?session.name, "jira session is valid");
                true
            }
            Err(err) => {
                debug!(error = %err, "jira session validation failed");
                false
            }
        };
        self.session_valid.store(valid, Ordering::SeqCst);
        valid
    }

    pub async fn get_favorite_filters(&self) -> Result<Vec<Filter>> {
        let filters: Option<Vec<Filter>> = self.requester.execute(request::favourite_filters()).await?;
        Ok(filters.unwrap_or_default())
    }

    pub async fn get_issues_by_jql(&self, jql: &str) -> Result<SearchResult> {
        self.requester.execute(request::search_by_jql(jql)).await
    }

    pub async fn get_issue_detail(&self, issue_key: &str) -> Result<Issue> {
        self.requester.execute(request::issue_detail(issue_key)).await
    }

    pub async fn get_issue_timetracking(&self, issue_key: &str) -> Result<Timetracking> {
        let issue: Issue = self
            .requester
            .execute(request::issue_timetracking(issue_key))
            .await?;
        Ok(issue.fields.timetracking.unwrap_or_default())
    }

    /// Posts a worklog; failures are logged and reported as `false`.
    pub async fn post_worklog<Tz>(
        &self,
        issue_key: &str,
        started: &DateTime<Tz>,
        time_spent: Duration,
        comment: &str,
        adjustment: &EstimateAdjustment,
    ) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let request = request::post_worklog(issue_key, started, time_spent, comment, adjustment);
        self.mutate(request, "post worklog").await
    }

    pub async fn post_comment(&self, issue_key: &str, comment: &str) -> bool {
        self.mutate(request::post_comment(issue_key, comment), "post comment")
            .await
    }

    pub async fn get_available_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let list: TransitionList = self
            .requester
            .execute(request::available_transitions(issue_key))
            .await?;
        Ok(list.transitions)
    }

    pub async fn do_transition(&self, issue_key: &str, transition_id: i64) -> bool {
        self.mutate(request::do_transition(issue_key, transition_id), "execute transition")
            .await
    }

    /// Moves the issue through its completion transition and returns it.
    pub async fn transition_to_done(&self, issue_key: &str) -> Result<Transition> {
        let transitions = self.get_available_transitions(issue_key).await?;
        let done = find_completion_transition(&transitions)?.clone();
        self.requester
            .execute_expect_success(request::do_transition(issue_key, done.id))
            .await?;
        Ok(done)
    }

    async fn mutate(&self, request: RequestDescriptor, operation: &str) -> bool {
        let path = request.path.clone();
        match self.requester.execute_expect_success(request).await {
            Ok(()) => true,
            Err(err) => {
                warn!(operation, path = %path, kind = %err.kind(), error = %err, "jira mutation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::error::ErrorKind;
    use chrono::Utc;
    use mockito::{Matcher, Server, ServerGuard};

    async fn setup() -> (ServerGuard, JiraClient) {
        let server = Server::new_async().await;
        let config = JiraConfig::new(server.url(), Credentials::new("user", "token"));
        let client = JiraClient::new(config).expect("client");
        (server, client)
    }

    #[tokio::test]
    async fn validate_session_tracks_last_outcome() {
        let (mut server, client) = setup().await;
        assert!(!client.session_valid());

        let ok = server
            .mock("GET", "/rest/auth/1/session")
            .with_status(200)
            .with_body(r#"{"self": "x", "name": "user", "loginInfo": {"failedLoginCount": 0}}"#)
            .create_async()
            .await;
        assert!(client.validate_session().await);
        assert!(client.session_valid());
        ok.remove_async().await;

        let _denied = server
            .mock("GET", "/rest/auth/1/session")
            .with_status(401)
            .create_async()
            .await;
        assert!(!client.validate_session().await);
        assert!(!client.session_valid());
    }

    #[tokio::test]
    async fn reconfigure_starts_with_unvalidated_session() {
        let (mut server, client) = setup().await;
        let _ok = server
            .mock("GET", "/rest/auth/1/session")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        assert!(client.validate_session().await);

        let replaced = client
            .reconfigure(client.config().clone().with_credentials(Credentials::new("other", "t2")))
            .expect("reconfigured client");
        assert!(!replaced.session_valid());
        assert_eq!(replaced.config().credentials.username, "other");
        assert!(client.session_valid());
    }

    #[tokio::test]
    async fn favourite_filters_decode_and_empty_is_not_an_error() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/2/filter/favourite")
            .with_status(200)
            .with_body(
                r#"[{"id": "10000", "name": "My open", "jql": "assignee = currentUser()", "owner": {}},
                    {"id": 10001, "name": "Sprint", "jql": "sprint in openSprints()"}]"#,
            )
            .create_async()
            .await;
        let filters = client.get_favorite_filters().await.expect("filters");
        assert_eq!(
            filters,
            vec![
                Filter::new(10000, "My open", "assignee = currentUser()"),
                Filter::new(10001, "Sprint", "sprint in openSprints()"),
            ]
        );
        mock.remove_async().await;

        let _empty = server
            .mock("GET", "/rest/api/2/filter/favourite")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        assert!(client.get_favorite_filters().await.expect("no filters").is_empty());
    }

    #[tokio::test]
    async fn search_returns_issues_and_total() {
        let (mut server, client) = setup().await;
        let _mock = server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("jql".into(), "project = FOO".into()),
                Matcher::UrlEncoded("maxResults".into(), "200".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"startAt": 0, "maxResults": 200, "total": 2, "issues": [
                    {"key": "FOO-1", "fields": {"summary": "One"}},
                    {"key": "FOO-2", "fields": {"summary": "Two"}}]}"#,
            )
            .create_async()
            .await;

        let result = client
            .get_issues_by_jql("project%20%3D%20FOO")
            .await
            .expect("search");
        assert_eq!(result.total, 2);
        assert_eq!(result.issues[1].key, "FOO-2");
        assert_eq!(result.issues[0].summary(), "One");
    }

    #[tokio::test]
    async fn issue_detail_and_timetracking_use_trimmed_key() {
        let (mut server, client) = setup().await;
        let _detail = server
            .mock("GET", "/rest/api/2/issue/FOO-1")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"key": "FOO-1", "fields": {"summary": "Fix", "project": {"name": "Foo"}}}"#)
            .create_async()
            .await;
        let _tracking = server
            .mock("GET", "/rest/api/2/issue/FOO-1")
            .match_query(Matcher::UrlEncoded("fields".into(), "timetracking".into()))
            .with_status(200)
            .with_body(r#"{"key": "FOO-1", "fields": {"timetracking": {"remainingEstimate": "3h", "remainingEstimateSeconds": 10800}}}"#)
            .create_async()
            .await;

        let detail = client.get_issue_detail("  FOO-1 ").await.expect("detail");
        assert_eq!(detail.display_summary(true), "Foo: Fix");

        let tracking = client.get_issue_timetracking(" FOO-1").await.expect("tracking");
        assert_eq!(tracking.remaining_estimate.as_deref(), Some("3h"));
        assert_eq!(tracking.remaining_estimate_seconds, Some(10800));
    }

    #[tokio::test]
    async fn mutations_report_success_as_bool() {
        let (mut server, client) = setup().await;
        let worklog = server
            .mock("POST", "/rest/api/2/issue/FOO-1/worklog")
            .with_status(201)
            .with_body(r#"{"id": "100"}"#)
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/rest/api/2/issue/FOO-1/comment")
            .match_body(Matcher::Json(serde_json::json!({"body": "note"})))
            .with_status(500)
            .create_async()
            .await;

        let posted = client
            .post_worklog(
                "FOO-1",
                &Utc::now(),
                Duration::from_secs(600),
                "note",
                &EstimateAdjustment::Auto,
            )
            .await;
        assert!(posted);
        assert!(!client.post_comment("FOO-1", "note").await);
        worklog.assert_async().await;
        comment.assert_async().await;
    }

    #[tokio::test]
    async fn mutations_without_credentials_never_reach_the_server() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let client = JiraClient::new(JiraConfig::new(server.url(), Credentials::default())).unwrap();
        assert!(!client.is_configured());
        assert!(!client.post_comment("FOO-1", "note").await);
        assert!(!client.do_transition("FOO-1", 5).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transition_to_done_executes_inferred_transition() {
        let (mut server, client) = setup().await;
        let _list = server
            .mock("GET", "/rest/api/2/issue/TST-1/transitions")
            .with_status(200)
            .with_body(
                r#"{"expand": "transitions", "transitions": [
                    {"id": "11", "name": "To Do"},
                    {"id": "21", "name": "In Progress"},
                    {"id": "31", "name": "Done", "to": {"name": "Done"}}]}"#,
            )
            .create_async()
            .await;
        let execute = server
            .mock("POST", "/rest/api/2/issue/TST-1/transitions")
            .match_body(Matcher::Json(serde_json::json!({"transition": {"id": "31"}})))
            .with_status(204)
            .create_async()
            .await;

        let done = client.transition_to_done("TST-1").await.expect("transitioned");
        assert_eq!(done, Transition::new(31, "Done"));
        execute.assert_async().await;
    }

    #[tokio::test]
    async fn transition_to_done_without_candidate_does_not_post() {
        let (mut server, client) = setup().await;
        let _list = server
            .mock("GET", "/rest/api/2/issue/TST-2/transitions")
            .with_status(200)
            .with_body(r#"{"transitions": [{"id": "11", "name": "To Do"}, {"id": "21", "name": "In Progress"}]}"#)
            .create_async()
            .await;
        let execute = server
            .mock("POST", "/rest/api/2/issue/TST-2/transitions")
            .expect(0)
            .create_async()
            .await;

        let err = client.transition_to_done("TST-2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCompletionTransition);
        execute.assert_async().await;
    }
}
