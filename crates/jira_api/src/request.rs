//! Builders for fully specified, unexecuted Jira REST requests.
//!
//! Nothing here performs I/O. Issue keys are trimmed and otherwise passed
//! through untouched; the server decides whether a key exists.

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use reqwest::Method;
use serde_json::{json, Value};

use crate::duration;

pub const SEARCH_PAGE_SIZE: u32 = 200;
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    None,
    Json,
}

/// Method, path (with inline query where the endpoint defines one), extra
/// query parameters and body of a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub format: BodyFormat,
}

impl RequestDescriptor {
    fn get(path: String) -> Self {
        Self {
            method: Method::GET,
            path,
            query: Vec::new(),
            body: None,
            format: BodyFormat::None,
        }
    }

    fn post_json(path: String, body: Value) -> Self {
        Self {
            method: Method::POST,
            path,
            query: Vec::new(),
            body: Some(body),
            format: BodyFormat::Json,
        }
    }

    fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }
}

/// How the remaining estimate changes when a worklog is posted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EstimateAdjustment {
    #[default]
    Auto,
    Leave,
    SetTo(Duration),
    ManualDecrease(Duration),
}

pub fn validate_session() -> RequestDescriptor {
    RequestDescriptor::get("/rest/auth/1/session".to_string())
}

pub fn favourite_filters() -> RequestDescriptor {
    RequestDescriptor::get("/rest/api/2/filter/favourite".to_string())
}

/// The JQL is interpolated verbatim; encoding is the caller's job.
pub fn search_by_jql(jql: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!(
        "/rest/api/2/search?jql={}&maxResults={}",
        jql, SEARCH_PAGE_SIZE
    ))
}

pub fn issue_detail(issue_key: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/rest/api/2/issue/{}", issue_key.trim()))
}

pub fn issue_timetracking(issue_key: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!(
        "/rest/api/2/issue/{}?fields=timetracking",
        issue_key.trim()
    ))
}

pub fn post_worklog<Tz>(
    issue_key: &str,
    started: &DateTime<Tz>,
    time_spent: Duration,
    comment: &str,
    adjustment: &EstimateAdjustment,
) -> RequestDescriptor
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let body = json!({
        "timeSpent": duration::format(time_spent),
        "started": started.format(STARTED_FORMAT).to_string(),
        "comment": comment,
    });
    let request =
        RequestDescriptor::post_json(format!("/rest/api/2/issue/{}/worklog", issue_key.trim()), body);

    match adjustment {
        EstimateAdjustment::Auto => request,
        EstimateAdjustment::Leave => request.with_query("adjustEstimate", "leave"),
        EstimateAdjustment::SetTo(value) => request
            .with_query("adjustEstimate", "new")
            .with_query("newEstimate", duration::format(*value)),
        EstimateAdjustment::ManualDecrease(value) => request
            .with_query("adjustEstimate", "manual")
            .with_query("reduceBy", duration::format(*value)),
    }
}

pub fn post_comment(issue_key: &str, comment: &str) -> RequestDescriptor {
    RequestDescriptor::post_json(
        format!("/rest/api/2/issue/{}/comment", issue_key.trim()),
        json!({ "body": comment }),
    )
}

pub fn available_transitions(issue_key: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/rest/api/2/issue/{}/transitions", issue_key.trim()))
}

pub fn do_transition(issue_key: &str, transition_id: i64) -> RequestDescriptor {
    RequestDescriptor::post_json(
        format!("/rest/api/2/issue/{}/transitions", issue_key.trim()),
        json!({ "transition": { "id": transition_id.to_string() } }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    const PADDED_KEY: &str = "   FOO-42   ";

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 7, 26, 1, 44, 15).unwrap()
    }

    #[test]
    fn fixed_endpoints_use_literal_paths() {
        let session = validate_session();
        assert_eq!(session.method, Method::GET);
        assert_eq!(session.path, "/rest/auth/1/session");
        assert_eq!(session.format, BodyFormat::None);

        let filters = favourite_filters();
        assert_eq!(filters.method, Method::GET);
        assert_eq!(filters.path, "/rest/api/2/filter/favourite");
    }

    #[test]
    fn search_passes_jql_verbatim() {
        let request = search_by_jql("status%3Dopen");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/rest/api/2/search?jql=status%3Dopen&maxResults=200");
        assert!(request.query.is_empty());
    }

    #[test]
    fn issue_detail_trims_key() {
        assert_eq!(issue_detail("FOO-42").path, "/rest/api/2/issue/FOO-42");
        assert_eq!(issue_detail(PADDED_KEY).path, "/rest/api/2/issue/FOO-42");
    }

    #[test]
    fn timetracking_trims_key() {
        assert_eq!(
            issue_timetracking("FOO-42").path,
            "/rest/api/2/issue/FOO-42?fields=timetracking"
        );
        assert_eq!(
            issue_timetracking(PADDED_KEY).path,
            "/rest/api/2/issue/FOO-42?fields=timetracking"
        );
    }

    #[test]
    fn worklog_is_json_post_with_trimmed_key() {
        let request = post_worklog(
            PADDED_KEY,
            &started(),
            Duration::from_secs(3720),
            "Sorry for the inconvenience...",
            &EstimateAdjustment::Auto,
        );
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/api/2/issue/FOO-42/worklog");
        assert_eq!(request.format, BodyFormat::Json);
        assert!(request.query.is_empty());

        let body = request.body.expect("worklog body");
        assert_eq!(body["timeSpent"], "1h 2m");
        assert_eq!(body["started"], "2016-07-26T01:44:15.000+0000");
        assert_eq!(body["comment"], "Sorry for the inconvenience...");
    }

    #[test]
    fn worklog_started_keeps_local_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let request = post_worklog("A-1", &local, Duration::from_secs(60), "", &EstimateAdjustment::Auto);
        assert_eq!(
            request.body.unwrap()["started"],
            "2024-03-01T09:30:00.000+0200"
        );
    }

    #[test]
    fn estimate_adjustment_maps_to_query_parameters() {
        let query = |adjustment: EstimateAdjustment| {
            post_worklog("A-1", &started(), Duration::from_secs(60), "", &adjustment).query
        };
        let pairs = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        };

        assert!(query(EstimateAdjustment::Auto).is_empty());
        assert_eq!(
            query(EstimateAdjustment::Leave),
            pairs(&[("adjustEstimate", "leave")])
        );
        assert_eq!(
            query(EstimateAdjustment::SetTo(Duration::from_secs(2 * 3600))),
            pairs(&[("adjustEstimate", "new"), ("newEstimate", "2h")])
        );
        assert_eq!(
            query(EstimateAdjustment::ManualDecrease(Duration::from_secs(30 * 60))),
            pairs(&[("adjustEstimate", "manual"), ("reduceBy", "30m")])
        );
    }

    #[test]
    fn comment_is_json_post_with_trimmed_key() {
        let request = post_comment(PADDED_KEY, "Sorry for the inconvenience...");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/rest/api/2/issue/FOO-42/comment");
        assert_eq!(request.format, BodyFormat::Json);
        assert_eq!(request.body.unwrap()["body"], "Sorry for the inconvenience...");
    }

    #[test]
    fn transitions_share_path_and_trim_key() {
        let list = available_transitions(" TST-1 ");
        assert_eq!(list.method, Method::GET);
        assert_eq!(list.path, "/rest/api/2/issue/TST-1/transitions");

        let execute = do_transition(" TST-1 ", 5);
        assert_eq!(execute.method, Method::POST);
        assert_eq!(execute.path, "/rest/api/2/issue/TST-1/transitions");
        assert_eq!(execute.format, BodyFormat::Json);
        assert_eq!(execute.body.unwrap()["transition"]["id"], "5");
    }
}
