use serde::Deserialize;
use serde_json::Value;

use super::lenient::deserialize_opt_string;

const DESCRIPTION_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    /// Plain text on the v2 API, an Atlassian document on cloud instances.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub project: Option<NamedField>,
    #[serde(default)]
    pub status: Option<NamedField>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub timetracking: Option<Timetracking>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NamedField {
    #[serde(default)]
    pub name: Option<String>,
}

/// Remaining estimate of an issue. Both fields are absent when no estimate is configured.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timetracking {
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub remaining_estimate: Option<String>,
    #[serde(default)]
    pub remaining_estimate_seconds: Option<u64>,
}

impl Timetracking {
    pub fn has_estimate(&self) -> bool {
        self.remaining_estimate.is_some() || self.remaining_estimate_seconds.is_some()
    }
}

/// Result page of a JQL search.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub total: u64,
}

impl Issue {
    pub fn summary(&self) -> &str {
        self.fields.summary.as_deref().unwrap_or_default()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.fields.project.as_ref().and_then(|p| p.name.as_deref())
    }

    pub fn status_name(&self) -> Option<&str> {
        self.fields.status.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Summary line, optionally prefixed with `Project: `.
    pub fn display_summary(&self, include_project: bool) -> String {
        match (include_project, self.project_name()) {
            (true, Some(project)) => format!("{}: {}", project, self.summary()),
            _ => self.summary().to_string(),
        }
    }

    pub fn description_text(&self) -> Option<String> {
        self.fields
            .description
            .as_ref()
            .and_then(extract_text)
            .filter(|text| !text.trim().is_empty())
    }

    /// Description truncated for tooltips.
    pub fn description_preview(&self) -> Option<String> {
        self.description_text().map(|text| {
            if text.chars().count() > DESCRIPTION_PREVIEW_CHARS {
                let head: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
                format!("{head}...")
            } else {
                text
            }
        })
    }
}

/// Extracts plain text from a string or an Atlassian document node tree.
fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(extract_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Value::Object(node) => {
            if node.get("type").and_then(Value::as_str) == Some("text") {
                return node.get("text").and_then(Value::as_str).map(String::from);
            }
            node.get("content").and_then(extract_text)
        }
        _ => None,
    }
}
