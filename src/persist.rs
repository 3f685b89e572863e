//! Encoding of the tracked-issue list stored inside the settings file.
//!
//! The list is JSON, base64 encoded, with PascalCase keys and `TotalTime`
//! written as `hh:mm:ss` (or `d.hh:mm:ss` past one day).

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ConfigError;
use crate::logging::redact_log_details;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PersistedIssue {
    pub key: String,
    #[serde(with = "total_time")]
    pub total_time: Duration,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub timer_running: bool,
}

/// Sink the tracked-issue list is written to after every local change that
/// must survive a restart.
pub trait IssuePersistence: Send + Sync {
    fn persist(&self, issues: &[PersistedIssue]) -> Result<(), ConfigError>;
}

pub fn encode_issues(issues: &[PersistedIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }
    match serde_json::to_vec(issues) {
        Ok(json) => BASE64_STANDARD.encode(json),
        Err(err) => {
            warn!("Failed to encode tracked issues: {}", err);
            String::new()
        }
    }
}

/// Decodes the stored blob. Empty or corrupt input yields an empty list.
pub fn decode_issues(blob: &str) -> Vec<PersistedIssue> {
    let trimmed = blob.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let bytes = match BASE64_STANDARD.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Discarding undecodable tracked issues: {}", err);
            return Vec::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(issues) => issues,
        Err(err) => {
            warn!(
                "Discarding unreadable tracked issues: {}",
                redact_log_details(&err.to_string())
            );
            Vec::new()
        }
    }
}

mod total_time {
    use super::*;

    const SECS_PER_DAY: u64 = 24 * 3600;

    pub fn format(duration: &Duration) -> String {
        let total = duration.as_secs();
        let days = total / SECS_PER_DAY;
        let rest = Duration::from_secs(total % SECS_PER_DAY);
        let clock = jira_api::duration::format_clock(rest);
        if days > 0 {
            format!("{days}.{clock}")
        } else {
            clock
        }
    }

    pub fn parse(text: &str) -> Option<Duration> {
        // Drop fractional seconds ("01:02:03.4567890").
        let trimmed = text.trim();
        let whole = match trimmed.rfind('.') {
            Some(dot) if trimmed[dot..].len() > 1 && !trimmed[dot + 1..].contains(':') => &trimmed[..dot],
            _ => trimmed,
        };
        jira_api::duration::parse(whole).ok()
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid total time '{text}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, secs: u64, comment: Option<&str>, running: bool) -> PersistedIssue {
        PersistedIssue {
            key: key.to_string(),
            total_time: Duration::from_secs(secs),
            comment: comment.map(str::to_string),
            timer_running: running,
        }
    }

    #[test]
    fn total_time_uses_clock_format() {
        assert_eq!(total_time::format(&Duration::from_secs(3720)), "01:02:00");
        assert_eq!(total_time::format(&Duration::from_secs(26 * 3600 + 5)), "1.02:00:05");
        assert_eq!(total_time::parse("1.02:00:05"), Some(Duration::from_secs(26 * 3600 + 5)));
        assert_eq!(total_time::parse("00:10:30.1234567"), Some(Duration::from_secs(630)));
        assert_eq!(total_time::parse("nonsense"), None);
    }

    #[test]
    fn encode_then_decode_keeps_issues() {
        let issues = vec![
            issue("FOO-1", 3720, Some("review"), false),
            issue("BAR-7", 26 * 3600 + 5, None, true),
        ];
        let blob = encode_issues(&issues);
        assert!(!blob.is_empty());
        assert_eq!(decode_issues(&blob), issues);
    }

    #[test]
    fn blob_is_base64_json_with_pascal_case_keys() {
        let blob = encode_issues(&[issue("FOO-1", 61, None, true)]);
        let json = String::from_utf8(BASE64_STANDARD.decode(blob).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["Key"], "FOO-1");
        assert_eq!(value[0]["TotalTime"], "00:01:01");
        assert_eq!(value[0]["TimerRunning"], true);
    }

    #[test]
    fn decodes_blob_written_without_optional_fields() {
        let blob = BASE64_STANDARD.encode(r#"[{"Key":"OLD-3","TotalTime":"00:05:00"}]"#);
        assert_eq!(decode_issues(&blob), vec![issue("OLD-3", 300, None, false)]);
    }

    #[test]
    fn empty_and_corrupt_blobs_decode_to_nothing() {
        assert!(decode_issues("").is_empty());
        assert!(decode_issues("%%% not base64").is_empty());
        assert!(decode_issues(&BASE64_STANDARD.encode("not json")).is_empty());
        assert!(encode_issues(&[]).is_empty());
    }
}
