//! Conversion between durations and Jira's compact time syntax ("1d 2h 30m").

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{JiraError, Result};

static JIRA_TIME_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*([wdhm])").expect("invalid jira time token regex")
});
static JIRA_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\s*\d+(?:[.,]\d+)?\s*[wdhm])+\s*$").expect("invalid jira time regex")
});
static CLOCK_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\.)?(\d+):([0-5]?\d)(?::([0-5]?\d))?$").expect("invalid clock time regex")
});

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

/// Renders a duration as compact Jira time, e.g. `1d 1h 2m`.
///
/// Seconds are truncated. Zero-valued units are skipped; a duration below one
/// minute renders as `0m`.
pub fn format(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / SECS_PER_DAY;
    let hours = (total % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }

    if parts.is_empty() {
        "0m".to_string()
    } else {
        parts.join(" ")
    }
}

/// Renders a duration as `hh:mm:ss`; hours are not wrapped at 24.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / SECS_PER_HOUR,
        (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
        total % SECS_PER_MINUTE
    )
}

/// Parses compact Jira time (`2h 30m`, `1.5h`, `1w`) or clock time
/// (`hh:mm:ss`, `h:mm`, `d.hh:mm:ss`).
pub fn parse(text: &str) -> Result<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(JiraError::InvalidDuration("duration cannot be empty".to_string()));
    }

    if let Some(duration) = parse_clock(trimmed) {
        return Ok(duration);
    }

    if !JIRA_TIME_REGEX.is_match(trimmed) {
        return Err(JiraError::InvalidDuration(trimmed.to_string()));
    }

    let mut seconds = 0u64;
    for capture in JIRA_TIME_TOKEN_REGEX.captures_iter(trimmed) {
        let value = capture[1]
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| JiraError::InvalidDuration(trimmed.to_string()))?;
        let unit = match capture[2].to_ascii_lowercase().as_str() {
            "w" => SECS_PER_WEEK,
            "d" => SECS_PER_DAY,
            "h" => SECS_PER_HOUR,
            _ => SECS_PER_MINUTE,
        };
        let token_seconds = value * unit as f64;
        if !token_seconds.is_finite() || token_seconds >= u64::MAX as f64 {
            return Err(JiraError::InvalidDuration(trimmed.to_string()));
        }
        seconds = seconds
            .checked_add(token_seconds as u64)
            .ok_or_else(|| JiraError::InvalidDuration(trimmed.to_string()))?;
    }

    Ok(Duration::from_secs(seconds))
}

/// Returns true when `text` would be accepted by [`parse`].
pub fn is_valid(text: &str) -> bool {
    parse(text).is_ok()
}

fn parse_clock(text: &str) -> Option<Duration> {
    let capture = CLOCK_TIME_REGEX.captures(text)?;
    let days = match capture.get(1) {
        Some(value) => value.as_str().parse::<u64>().ok()?,
        None => 0,
    };
    let hours = capture[2].parse::<u64>().ok()?;
    let minutes = capture[3].parse::<u64>().ok()?;
    let seconds = match capture.get(4) {
        Some(value) => value.as_str().parse::<u64>().ok()?,
        None => 0,
    };
    let total = days
        .checked_mul(SECS_PER_DAY)?
        .checked_add(hours.checked_mul(SECS_PER_HOUR)?)?
        .checked_add(minutes * SECS_PER_MINUTE + seconds)?;
    Some(Duration::from_secs(total))
}
