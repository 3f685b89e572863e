use log::LevelFilter;

const SENSITIVE_HINTS: [&str; 7] = [
    "token",
    "authorization",
    "basic ",
    "api_token",
    "password",
    "set-cookie",
    "cookie",
];

/// Installs the process-wide logger. `verbose` (the `logging_enabled`
/// setting) forces debug output; otherwise `RUST_LOG` applies, defaulting to info.
/// Repeated calls are ignored.
pub fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

const CATEGORY_LIMIT: usize = 64;
const DETAILS_LIMIT: usize = 180;

/// Shortens an error message for the log and hides it entirely when it looks
/// like it carries credentials.
pub fn redact_log_details(value: &str) -> String {
    let words: Vec<&str> = value.split_whitespace().collect();
    let message = words.join(" ");
    let lowered = message.to_lowercase();
    if SENSITIVE_HINTS.iter().any(|hint| lowered.contains(hint)) {
        let category = message
            .split_once(':')
            .map_or(message.as_str(), |(head, _)| head)
            .trim();
        let category = if category.is_empty() { "error" } else { category };
        return format!(
            "{}: <redacted-sensitive-details>",
            clip(category, CATEGORY_LIMIT)
        );
    }
    clip(&message, DETAILS_LIMIT)
}

/// Keeps at most `limit` characters, the last one replaced by an ellipsis when cut.
fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit.saturating_sub(1)) {
        Some((cut, _)) if text.chars().count() > limit => format!("{}…", &text[..cut]),
        _ => text.to_string(),
    }
}
