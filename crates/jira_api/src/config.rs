use std::fmt;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "jira-stopwatch";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Username and API token pair used for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    /// Both parts must be non-blank for a request to be attempted.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.api_token.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// True when a base URL and complete credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && self.credentials.is_complete()
    }

    /// Joins a request path (which may carry an inline query) onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Web link for an issue, as opened from the issue summary.
    pub fn browse_url(&self, issue_key: &str) -> String {
        self.url_for(&format!("browse/{}", issue_key.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_incomplete() {
        assert!(!Credentials::new("", "token").is_complete());
        assert!(!Credentials::new("user", "   ").is_complete());
        assert!(Credentials::new("user", "token").is_complete());
    }

    #[test]
    fn url_for_normalizes_slashes() {
        let config = JiraConfig::new("https://jira.example.com/", Credentials::default());
        assert_eq!(
            config.url_for("/rest/auth/1/session"),
            "https://jira.example.com/rest/auth/1/session"
        );
        assert_eq!(
            config.browse_url(" FOO-1 "),
            "https://jira.example.com/browse/FOO-1"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let creds = Credentials::new("alice", "s3cr3t");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
