use keyring::{Entry, Error as KeyringError};
use thiserror::Error;

const KEYRING_SERVICE: &str = "jira-stopwatch";

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("API token must not be empty")]
    EmptyToken,
    #[error("keyring error: {0}")]
    Keyring(#[from] KeyringError),
}

/// Stores the Jira API token in the OS keyring, one entry per user and site.
#[derive(Clone, Debug)]
pub struct SecretsManager {
    service: String,
}

impl Default for SecretsManager {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl SecretsManager {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn load_token(&self, username: &str, base_url: &str) -> Result<Option<String>, SecretsError> {
        match self.entry(username, base_url)?.get_password() {
            Ok(token) => Ok(Some(token).filter(|token| !token.trim().is_empty())),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_token(&self, username: &str, base_url: &str, token: &str) -> Result<(), SecretsError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SecretsError::EmptyToken);
        }
        self.entry(username, base_url)?.set_password(trimmed)?;
        Ok(())
    }

    pub fn clear_token(&self, username: &str, base_url: &str) -> Result<(), SecretsError> {
        match self.entry(username, base_url)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn entry(&self, username: &str, base_url: &str) -> Result<Entry, SecretsError> {
        Ok(Entry::new(&self.service, &account_name(username, base_url))?)
    }
}

fn account_name(username: &str, base_url: &str) -> String {
    format!(
        "{}@{}",
        username.trim(),
        base_url.trim().trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_name_combines_user_and_site() {
        assert_eq!(
            account_name(" alice ", "https://jira.example.com/"),
            "alice@https://jira.example.com"
        );
    }

    #[test]
    fn empty_token_is_rejected_before_touching_keyring() {
        let manager = SecretsManager::default();
        assert!(matches!(
            manager.save_token("alice", "https://jira.example.com", "   "),
            Err(SecretsError::EmptyToken)
        ));
    }
}
