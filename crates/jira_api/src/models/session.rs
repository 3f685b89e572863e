use serde::Deserialize;

use super::lenient::deserialize_opt_string;

/// Body of the authenticated session endpoint; only used as a liveness probe.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub name: Option<String>,
}
