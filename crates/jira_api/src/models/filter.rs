use serde::Deserialize;

use super::lenient::deserialize_id;

/// A saved JQL filter starred by the current user.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub jql: String,
}

impl Filter {
    pub fn new(id: i64, name: impl Into<String>, jql: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            jql: jql.into(),
        }
    }
}
