use serde::Deserialize;

use super::lenient::deserialize_id;

/// Workflow transition available for an issue.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub name: String,
}

impl Transition {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub(crate) struct TransitionList {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}
