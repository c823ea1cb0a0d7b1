use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// A key/value label attached to a tracking run.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Tag {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse the `[{"key": .., "value": ..}, ...]` list passed through the
    /// environment. Escaping backslashes added by shells are stripped first.
    pub fn parse_list(raw: &str) -> PipelineResult<Vec<Tag>> {
        let cleaned = raw.replace('\\', "");
        serde_json::from_str(&cleaned)
            .map_err(|e| PipelineError::Configuration(format!("invalid experiment tags: {e}")))
    }
}
