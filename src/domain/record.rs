// ============================================================
// Layer 3 — Record Domain Type
// ============================================================
// One synthetic labelled example. `content` is the per-character
// code of `value`, so the two always have the same length.
//
// Example:
//   value:   "pug"
//   content: [112, 117, 103]
//   flag:    true   (member of the category set)

use serde::{Deserialize, Serialize};

/// Full record as served by `GET /test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Character codes of `value`, in order
    pub content: Vec<u32>,

    /// Source text the codes were taken from
    pub value: String,

    /// Ground truth: true when `value` came from the category set
    pub flag: bool,
}

impl Record {
    /// Build a record from its source text, deriving `content`.
    pub fn from_value(value: impl Into<String>, flag: bool) -> Self {
        let value = value.into();
        Self {
            content: encode(&value),
            value,
            flag,
        }
    }

    /// Numeric label used for training: 1 for members, 0 otherwise.
    pub fn label(&self) -> u8 {
        u8::from(self.flag)
    }

    /// Drop the ground truth, keeping only what `GET /live` exposes.
    pub fn into_live(self) -> LiveRecord {
        LiveRecord {
            content: self.content,
        }
    }
}

/// Encoding-only record as served by `GET /live`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRecord {
    pub content: Vec<u32>,
}

/// Map every character of `text` to its Unicode scalar value.
pub fn encode(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}
