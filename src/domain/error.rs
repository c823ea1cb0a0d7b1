// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Typed failures raised by the data pipeline and the tracking
// backends. The application layer wraps these in anyhow with
// extra context; tests match on the variants directly.

use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sample fetch failed: transport error, timeout, non-2xx status
    /// or a body that does not decode as a record.
    #[error("network error while fetching '{url}': {reason}")]
    Network { url: String, reason: String },

    /// A label class is too small to appear in both split subsets.
    #[error("insufficient data: label {label} has {count} row(s), at least {required} needed to stratify")]
    InsufficientData {
        label: u8,
        count: usize,
        required: usize,
    },

    /// A required configuration value is absent or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tracking backend rejected a request.
    #[error("tracking error: {0}")]
    Tracking(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
