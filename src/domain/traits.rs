// ============================================================
// Layer 3 — Core Traits
// ============================================================
// Seams between the pipeline and the outside world:
//
//   RecordSource - where labelled records come from
//                  (HTTP sample service, or a fake in tests)
//   Tracker      - where run parameters, metrics and artifacts go
//                  (MLflow REST server or a local file store)

use std::path::Path;

use crate::domain::error::PipelineResult;
use crate::domain::record::Record;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out one labelled record per call.
///
/// Implementations:
///   - HttpRecordSource → `GET {base}/test` on the sample service
pub trait RecordSource {
    /// Fetch the next record. Any failure is final for the caller.
    fn fetch(&self) -> PipelineResult<Record>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}

// ─── Tracker ──────────────────────────────────────────────────────────────────
/// Lifecycle state written when a run is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Identity of an open tracking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    /// Where the backend stores this run's artifacts
    pub artifact_uri: String,
}

/// An experiment-tracking backend.
///
/// Implementations:
///   - MlflowTracker → MLflow REST API 2.0
///   - LocalTracker  → directory tree on local disk
pub trait Tracker {
    /// Return the id of the named experiment, creating it when needed.
    /// `None` selects the backend's default experiment.
    fn resolve_experiment(&self, name: Option<&str>) -> PipelineResult<String>;

    fn open_run(&self, experiment_id: &str, run_name: Option<&str>) -> PipelineResult<RunInfo>;

    fn set_tag(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()>;

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()>;

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, step: u64) -> PipelineResult<()>;

    /// Upload a file or a whole directory. `artifact_path` is the
    /// destination folder inside the run's artifact root.
    fn log_artifact(
        &self,
        run: &RunInfo,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> PipelineResult<()>;

    fn close_run(&self, run: &RunInfo, status: RunStatus) -> PipelineResult<()>;

    /// Look up an existing run by id, in any experiment.
    fn find_run(&self, run_id: &str) -> PipelineResult<RunInfo>;
}
