// ============================================================
// Layer 6 — Experiment Tracking
// ============================================================
// A training run is recorded through the Tracker trait:
//
//   tracker_for(url)   → pick a backend from the tracking URL
//       │
//       ▼
//   scoped(..)         → open a run, hand a TrackingSession to
//       │                the body, close the run afterwards
//       ▼
//   FINISHED / FAILED  → written exactly once per run
//
// Backends:
//   mlflow.rs - MLflow REST API 2.0 (http:// or https:// URLs)
//   local.rs  - plain directory tree (any other URL is a path)

use std::{path::Path, time::Duration};

use crate::domain::{
    error::PipelineResult,
    traits::{RunInfo, RunStatus, Tracker},
};

/// MLflow REST client
pub mod mlflow;

/// File-system run store
pub mod local;

/// Pick a backend for `url`: http(s) selects MLflow, anything
/// else is treated as a local directory.
pub fn tracker_for(url: &str, timeout: Duration) -> PipelineResult<Box<dyn Tracker>> {
    if url.starts_with("http://") || url.starts_with("https://") {
        tracing::info!("Tracking runs on MLflow at {}", url);
        Ok(Box::new(mlflow::MlflowTracker::new(url, timeout)?))
    } else {
        tracing::info!("Tracking runs in local store '{}'", url);
        Ok(Box::new(local::LocalTracker::new(url)))
    }
}

/// A tracker together with one open run.
pub struct TrackingSession<'a> {
    tracker: &'a dyn Tracker,
    run: RunInfo,
}

impl<'a> TrackingSession<'a> {
    pub fn open(
        tracker: &'a dyn Tracker,
        experiment_id: &str,
        run_name: Option<&str>,
    ) -> PipelineResult<Self> {
        let run = tracker.open_run(experiment_id, run_name)?;
        tracing::info!(
            "Opened run {} in experiment {}",
            run.run_id,
            run.experiment_id
        );
        Ok(Self { tracker, run })
    }

    pub fn run(&self) -> &RunInfo {
        &self.run
    }

    pub fn set_tag(&self, key: &str, value: &str) -> PipelineResult<()> {
        self.tracker.set_tag(&self.run, key, value)
    }

    pub fn log_param(&self, key: &str, value: &str) -> PipelineResult<()> {
        self.tracker.log_param(&self.run, key, value)
    }

    pub fn log_metric(&self, key: &str, value: f64, step: u64) -> PipelineResult<()> {
        self.tracker.log_metric(&self.run, key, value, step)
    }

    pub fn log_artifact(&self, local_path: &Path, artifact_path: Option<&str>) -> PipelineResult<()> {
        tracing::debug!("Logging artifact '{}'", local_path.display());
        self.tracker.log_artifact(&self.run, local_path, artifact_path)
    }

    pub fn close(self, status: RunStatus) -> PipelineResult<()> {
        self.tracker.close_run(&self.run, status)?;
        tracing::info!("Closed run {} as {}", self.run.run_id, status.as_str());
        Ok(())
    }
}

/// Run `body` inside a fresh run. The run is closed FINISHED when the
/// body succeeds and FAILED when it returns an error; a failure to
/// close after an earlier error is logged and the earlier error wins.
pub fn scoped<T>(
    tracker: &dyn Tracker,
    experiment_id: &str,
    run_name: Option<&str>,
    body: impl FnOnce(&TrackingSession<'_>) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let session = TrackingSession::open(tracker, experiment_id, run_name)?;

    match body(&session) {
        Ok(value) => {
            session.close(RunStatus::Finished)?;
            Ok(value)
        }
        Err(e) => {
            tracing::error!("Run {} failed: {:#}", session.run().run_id, e);
            if let Err(close_err) = session.close(RunStatus::Failed) {
                tracing::warn!("Could not mark run as failed: {}", close_err);
            }
            Err(e)
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tracking::local::LocalTracker;

    #[test]
    fn test_scoped_success_finishes_run() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        let exp = tracker.resolve_experiment(None).unwrap();

        let run = scoped(&tracker, &exp, Some("ok"), |session| {
            session.log_param("embedding_dim", "16")?;
            Ok(session.run().clone())
        })
        .unwrap();

        assert_eq!(tracker.run_status(&run).unwrap(), "FINISHED");
    }

    #[test]
    fn test_scoped_error_fails_run_and_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        let exp = tracker.resolve_experiment(None).unwrap();

        let mut seen = None;
        let result: anyhow::Result<()> = scoped(&tracker, &exp, None, |session| {
            seen = Some(session.run().clone());
            anyhow::bail!("collector exploded")
        });

        assert_eq!(result.unwrap_err().to_string(), "collector exploded");
        assert_eq!(tracker.run_status(&seen.unwrap()).unwrap(), "FAILED");
    }

    #[test]
    fn test_tracker_for_selects_backend_by_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let local = tracker_for(&dir.path().display().to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(local.resolve_experiment(None).unwrap(), "Default");

        // construction does not touch the network
        assert!(tracker_for("http://127.0.0.1:5050", Duration::from_secs(1)).is_ok());
    }
}
