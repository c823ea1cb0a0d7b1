// ============================================================
// Layer 6 — Local Run Store
// ============================================================
// Records runs as plain files so training works without a
// tracking server:
//
//   <root>/
//     <experiment>/
//       meta.json
//       <run_id>/
//         meta.json          ← status, start/end time
//         params/<key>       ← value
//         tags/<key>         ← value
//         metrics/<key>      ← "timestamp value step" per line
//         artifacts/...      ← copied files and directories
//
// Experiment ids are the experiment names; "Default" is used
// when no name is configured.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::domain::{
    error::{PipelineError, PipelineResult},
    traits::{RunInfo, RunStatus, Tracker},
};

pub const DEFAULT_EXPERIMENT: &str = "Default";
const META_FILE: &str = "meta.json";

#[derive(Debug, Serialize, Deserialize)]
struct ExperimentMeta {
    name: String,
    created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunMeta {
    run_id: String,
    run_name: Option<String>,
    experiment_id: String,
    status: String,
    start_time: i64,
    end_time: Option<i64>,
}

pub struct LocalTracker {
    root: PathBuf,
}

impl LocalTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run_dir(&self, run: &RunInfo) -> PathBuf {
        self.root.join(&run.experiment_id).join(&run.run_id)
    }

    fn write_value(&self, run: &RunInfo, kind: &str, key: &str, value: &str) -> PipelineResult<()> {
        check_key(key)?;
        let dir = self.run_dir(run).join(kind);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(key), value)?;
        Ok(())
    }

    fn read_run_meta(&self, run: &RunInfo) -> PipelineResult<RunMeta> {
        let path = self.run_dir(run).join(META_FILE);
        let text = fs::read_to_string(&path).map_err(|e| {
            PipelineError::Tracking(format!("unknown run '{}': {e}", run.run_id))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Status string stored for `run`.
    #[cfg(test)]
    pub(crate) fn run_status(&self, run: &RunInfo) -> PipelineResult<String> {
        Ok(self.read_run_meta(run)?.status)
    }
}

/// Keys and experiment names become file names.
fn check_key(key: &str) -> PipelineResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(PipelineError::Tracking(format!(
            "'{key}' cannot be stored as a file name"
        )));
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

impl Tracker for LocalTracker {
    fn resolve_experiment(&self, name: Option<&str>) -> PipelineResult<String> {
        let name = name.unwrap_or(DEFAULT_EXPERIMENT);
        check_key(name)?;

        let dir = self.root.join(name);
        let meta_path = dir.join(META_FILE);
        if !meta_path.exists() {
            fs::create_dir_all(&dir)?;
            let meta = ExperimentMeta {
                name: name.to_string(),
                created_at: Utc::now().timestamp_millis(),
            };
            write_json(&meta_path, &meta)?;
            tracing::info!("Created experiment '{}' in '{}'", name, self.root.display());
        }
        Ok(name.to_string())
    }

    fn open_run(&self, experiment_id: &str, run_name: Option<&str>) -> PipelineResult<RunInfo> {
        check_key(experiment_id)?;
        if !self.root.join(experiment_id).join(META_FILE).exists() {
            return Err(PipelineError::Tracking(format!(
                "experiment '{experiment_id}' does not exist"
            )));
        }

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let run_dir = self.root.join(experiment_id).join(&run_id);
        let artifacts = run_dir.join("artifacts");
        for sub in ["params", "metrics", "tags"] {
            fs::create_dir_all(run_dir.join(sub))?;
        }
        fs::create_dir_all(&artifacts)?;

        let meta = RunMeta {
            run_id: run_id.clone(),
            run_name: run_name.map(str::to_string),
            experiment_id: experiment_id.to_string(),
            status: "RUNNING".to_string(),
            start_time: Utc::now().timestamp_millis(),
            end_time: None,
        };
        write_json(&run_dir.join(META_FILE), &meta)?;

        Ok(RunInfo {
            run_id,
            experiment_id: experiment_id.to_string(),
            artifact_uri: artifacts.display().to_string(),
        })
    }

    fn set_tag(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
        self.write_value(run, "tags", key, value)
    }

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
        self.write_value(run, "params", key, value)
    }

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, step: u64) -> PipelineResult<()> {
        check_key(key)?;
        let dir = self.run_dir(run).join("metrics");
        fs::create_dir_all(&dir)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(key))?;
        writeln!(f, "{} {} {}", Utc::now().timestamp_millis(), value, step)?;
        Ok(())
    }

    fn log_artifact(
        &self,
        run: &RunInfo,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> PipelineResult<()> {
        let mut dest = PathBuf::from(&run.artifact_uri);
        if let Some(sub) = artifact_path {
            dest.push(sub);
        }
        fs::create_dir_all(&dest)?;

        if local_path.is_dir() {
            // directory contents land directly under `dest`
            for entry in WalkDir::new(local_path) {
                let entry = entry.map_err(|e| PipelineError::Io(e.into()))?;
                let relative = entry
                    .path()
                    .strip_prefix(local_path)
                    .map_err(|e| PipelineError::Tracking(e.to_string()))?;
                let target = dest.join(relative);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&target)?;
                } else {
                    fs::copy(entry.path(), &target)?;
                }
            }
        } else {
            let name = local_path.file_name().ok_or_else(|| {
                PipelineError::Tracking(format!("'{}' has no file name", local_path.display()))
            })?;
            fs::copy(local_path, dest.join(name))?;
        }
        Ok(())
    }

    fn close_run(&self, run: &RunInfo, status: RunStatus) -> PipelineResult<()> {
        let mut meta = self.read_run_meta(run)?;
        meta.status = status.as_str().to_string();
        meta.end_time = Some(Utc::now().timestamp_millis());
        write_json(&self.run_dir(run).join(META_FILE), &meta)
    }

    fn find_run(&self, run_id: &str) -> PipelineResult<RunInfo> {
        check_key(run_id)?;
        let unknown = || PipelineError::Tracking(format!("unknown run '{run_id}'"));
        if !self.root.is_dir() {
            return Err(unknown());
        }

        for entry in fs::read_dir(&self.root)? {
            let experiment_dir = entry?.path();
            let run_dir = experiment_dir.join(run_id);
            if !run_dir.join(META_FILE).is_file() {
                continue;
            }
            let meta: RunMeta = serde_json::from_str(&fs::read_to_string(run_dir.join(META_FILE))?)?;
            return Ok(RunInfo {
                run_id: meta.run_id,
                experiment_id: meta.experiment_id,
                artifact_uri: run_dir.join("artifacts").display().to_string(),
            });
        }
        Err(unknown())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn open(tracker: &LocalTracker) -> RunInfo {
        let exp = tracker.resolve_experiment(Some("breeds")).unwrap();
        tracker.open_run(&exp, Some("first")).unwrap()
    }

    #[test]
    fn test_resolve_experiment_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        assert_eq!(tracker.resolve_experiment(None).unwrap(), DEFAULT_EXPERIMENT);
        assert_eq!(tracker.resolve_experiment(Some("x")).unwrap(), "x");
        assert_eq!(tracker.resolve_experiment(Some("x")).unwrap(), "x");
        assert!(dir.path().join("x/meta.json").exists());
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        assert!(tracker.resolve_experiment(Some("../escape")).is_err());
        let run = open(&tracker);
        assert!(tracker.log_param(&run, "a/b", "1").is_err());
    }

    #[test]
    fn test_open_run_requires_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        assert!(matches!(
            tracker.open_run("missing", None),
            Err(PipelineError::Tracking(_))
        ));
    }

    #[test]
    fn test_params_tags_and_metrics_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        let run = open(&tracker);

        tracker.log_param(&run, "max_length", "34").unwrap();
        tracker.set_tag(&run, "team", "ml").unwrap();
        tracker.log_metric(&run, "val_loss", 0.25, 0).unwrap();
        tracker.log_metric(&run, "val_loss", 0.125, 1).unwrap();

        let run_dir = dir.path().join("breeds").join(&run.run_id);
        assert_eq!(fs::read_to_string(run_dir.join("params/max_length")).unwrap(), "34");
        assert_eq!(fs::read_to_string(run_dir.join("tags/team")).unwrap(), "ml");

        let metric = fs::read_to_string(run_dir.join("metrics/val_loss")).unwrap();
        let lines: Vec<Vec<&str>> = metric.lines().map(|l| l.split(' ').collect()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1..], ["0.25", "0"]);
        assert_eq!(lines[1][1..], ["0.125", "1"]);
    }

    #[test]
    fn test_directory_artifact_copied_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path().join("store"));
        let run = open(&tracker);

        let model = dir.path().join("model");
        fs::create_dir_all(model.join("nested")).unwrap();
        fs::write(model.join("model.mpk.gz"), b"weights").unwrap();
        fs::write(model.join("nested/extra.txt"), b"x").unwrap();

        tracker.log_artifact(&run, &model, Some("model")).unwrap();

        let root = PathBuf::from(&run.artifact_uri);
        assert_eq!(fs::read(root.join("model/model.mpk.gz")).unwrap(), b"weights");
        assert!(root.join("model/nested/extra.txt").exists());
    }

    #[test]
    fn test_close_run_records_status_and_end_time() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        let run = open(&tracker);
        assert_eq!(tracker.run_status(&run).unwrap(), "RUNNING");

        tracker.close_run(&run, RunStatus::Failed).unwrap();
        let meta = tracker.read_run_meta(&run).unwrap();
        assert_eq!(meta.status, "FAILED");
        assert!(meta.end_time.is_some());
        assert_eq!(meta.run_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_find_run_searches_every_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path());
        tracker.resolve_experiment(None).unwrap();
        let run = open(&tracker);

        let found = tracker.find_run(&run.run_id).unwrap();
        assert_eq!(found, run);
        assert!(matches!(
            tracker.find_run("0123456789abcdef"),
            Err(PipelineError::Tracking(_))
        ));
        assert!(tracker.find_run("..").is_err());
    }

    #[test]
    fn test_find_run_in_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = LocalTracker::new(dir.path().join("never-created"));
        assert!(matches!(tracker.find_run("abc"), Err(PipelineError::Tracking(_))));
    }
}
