// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads a trained checkpoint once at start-up and serves
// POST /predict. The predictor is never swapped afterwards;
// serving a new model means restarting the process.
//
// The checkpoint comes either from a local directory or from
// the "model" artifact folder of a tracked training run.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};

use crate::api;
use crate::domain::traits::Tracker;
use crate::infra::{
    checkpoint::{CheckpointManager, MODEL_ARTIFACT_PATH},
    tracking,
};
use crate::ml::inferencer::Predictor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory holding model.mpk.gz and model_config.json
    Directory(PathBuf),
    /// Checkpoint logged by a training run
    TrackedRun { tracking_url: String, run_id: String },
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub bind: String,
    pub model: ModelSource,
    /// Upper bound for the tracking lookup
    pub request_timeout_secs: u64,
}

pub struct PredictUseCase {
    bind: String,
    predictor: Arc<Predictor>,
}

impl PredictUseCase {
    pub fn new(config: ServeConfig) -> Result<Self> {
        let model_dir = match &config.model {
            ModelSource::Directory(dir) => dir.clone(),
            ModelSource::TrackedRun { tracking_url, run_id } => {
                let timeout = Duration::from_secs(config.request_timeout_secs);
                let tracker = tracking::tracker_for(tracking_url, timeout)
                    .context("Cannot set up the tracking backend")?;
                model_dir_for_run(tracker.as_ref(), run_id)?
            }
        };

        let checkpoint = CheckpointManager::new(&model_dir);
        let predictor = Predictor::from_checkpoint(&checkpoint)
            .with_context(|| format!("Cannot load a model from '{}'", model_dir.display()))?;
        Ok(Self {
            bind: config.bind,
            predictor: Arc::new(predictor),
        })
    }

    pub fn execute(self) -> Result<()> {
        let Self { bind, predictor } = self;
        let app = api::predict::router(predictor);

        let runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Cannot bind {bind}"))?;
            api::serve(listener, app).await
        })
    }
}

/// Local directory of the checkpoint logged by `run_id`.
pub fn model_dir_for_run(tracker: &dyn Tracker, run_id: &str) -> Result<PathBuf> {
    let run = tracker
        .find_run(run_id)
        .with_context(|| format!("Cannot find run '{run_id}'"))?;
    let root = local_artifact_root(&run.artifact_uri).ok_or_else(|| {
        anyhow!(
            "Artifacts of run '{}' are stored at '{}', which is not on the local file system",
            run_id,
            run.artifact_uri
        )
    })?;

    let dir = root.join(MODEL_ARTIFACT_PATH);
    tracing::info!("Run {} resolved to model directory '{}'", run_id, dir.display());
    Ok(dir)
}

/// `file://` URIs and plain paths are local; any other scheme is not.
fn local_artifact_root(uri: &str) -> Option<PathBuf> {
    if let Some(path) = uri.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if uri.contains("://") || uri.starts_with("mlflow-artifacts:") {
        return None;
    }
    Some(Path::new(uri).to_path_buf())
}
