// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run, strictly in order:
//
//   Step 0: Resolve experiment + tags   (Layer 6 - infra)
//   Step 1: Open the tracking run       (Layer 6 - infra)
//   Step 2: Collect n records           (Layer 4 - data)
//   Step 3: Pad + stratified split      (Layer 4 - data)
//   Step 4: Build the model             (Layer 5 - ml)
//   Step 5: Fit for `epochs` passes     (Layer 5 - ml)
//   Step 6: Evaluate once               (Layer 5 - ml)
//   Step 7: Log params and metrics      (Layer 6 - infra)
//   Step 8: Save + log artifacts        (Layer 6 - infra)
//   Step 9: Close the run               (Layer 6 - infra)
//
// Steps 2-8 run inside tracking::scoped, so the run is closed
// as FAILED when any of them returns an error.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::{
    collector::{HttpRecordSource, TrainingDataCollector},
    dataset::SequenceDataset,
    splitter::prepare,
};
use crate::domain::{
    error::{PipelineError, PipelineResult},
    shape::{EMBEDDING_DIM, MAX_LEN},
    tag::Tag,
    traits::{RecordSource, Tracker},
};
use crate::infra::{
    checkpoint::{CheckpointManager, MODEL_ARTIFACT_PATH},
    metrics::MetricsLogger,
    tracking::{self, TrackingSession},
};
use crate::ml::{
    model::SequenceClassifierConfig,
    trainer::{evaluate, fit, init_model, FitSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Built once by the CLI layer and passed down; nothing below
// this point reads the environment.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub sample_service_url: String,
    pub sample_count: usize,
    pub tracking_url: String,
    pub experiment_name: Option<String>,
    /// Raw JSON list of `{key, value}` objects
    pub experiment_tags: Option<String>,
    pub run_name: Option<String>,
    /// Per-run work files go to `<artifact_dir>/<run_id>/`
    pub artifact_dir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// None draws from OS entropy
    pub seed: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            sample_service_url: "http://127.0.0.1:3000".to_string(),
            sample_count: 100,
            tracking_url: "http://127.0.0.1:5050".to_string(),
            experiment_name: None,
            experiment_tags: None,
            run_name: None,
            artifact_dir: PathBuf::from("artifacts"),
            epochs: 50,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: None,
            request_timeout_secs: 30,
        }
    }
}

impl TrainConfig {
    /// The experiment name with its parsed tags. Both must be present.
    pub fn experiment(&self) -> PipelineResult<(String, Vec<Tag>)> {
        let (Some(name), Some(raw_tags)) = (&self.experiment_name, &self.experiment_tags) else {
            return Err(PipelineError::Configuration(
                "experiment name and experiment tags must both be set".to_string(),
            ));
        };
        Ok((name.clone(), Tag::parse_list(raw_tags)?))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub experiment_id: String,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub val_loss: f64,
    pub val_accuracy: f64,
    /// Local copy of the saved checkpoint
    pub model_dir: PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run against the configured sample service and tracking backend.
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        let source = HttpRecordSource::new(&cfg.sample_service_url, cfg.request_timeout())?;
        let tracker = tracking::tracker_for(&cfg.tracking_url, cfg.request_timeout())
            .context("Cannot set up the tracking backend")?;
        self.execute_with(&source, tracker.as_ref())
    }

    /// Run with explicit collaborators.
    pub fn execute_with(&self, source: &dyn RecordSource, tracker: &dyn Tracker) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Step 0: Experiment configuration ─────────────────────────────────
        // Missing or malformed settings are not fatal: the run lands in
        // the backend's default experiment without tags.
        let (experiment_id, tags) = match cfg.experiment() {
            Ok((name, tags)) => {
                let id = tracker
                    .resolve_experiment(Some(&name))
                    .with_context(|| format!("Cannot resolve experiment '{name}'"))?;
                (id, tags)
            }
            Err(e) => {
                tracing::warn!("{}; continuing in the default experiment", e);
                (tracker.resolve_experiment(None)?, Vec::new())
            }
        };

        // ── Step 1-9: One scoped run ─────────────────────────────────────────
        tracking::scoped(tracker, &experiment_id, cfg.run_name.as_deref(), |session| {
            for tag in &tags {
                session.set_tag(&tag.key, &tag.value)?;
            }
            self.run(session, source)
        })
    }

    fn run(&self, session: &TrackingSession<'_>, source: &dyn RecordSource) -> Result<RunSummary> {
        let cfg = &self.config;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let work_dir = cfg.artifact_dir.join(&session.run().run_id);

        // ── Step 2: Collect ───────────────────────────────────────────────────
        let collected = TrainingDataCollector::new(source)
            .collect(cfg.sample_count, &work_dir, session)
            .context("Training data collection failed")?;

        // ── Step 3: Pad + split 60/40 ─────────────────────────────────────────
        let partition = prepare(&collected.encodings, &collected.labels, &mut rng)?;
        let train_rows = partition.train.len();
        let validation_rows = partition.validation.len();
        tracing::info!("Split: {} train, {} validation", train_rows, validation_rows);

        // ── Step 4: Build ─────────────────────────────────────────────────────
        let device = Default::default();
        let model_config = SequenceClassifierConfig::new();
        let model = init_model(&model_config, cfg.seed, &device);

        // ── Step 5: Fit ───────────────────────────────────────────────────────
        let history = MetricsLogger::new(&work_dir)?;
        let settings = FitSettings {
            epochs: cfg.epochs,
            batch_size: cfg.batch_size,
            learning_rate: cfg.learning_rate,
            shuffle_seed: rng.gen(),
        };
        tracing::info!(
            "Training for {} epochs (batch size {}, lr {})",
            settings.epochs,
            settings.batch_size,
            settings.learning_rate
        );
        let model = fit(model, SequenceDataset::from(partition.train), &settings, &history, &device)?;

        // ── Step 6: Evaluate once ─────────────────────────────────────────────
        let evaluation = evaluate(
            &model,
            SequenceDataset::from(partition.validation),
            cfg.batch_size,
            &device,
        );

        // ── Step 7: Params + metrics ──────────────────────────────────────────
        session.log_param("embedding_dim", &EMBEDDING_DIM.to_string())?;
        session.log_param("max_length", &MAX_LEN.to_string())?;
        session.log_metric("val_loss", evaluation.loss, 0)?;
        session.log_metric("val_accuracy", evaluation.accuracy, 0)?;

        // ── Step 8: Artifacts ─────────────────────────────────────────────────
        let checkpoint = CheckpointManager::new(work_dir.join(MODEL_ARTIFACT_PATH));
        checkpoint.save_model(&model, &model_config)?;
        session.log_artifact(checkpoint.dir(), Some(MODEL_ARTIFACT_PATH))?;
        session.log_artifact(history.csv_path(), None)?;

        Ok(RunSummary {
            run_id: session.run().run_id.clone(),
            experiment_id: session.run().experiment_id.clone(),
            train_rows,
            validation_rows,
            val_loss: evaluation.loss,
            val_accuracy: evaluation.accuracy,
            model_dir: checkpoint.dir().to_path_buf(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::samples;
    use crate::data::generator::RecordGenerator;
    use crate::domain::categories::CategorySet;
    use crate::domain::{record::Record, traits::{RunInfo, RunStatus}};
    use crate::infra::tracking::local::LocalTracker;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    /// Local store that also counts log_metric calls per key.
    struct CountingTracker {
        inner: LocalTracker,
        metric_calls: RefCell<HashMap<String, usize>>,
    }

    impl CountingTracker {
        fn new(root: &Path) -> Self {
            Self {
                inner: LocalTracker::new(root),
                metric_calls: RefCell::new(HashMap::new()),
            }
        }

        fn calls(&self, key: &str) -> usize {
            self.metric_calls.borrow().get(key).copied().unwrap_or(0)
        }
    }

    impl Tracker for CountingTracker {
        fn resolve_experiment(&self, name: Option<&str>) -> PipelineResult<String> {
            self.inner.resolve_experiment(name)
        }

        fn open_run(&self, experiment_id: &str, run_name: Option<&str>) -> PipelineResult<RunInfo> {
            self.inner.open_run(experiment_id, run_name)
        }

        fn set_tag(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
            self.inner.set_tag(run, key, value)
        }

        fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
            self.inner.log_param(run, key, value)
        }

        fn log_metric(&self, run: &RunInfo, key: &str, value: f64, step: u64) -> PipelineResult<()> {
            *self.metric_calls.borrow_mut().entry(key.to_string()).or_default() += 1;
            self.inner.log_metric(run, key, value, step)
        }

        fn log_artifact(
            &self,
            run: &RunInfo,
            local_path: &Path,
            artifact_path: Option<&str>,
        ) -> PipelineResult<()> {
            self.inner.log_artifact(run, local_path, artifact_path)
        }

        fn close_run(&self, run: &RunInfo, status: RunStatus) -> PipelineResult<()> {
            self.inner.close_run(run, status)
        }

        fn find_run(&self, run_id: &str) -> PipelineResult<RunInfo> {
            self.inner.find_run(run_id)
        }
    }

    /// In-process record source driven by a seeded generator.
    struct GeneratedSource {
        generator: RecordGenerator,
        rng: RefCell<StdRng>,
    }

    impl RecordSource for GeneratedSource {
        fn fetch(&self) -> PipelineResult<Record> {
            Ok(self.generator.generate(&mut *self.rng.borrow_mut()))
        }

        fn describe(&self) -> String {
            "seeded generator".to_string()
        }
    }

    /// Start the real Sample Service on an ephemeral port in a
    /// background thread and return its base URL.
    fn spawn_sample_service() -> String {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                let app = samples::router(RecordGenerator::new(CategorySet::breeds()));
                axum::serve(listener, app).await.unwrap();
            });
        });
        format!("http://{}", rx.recv().unwrap())
    }

    fn config(root: &Path, sample_service_url: String) -> TrainConfig {
        TrainConfig {
            sample_service_url,
            sample_count: 40,
            tracking_url: root.join("mlruns").display().to_string(),
            artifact_dir: root.join("work"),
            epochs: 2,
            batch_size: 8,
            seed: Some(7),
            request_timeout_secs: 5,
            ..TrainConfig::default()
        }
    }

    fn run_dir(root: &Path, experiment: &str, run_id: &str) -> PathBuf {
        root.join("mlruns").join(experiment).join(run_id)
    }

    /// The only run directory inside an experiment.
    fn single_run_dir(root: &Path, experiment: &str) -> PathBuf {
        let runs: Vec<PathBuf> = fs::read_dir(root.join("mlruns").join(experiment))
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_dir())
            .collect();
        assert_eq!(runs.len(), 1);
        runs.into_iter().next().unwrap()
    }

    fn status(run_dir: &Path) -> String {
        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(run_dir.join("meta.json")).unwrap()).unwrap();
        meta["status"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_experiment_requires_name_and_tags() {
        let mut cfg = TrainConfig {
            experiment_name: Some("breeds".into()),
            ..TrainConfig::default()
        };
        assert!(matches!(cfg.experiment(), Err(PipelineError::Configuration(_))));

        cfg.experiment_tags = Some("not json".into());
        assert!(matches!(cfg.experiment(), Err(PipelineError::Configuration(_))));

        cfg.experiment_tags = Some(r#"[{"key":"team","value":"ml"}]"#.into());
        let (name, tags) = cfg.experiment().unwrap();
        assert_eq!(name, "breeds");
        assert_eq!(tags, vec![Tag::new("team", "ml")]);
    }

    #[test]
    fn test_end_to_end_run_against_sample_service() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), spawn_sample_service());
        let tracker = LocalTracker::new(dir.path().join("mlruns"));
        let source = HttpRecordSource::new(&cfg.sample_service_url, Duration::from_secs(5)).unwrap();

        let summary = TrainUseCase::new(cfg).execute_with(&source, &tracker).unwrap();

        assert_eq!(summary.experiment_id, "Default");
        assert_eq!(summary.train_rows + summary.validation_rows, 40);
        assert!(summary.val_loss.is_finite() && summary.val_loss >= 0.0);
        assert!((0.0..=1.0).contains(&summary.val_accuracy));

        let run = run_dir(dir.path(), "Default", &summary.run_id);
        assert_eq!(status(&run), "FINISHED");

        // exactly one value per validation metric
        for metric in ["val_loss", "val_accuracy"] {
            let text = fs::read_to_string(run.join("metrics").join(metric)).unwrap();
            assert_eq!(text.lines().count(), 1, "{metric}");
        }
        assert_eq!(fs::read_to_string(run.join("params/embedding_dim")).unwrap(), "16");
        assert_eq!(fs::read_to_string(run.join("params/max_length")).unwrap(), "34");

        let artifacts = run.join("artifacts");
        let corpus = fs::read_to_string(artifacts.join("training_data.csv")).unwrap();
        assert_eq!(corpus.lines().count(), 41);
        let history = fs::read_to_string(artifacts.join("history.csv")).unwrap();
        assert_eq!(history.lines().count(), 3);
        assert!(artifacts.join("model/model.mpk.gz").exists());
        assert!(artifacts.join("model/model_config.json").exists());
        assert!(summary.model_dir.join("model.mpk.gz").exists());
    }

    #[test]
    fn test_validation_metrics_logged_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "http://unused".to_string());
        let tracker = CountingTracker::new(&dir.path().join("mlruns"));
        let source = GeneratedSource {
            generator: RecordGenerator::new(CategorySet::breeds()),
            rng: RefCell::new(StdRng::seed_from_u64(13)),
        };

        let summary = TrainUseCase::new(cfg).execute_with(&source, &tracker).unwrap();

        assert_eq!(tracker.calls("val_loss"), 1);
        assert_eq!(tracker.calls("val_accuracy"), 1);
        assert_eq!(tracker.metric_calls.borrow().len(), 2);
        let run = run_dir(dir.path(), "Default", &summary.run_id);
        assert_eq!(status(&run), "FINISHED");
    }

    #[test]
    fn test_configured_experiment_receives_tags() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            experiment_name: Some("breeds".into()),
            experiment_tags: Some(r#"[{"key":"team","value":"ml"}]"#.into()),
            run_name: Some("nightly".into()),
            ..config(dir.path(), spawn_sample_service())
        };

        let summary = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(summary.experiment_id, "breeds");
        let run = run_dir(dir.path(), "breeds", &summary.run_id);
        assert_eq!(fs::read_to_string(run.join("tags/team")).unwrap(), "ml");
    }

    #[test]
    fn test_unreachable_sample_service_fails_the_run() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let result = TrainUseCase::new(config(dir.path(), url)).execute();

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Network { .. })
        ));

        let run = single_run_dir(dir.path(), "Default");
        assert_eq!(status(&run), "FAILED");
        assert!(!run.join("artifacts/training_data.csv").exists());
        assert!(!run.join("metrics/val_loss").exists());
    }
}
