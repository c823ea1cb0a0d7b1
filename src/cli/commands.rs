// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags. Tracking and
// sample-service settings fall back to environment variables
// through clap's `env` attribute, so the application layer
// never reads the environment itself.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Subcommand};

use crate::application::{
    predict_use_case::{ModelSource, ServeConfig},
    sample_use_case::SampleServiceConfig,
    train_use_case::TrainConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect records from the sample service, train and track one run
    Train(TrainArgs),

    /// Run the synthetic Sample Service (/live, /test)
    Samples(SampleArgs),

    /// Serve a trained checkpoint over POST /predict
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Base URL of the Sample Service
    #[arg(long, env = "SAMPLE_SERVICE_URL", default_value = "http://127.0.0.1:3000")]
    pub sample_service_url: String,

    /// Number of records to collect
    #[arg(long, env = "SAMPLE_COUNT", default_value_t = 100,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub sample_count: u64,

    /// MLflow server URL (http/https) or a local directory
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = "http://127.0.0.1:5050")]
    pub tracking_url: String,

    #[arg(long, env = "MLFLOW_EXPERIMENT_NAME")]
    pub experiment_name: Option<String>,

    /// JSON list of {"key": .., "value": ..} objects
    #[arg(long, env = "MLFLOW_EXPERIMENT_TAGS")]
    pub experiment_tags: Option<String>,

    #[arg(long)]
    pub run_name: Option<String>,

    /// Where per-run work files (CSV, history, checkpoint) are written
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Number of full passes through the training subset
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Fix the split, shuffling and weight initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Upper bound for each HTTP call, in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            sample_service_url: a.sample_service_url,
            sample_count: a.sample_count as usize,
            tracking_url: a.tracking_url,
            experiment_name: a.experiment_name,
            experiment_tags: a.experiment_tags,
            run_name: a.run_name,
            artifact_dir: a.artifact_dir,
            epochs: a.epochs,
            batch_size: a.batch_size as usize,
            learning_rate: a.learning_rate,
            seed: a.seed,
            request_timeout_secs: a.request_timeout_secs,
        }
    }
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// File with one category name per line (default: built-in dog breeds)
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// Chance that a record is drawn from the category set
    #[arg(long, default_value_t = 0.4, value_parser = parse_probability)]
    pub positive_probability: f64,
}

/// A finite number within [0, 1].
fn parse_probability(raw: &str) -> Result<f64, String> {
    let p: f64 = raw.parse().map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    if !(0.0..=1.0).contains(&p) {
        return Err(format!("{p} is not within [0, 1]"));
    }
    Ok(p)
}

impl From<SampleArgs> for SampleServiceConfig {
    fn from(a: SampleArgs) -> Self {
        SampleServiceConfig {
            bind: a.bind,
            categories: a.categories,
            positive_probability: a.positive_probability,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Model directory written by `train` (<artifact-dir>/<run-id>/model)
    #[arg(long, required_unless_present = "run_id", conflicts_with = "run_id")]
    pub model_dir: Option<PathBuf>,

    /// Serve the model logged by this tracking run
    #[arg(long)]
    pub run_id: Option<String>,

    /// Tracking backend that holds `--run-id`
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = "http://127.0.0.1:5050")]
    pub tracking_url: String,

    /// Upper bound for the tracking lookup, in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = anyhow::Error;

    fn try_from(a: ServeArgs) -> anyhow::Result<Self> {
        let model = match (a.model_dir, a.run_id) {
            (Some(dir), None) => ModelSource::Directory(dir),
            (None, Some(run_id)) => ModelSource::TrackedRun {
                tracking_url: a.tracking_url,
                run_id,
            },
            _ => bail!("exactly one of --model-dir and --run-id is required"),
        };
        Ok(ServeConfig {
            bind: a.bind,
            model,
            request_timeout_secs: a.request_timeout_secs,
        })
    }
}
