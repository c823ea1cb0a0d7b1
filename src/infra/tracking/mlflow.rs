// ============================================================
// Layer 6 — MLflow Tracker
// ============================================================
// Talks to an MLflow tracking server over its REST API 2.0:
//
//   {base}/api/2.0/mlflow/experiments/get-by-name   GET
//   {base}/api/2.0/mlflow/experiments/create        POST
//   {base}/api/2.0/mlflow/runs/create               POST
//   {base}/api/2.0/mlflow/runs/set-tag              POST
//   {base}/api/2.0/mlflow/runs/log-parameter        POST
//   {base}/api/2.0/mlflow/runs/log-metric           POST
//   {base}/api/2.0/mlflow/runs/update               POST
//   {base}/api/2.0/mlflow/runs/get                  GET
//
// Artifacts go through the server's artifact proxy
// ({base}/api/2.0/mlflow-artifacts/artifacts/<path>, PUT), which
// is only available when the run's artifact_uri uses the
// `mlflow-artifacts:` scheme.
//
// Failed calls are reported with the server's `error_code`.

use std::{path::Path, time::Duration};

use chrono::Utc;
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::domain::{
    error::{PipelineError, PipelineResult},
    traits::{RunInfo, RunStatus, Tracker},
};

const API_VERSION: &str = "2.0";
const ARTIFACT_SCHEME: &str = "mlflow-artifacts:";
/// MLflow creates experiment "0" ("Default") on first start.
const DEFAULT_EXPERIMENT_ID: &str = "0";

#[derive(Deserialize)]
struct ExperimentEnvelope {
    experiment: Experiment,
}

#[derive(Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreatedExperiment {
    experiment_id: String,
}

#[derive(Deserialize)]
struct RunEnvelope {
    run: Run,
}

#[derive(Deserialize)]
struct Run {
    info: RunInfoBody,
}

#[derive(Deserialize)]
struct RunInfoBody {
    run_id: String,
    experiment_id: String,
    #[serde(default)]
    artifact_uri: String,
}

pub struct MlflowTracker {
    client: Client,
    base_url: String,
}

impl MlflowTracker {
    pub fn new(base_url: &str, timeout: Duration) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Tracking(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}/mlflow/{}", self.base_url, API_VERSION, path)
    }

    fn post<R: DeserializeOwned>(&self, path: &str, body: &Value) -> PipelineResult<R> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .map_err(|e| transport_error(path, e))?;
        decode(path, response)
    }

    fn create_experiment(&self, name: &str) -> PipelineResult<String> {
        let created: CreatedExperiment =
            self.post("experiments/create", &json!({ "name": name }))?;
        tracing::info!("Created MLflow experiment '{}' ({})", name, created.experiment_id);
        Ok(created.experiment_id)
    }

    fn upload(&self, run: &RunInfo, file: &Path, destination: &str) -> PipelineResult<()> {
        let root = run
            .artifact_uri
            .trim_start_matches(ARTIFACT_SCHEME)
            .trim_matches('/');
        let url = format!(
            "{}/api/{}/mlflow-artifacts/artifacts/{}/{}",
            self.base_url, API_VERSION, root, destination
        );

        let bytes = std::fs::read(file)?;
        let response = self
            .client
            .put(&url)
            .body(bytes)
            .send()
            .map_err(|e| transport_error("mlflow-artifacts", e))?;
        if !response.status().is_success() {
            return Err(api_error("mlflow-artifacts", response));
        }
        tracing::debug!("Uploaded '{}' to {}", file.display(), destination);
        Ok(())
    }
}

fn transport_error(path: &str, e: reqwest::Error) -> PipelineError {
    PipelineError::Tracking(format!("{path}: {e}"))
}

/// The `error_code` field of an MLflow error body, if any.
fn error_code(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v
            .get("error_code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "no error code in message".to_string()),
        Err(_) => "failed to decode body".to_string(),
    }
}

fn api_error(path: &str, response: Response) -> PipelineError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    tracing::debug!("MLflow {} error body: {}", path, body);
    PipelineError::Tracking(format!("{path} returned {status}: {}", error_code(&body)))
}

fn decode<R: DeserializeOwned>(path: &str, response: Response) -> PipelineResult<R> {
    if !response.status().is_success() {
        return Err(api_error(path, response));
    }
    response
        .json::<R>()
        .map_err(|e| PipelineError::Tracking(format!("{path}: undecodable response: {e}")))
}

/// Join an optional artifact folder and a relative file path with '/'.
fn artifact_destination(artifact_path: Option<&str>, relative: &Path) -> String {
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match artifact_path {
        Some(prefix) => format!("{}/{}", prefix.trim_matches('/'), relative),
        None => relative,
    }
}

impl Tracker for MlflowTracker {
    fn resolve_experiment(&self, name: Option<&str>) -> PipelineResult<String> {
        let Some(name) = name else {
            return Ok(DEFAULT_EXPERIMENT_ID.to_string());
        };

        let path = "experiments/get-by-name";
        let response = self
            .client
            .get(self.endpoint(path))
            .query(&[("experiment_name", name)])
            .send()
            .map_err(|e| transport_error(path, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return self.create_experiment(name);
        }
        let found: ExperimentEnvelope = decode(path, response)?;
        Ok(found.experiment.experiment_id)
    }

    fn open_run(&self, experiment_id: &str, run_name: Option<&str>) -> PipelineResult<RunInfo> {
        let mut body = json!({
            "experiment_id": experiment_id,
            "start_time": Utc::now().timestamp_millis(),
        });
        if let Some(name) = run_name {
            body["run_name"] = json!(name);
        }

        let created: RunEnvelope = self.post("runs/create", &body)?;
        Ok(RunInfo {
            run_id: created.run.info.run_id,
            experiment_id: created.run.info.experiment_id,
            artifact_uri: created.run.info.artifact_uri,
        })
    }

    fn set_tag(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
        let body = json!({ "run_id": run.run_id, "key": key, "value": value });
        self.post::<Value>("runs/set-tag", &body).map(|_| ())
    }

    fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> PipelineResult<()> {
        let body = json!({ "run_id": run.run_id, "key": key, "value": value });
        self.post::<Value>("runs/log-parameter", &body).map(|_| ())
    }

    fn log_metric(&self, run: &RunInfo, key: &str, value: f64, step: u64) -> PipelineResult<()> {
        let body = json!({
            "run_id": run.run_id,
            "key": key,
            "value": value,
            "timestamp": Utc::now().timestamp_millis(),
            "step": step,
        });
        self.post::<Value>("runs/log-metric", &body).map(|_| ())
    }

    fn log_artifact(
        &self,
        run: &RunInfo,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> PipelineResult<()> {
        if !run.artifact_uri.starts_with(ARTIFACT_SCHEME) {
            tracing::warn!(
                "Run artifact root '{}' is not served by the tracking server; skipping upload of '{}'",
                run.artifact_uri,
                local_path.display()
            );
            return Ok(());
        }

        if local_path.is_dir() {
            for entry in WalkDir::new(local_path) {
                let entry = entry.map_err(|e| PipelineError::Io(e.into()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(local_path)
                    .map_err(|e| PipelineError::Tracking(e.to_string()))?;
                self.upload(run, entry.path(), &artifact_destination(artifact_path, relative))?;
            }
            Ok(())
        } else {
            let name = local_path.file_name().ok_or_else(|| {
                PipelineError::Tracking(format!("'{}' has no file name", local_path.display()))
            })?;
            self.upload(run, local_path, &artifact_destination(artifact_path, Path::new(name)))
        }
    }

    fn close_run(&self, run: &RunInfo, status: RunStatus) -> PipelineResult<()> {
        let body = json!({
            "run_id": run.run_id,
            "status": status.as_str(),
            "end_time": Utc::now().timestamp_millis(),
        });
        self.post::<Value>("runs/update", &body).map(|_| ())
    }

    fn find_run(&self, run_id: &str) -> PipelineResult<RunInfo> {
        let path = "runs/get";
        let response = self
            .client
            .get(self.endpoint(path))
            .query(&[("run_id", run_id)])
            .send()
            .map_err(|e| transport_error(path, e))?;

        let found: RunEnvelope = decode(path, response)?;
        Ok(RunInfo {
            run_id: found.run.info.run_id,
            experiment_id: found.run.info.experiment_id,
            artifact_uri: found.run.info.artifact_uri,
        })
    }
}
