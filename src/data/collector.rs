// ============================================================
// Layer 4 — Training Data Collector
// ============================================================
// Calls the sample service `n` times in test mode, one request
// at a time, and keeps every record in a TrainingCorpus.
//
//   fetch × n ──► corpus ──► training_data.csv ──► tracker
//                   │
//                   └──────► (encodings, labels)
//
// Any failed fetch aborts the whole collection: no retry, no
// skip, and no CSV is written for a partial corpus.

use std::{path::Path, time::Duration};

use reqwest::blocking::Client;

use crate::data::corpus::{Collected, TrainingCorpus};
use crate::domain::{
    error::{PipelineError, PipelineResult},
    record::Record,
    traits::RecordSource,
};
use crate::infra::tracking::TrackingSession;

/// File name of the audit log inside the run directory.
pub const CORPUS_FILE_NAME: &str = "training_data.csv";

// ─── HttpRecordSource ─────────────────────────────────────────────────────────
/// Fetches records from `GET {base_url}/test`.
pub struct HttpRecordSource {
    client: Client,
    url: String,
}

impl HttpRecordSource {
    /// Every request is bounded by `timeout`; a timeout is a network error.
    pub fn new(base_url: &str, timeout: Duration) -> PipelineResult<Self> {
        let url = format!("{}/test", base_url.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::network(&url, e))?;
        Ok(Self { client, url })
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self) -> PipelineResult<Record> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| PipelineError::network(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::network(&self.url, format!("status {status}")));
        }

        response
            .json::<Record>()
            .map_err(|e| PipelineError::network(&self.url, format!("undecodable body: {e}")))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ─── TrainingDataCollector ────────────────────────────────────────────────────
pub struct TrainingDataCollector<'a> {
    source: &'a dyn RecordSource,
}

impl<'a> TrainingDataCollector<'a> {
    pub fn new(source: &'a dyn RecordSource) -> Self {
        Self { source }
    }

    /// Fetch `n` records, write the audit CSV into `work_dir`, forward it
    /// to the tracking session and return the parallel containers.
    pub fn collect(
        &self,
        n: usize,
        work_dir: &Path,
        session: &TrackingSession<'_>,
    ) -> PipelineResult<Collected> {
        if n == 0 {
            return Err(PipelineError::Configuration(
                "sample count must be a positive integer".to_string(),
            ));
        }

        tracing::info!("Collecting {} records from {}", n, self.source.describe());
        let mut corpus = TrainingCorpus::with_capacity(n);
        for i in 0..n {
            let record = self.source.fetch()?;
            tracing::debug!(index = i, flag = record.flag, "fetched '{}'", record.value);
            corpus.push(record);
        }
        tracing::info!(
            "Collected {} records ({} positive)",
            corpus.len(),
            corpus.positives()
        );

        std::fs::create_dir_all(work_dir)?;
        let csv_path = work_dir.join(CORPUS_FILE_NAME);
        corpus.write_csv(&csv_path)?;
        session.log_artifact(&csv_path, None)?;

        Ok(corpus.into_collected())
    }
}
