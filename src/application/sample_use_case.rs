// ============================================================
// Layer 2 — Sample Service Use Case
// ============================================================
// Loads the category set once, wraps it in a RecordGenerator
// and serves /live and /test until Ctrl-C.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::api;
use crate::data::generator::{RecordGenerator, POSITIVE_PROBABILITY};
use crate::domain::categories::CategorySet;

#[derive(Debug, Clone)]
pub struct SampleServiceConfig {
    pub bind: String,
    /// One name per line; the built-in breed list when absent
    pub categories: Option<PathBuf>,
    pub positive_probability: f64,
}

impl Default for SampleServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            categories: None,
            positive_probability: POSITIVE_PROBABILITY,
        }
    }
}

pub struct SampleServiceUseCase {
    config: SampleServiceConfig,
}

impl SampleServiceUseCase {
    pub fn new(config: SampleServiceConfig) -> Self {
        Self { config }
    }

    /// The generator every request draws from.
    pub fn generator(&self) -> Result<RecordGenerator> {
        let categories = match &self.config.categories {
            Some(path) => CategorySet::from_file(path)
                .with_context(|| format!("Cannot load categories from '{}'", path.display()))?,
            None => CategorySet::breeds(),
        };
        tracing::info!(
            "Sampling from {} categories with positive probability {}",
            categories.len(),
            self.config.positive_probability
        );
        let generator = RecordGenerator::new(categories)
            .with_positive_probability(self.config.positive_probability)?;
        Ok(generator)
    }

    pub fn execute(&self) -> Result<()> {
        let app = api::samples::router(self.generator()?);

        let runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(&self.config.bind)
                .await
                .with_context(|| format!("Cannot bind {}", self.config.bind))?;
            api::serve(listener, app).await
        })
    }
}
