// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the trained classifier using Burn's
// NamedMpkGzFileRecorder at full precision, so the restored
// weights are bit-identical to the trained ones.
//
// What gets saved:
//   1. Model weights (model.mpk.gz) - all learned parameters
//   2. model_config.json           - architecture config
//
// The config is stored next to the weights so serving can
// rebuild an identically shaped module before loading the
// record into it.
//
// Directory layout:
//   <dir>/
//     model.mpk.gz
//     model_config.json
//
// This directory is what gets uploaded to the tracking run
// under the "model" artifact path.

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::shape::MAX_LEN;
use crate::ml::model::{SequenceClassifier, SequenceClassifierConfig};

/// Folder inside a tracking run's artifact root that holds the checkpoint.
pub const MODEL_ARTIFACT_PATH: &str = "model";

const WEIGHTS_STEM: &str = "model";
const CONFIG_FILE_NAME: &str = "model_config.json";

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of the model checkpoint.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the weights and the architecture config.
    /// Creates the directory if it doesn't already exist.
    pub fn save_model<B: Backend>(
        &self,
        model: &SequenceClassifier<B>,
        config: &SequenceClassifierConfig,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // Recorder appends the .mpk.gz extension to the stem
        let path = self.dir.join(WEIGHTS_STEM);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| anyhow::anyhow!("Failed to save checkpoint to '{}': {e:?}", path.display()))?;

        let config_path = self.dir.join(CONFIG_FILE_NAME);
        config
            .save(&config_path)
            .with_context(|| format!("Cannot write config to '{}'", config_path.display()))?;

        tracing::info!("Saved model checkpoint to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<SequenceClassifierConfig> {
        let path = self.dir.join(CONFIG_FILE_NAME);
        let cfg = SequenceClassifierConfig::load(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read config from '{}'. Has a model been trained? ({e})",
                path.display()
            )
        })?;

        if cfg.max_len != MAX_LEN {
            bail!(
                "Checkpoint expects sequences of length {}, this build pads to {}",
                cfg.max_len,
                MAX_LEN
            );
        }
        Ok(cfg)
    }

    /// Rebuild the model from the saved config and restore its weights.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<SequenceClassifier<B>> {
        let cfg = self.load_config()?;
        let path = self.dir.join(WEIGHTS_STEM);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| {
                anyhow::anyhow!("Cannot load checkpoint '{}': {e:?}", path.display())
            })?;

        tracing::info!("Loaded model checkpoint from '{}'", self.dir.display());
        Ok(cfg.init::<B>(device).load_record(record))
    }
}
