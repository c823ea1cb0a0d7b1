// ============================================================
// Layer 5 — Predictor
// ============================================================
// Loads a trained checkpoint once and scores single records.
// Shared across HTTP handlers behind an Arc, so the module
// sits in a Mutex to make the predictor Sync.
use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::sync::Mutex;

use crate::data::{batcher::tokens_tensor, padding::pad_encoding};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SequenceClassifier;
use crate::ml::trainer::InferBackend;

/// Probability at or above which a record counts as a member.
pub const DECISION_THRESHOLD: f32 = 0.5;

pub struct Predictor {
    model: Mutex<SequenceClassifier<InferBackend>>,
    device: <InferBackend as Backend>::Device,
}

impl Predictor {
    /// Wrap an in-memory model.
    #[cfg(test)]
    pub fn new(model: SequenceClassifier<InferBackend>) -> Self {
        Self {
            model: Mutex::new(model),
            device: Default::default(),
        }
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = Default::default();
        let model = ckpt_manager.load_model::<InferBackend>(&device)?;
        Ok(Self {
            model: Mutex::new(model),
            device,
        })
    }

    /// Membership probability for one encoding.
    /// Longer inputs are truncated to MAX_LEN, shorter ones padded.
    pub fn predict(&self, content: &[u32]) -> Result<f32> {
        let row = pad_encoding(content);
        let tokens = tokens_tensor::<InferBackend>(&[row], &self.device);

        let probs = {
            let model = self
                .model
                .lock()
                .map_err(|_| anyhow!("predictor lock poisoned"))?;
            model.forward(tokens)
        };

        let values: Vec<f32> = probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read prediction: {e:?}"))?;

        let p = values
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Model returned no prediction"))?;
        tracing::debug!("Predicted p={:.4} for {} codes", p, content.len());
        Ok(p)
    }
}
