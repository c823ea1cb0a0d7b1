// ============================================================
// Layer 6 — Training History Logger
// ============================================================
// Records per-epoch training metrics to a CSV file that is
// attached to the tracking run as an artifact.
//
// Metrics recorded per epoch:
//   - epoch:          the epoch number (1, 2, 3, ...)
//   - train_loss:     mean binary cross-entropy over the epoch
//   - train_accuracy: fraction of training rows classified
//                     correctly at threshold 0.5
//
// Output file: <run work dir>/history.csv
//
// Example CSV output:
//   epoch,train_loss,train_accuracy
//   1,0.693100,0.583333
//   2,0.688400,0.600000
//
// Validation metrics are not in this file: they are computed
// once after the last epoch and logged to the tracker.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

pub const HISTORY_FILE_NAME: &str = "history.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average loss over all training batches, weighted by batch size
    pub train_loss: f64,

    /// Range: [0.0, 1.0]
    pub train_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_accuracy: f64) -> Self {
        Self { epoch, train_loss, train_accuracy }
    }
}

/// Logs epoch metrics to a CSV file, one row per epoch.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and start a fresh history file.
    /// Each training run gets its own work dir, so an existing
    /// file is truncated rather than appended to.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join(HISTORY_FILE_NAME);
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,train_loss,train_accuracy")?;
        tracing::debug!("Created history CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.train_accuracy)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, train_accuracy={:.4}",
            m.epoch,
            m.train_loss,
            m.train_accuracy,
        );

        Ok(())
    }

    /// Return the path to the history CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
