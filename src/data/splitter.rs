// ============================================================
// Layer 4 — Stratified Train/Validation Splitter
// ============================================================
// Splits the padded matrix into a training set and a validation
// set while keeping the share of positive labels the same in
// both. Each label class is shuffled and split on its own:
//
//   class rows c  →  round(c * validation_fraction) to validation
//                    the rest                        to training
//
// then each subset is shuffled again so the classes interleave.
// Per-class rounding keeps every subset's positive share within
// half a row of the overall share.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom with a
// caller-supplied RNG.

use rand::{seq::SliceRandom, Rng};

use crate::data::padding::PaddedMatrix;
use crate::domain::{
    error::{PipelineError, PipelineResult},
    shape::PaddedRow,
};

/// Share of rows held out for validation (60/40 split).
pub const VALIDATION_FRACTION: f64 = 0.4;

/// Smallest class size that can appear in both subsets.
pub const MIN_CLASS_ROWS: usize = 2;

/// Rows plus their labels, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledRows {
    pub rows: Vec<PaddedRow>,
    pub labels: Vec<u8>,
}

impl LabeledRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    fn take(matrix: &[PaddedRow], labels: &[u8], indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| matrix[i]).collect(),
            labels: indices.iter().map(|&i| labels[i]).collect(),
        }
    }
}

/// The (train, validation) partition of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPartition {
    pub train: LabeledRows,
    pub validation: LabeledRows,
}

/// Stratified split of `matrix`/`labels` with `validation_fraction`
/// of each class held out.
///
/// # Errors
/// `InsufficientData` when label 0 or label 1 has fewer than
/// MIN_CLASS_ROWS rows.
pub fn stratified_split<R: Rng + ?Sized>(
    matrix: &PaddedMatrix,
    labels: &[u8],
    validation_fraction: f64,
    rng: &mut R,
) -> PipelineResult<SplitPartition> {
    if matrix.len() != labels.len() {
        return Err(PipelineError::Configuration(format!(
            "{} rows but {} labels",
            matrix.len(),
            labels.len()
        )));
    }

    let mut train_idx = Vec::with_capacity(labels.len());
    let mut val_idx = Vec::new();

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() < MIN_CLASS_ROWS {
            return Err(PipelineError::InsufficientData {
                label: class,
                count: members.len(),
                required: MIN_CLASS_ROWS,
            });
        }

        members.shuffle(rng);

        // Clamp so both subsets receive at least one row of this class
        let n_val = ((members.len() as f64) * validation_fraction).round() as usize;
        let n_val = n_val.clamp(1, members.len() - 1);

        val_idx.extend_from_slice(&members[..n_val]);
        train_idx.extend_from_slice(&members[n_val..]);
    }

    train_idx.shuffle(rng);
    val_idx.shuffle(rng);

    let partition = SplitPartition {
        train: LabeledRows::take(matrix.rows(), labels, &train_idx),
        validation: LabeledRows::take(matrix.rows(), labels, &val_idx),
    };

    tracing::debug!(
        "Dataset split: {} training ({} positive), {} validation ({} positive)",
        partition.train.len(),
        partition.train.positives(),
        partition.validation.len(),
        partition.validation.positives(),
    );

    Ok(partition)
}

/// Pad every encoding to MAX_LEN, then split 60/40 with stratification.
pub fn prepare<R: Rng + ?Sized>(
    encodings: &[Vec<u32>],
    labels: &[u8],
    rng: &mut R,
) -> PipelineResult<SplitPartition> {
    let matrix = PaddedMatrix::from_encodings(encodings);
    stratified_split(&matrix, labels, VALIDATION_FRACTION, rng)
}
