// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to stack SequenceItems into
// tensors for one forward pass.
//
//   Input:  Vec of N items, each MAX_LEN codes + a label
//   Output: tokens [N, MAX_LEN] (Int), targets [N] (Int)
//
// Codes at or above VOCAB_SIZE have no embedding row, so they
// are fed as the padding index.

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};

use crate::data::dataset::SequenceItem;
use crate::domain::shape::{MAX_LEN, PAD_CODE, VOCAB_SIZE};

#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Padded codes - shape: [batch_size, MAX_LEN]
    pub tokens: Tensor<B, 2, Int>,

    /// Ground truth 0/1 - shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Map one code to an embedding index.
pub fn vocab_index(code: u32) -> i64 {
    if (code as usize) < VOCAB_SIZE {
        i64::from(code)
    } else {
        i64::from(PAD_CODE)
    }
}

/// Build a [rows, MAX_LEN] Int tensor from padded rows.
pub fn tokens_tensor<B: Backend>(rows: &[[u32; MAX_LEN]], device: &B::Device) -> Tensor<B, 2, Int> {
    let flat: Vec<i64> = rows
        .iter()
        .flat_map(|row| row.iter().map(|&c| vocab_index(c)))
        .collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), MAX_LEN]), device)
}

impl<B: Backend> Batcher<SequenceItem, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceItem>) -> SequenceBatch<B> {
        let rows: Vec<[u32; MAX_LEN]> = items.iter().map(|i| i.tokens).collect();
        let labels: Vec<i64> = items.iter().map(|i| i64::from(i.label)).collect();

        let tokens = tokens_tensor::<B>(&rows, &self.device);
        let targets = Tensor::from_data(TensorData::new(labels, [items.len()]), &self.device);

        SequenceBatch { tokens, targets }
    }
}
