// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits the classifier on the training subset with Burn's
// DataLoader and Adam, then scores it once on the validation
// subset after the final epoch.
//
//   - Training uses TrainBackend (Autodiff<InferBackend>)
//   - model.valid() returns the model on InferBackend
//   - Validation batcher must also use InferBackend
//
// No early stopping and no per-epoch checkpoints: every run
// trains for exactly `epochs` passes.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{batcher::SequenceBatcher, dataset::SequenceDataset};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{SequenceClassifier, SequenceClassifierConfig};

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

/// Hyperparameters that cross into the numerical library.
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Seeds the batch shuffling order
    pub shuffle_seed: u64,
}

/// Scores computed once on the validation subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
    pub samples: usize,
}

/// Fresh model on the training backend. A seed makes weight
/// initialisation repeatable.
pub fn init_model(
    config: &SequenceClassifierConfig,
    seed: Option<u64>,
    device: &<TrainBackend as Backend>::Device,
) -> SequenceClassifier<TrainBackend> {
    if let Some(seed) = seed {
        TrainBackend::seed(seed);
    }
    config.init(device)
}

/// Run `settings.epochs` passes of Adam over `train`.
/// Each epoch's average loss and accuracy are appended to `history`.
pub fn fit(
    mut model: SequenceClassifier<TrainBackend>,
    train: SequenceDataset,
    settings: &FitSettings,
    history: &MetricsLogger,
    device: &<TrainBackend as Backend>::Device,
) -> Result<SequenceClassifier<TrainBackend>> {
    let mut optim = AdamConfig::new().init();

    let train_batcher = SequenceBatcher::<TrainBackend>::new(device.clone());
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(settings.batch_size)
        .shuffle(settings.shuffle_seed)
        .num_workers(1)
        .build(train);

    for epoch in 1..=settings.epochs {
        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        for batch in train_loader.iter() {
            let rows = batch.targets.dims()[0];
            let (loss, logits) = model.forward_loss(batch.tokens, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>() * rows as f64;
            correct += count_correct(logits, batch.targets);
            seen += rows;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);
        }

        let metrics = EpochMetrics::new(
            epoch,
            if seen > 0 { loss_sum / seen as f64 } else { f64::NAN },
            if seen > 0 { correct as f64 / seen as f64 } else { 0.0 },
        );
        tracing::info!(
            "Epoch {:>3}/{} | loss={:.4} | accuracy={:.1}%",
            epoch,
            settings.epochs,
            metrics.train_loss,
            metrics.train_accuracy * 100.0,
        );
        history.log(&metrics)?;
    }

    Ok(model)
}

/// Mean binary cross-entropy and 0.5-threshold accuracy over `data`.
pub fn evaluate(
    model: &SequenceClassifier<TrainBackend>,
    data: SequenceDataset,
    batch_size: usize,
    device: &<InferBackend as Backend>::Device,
) -> Evaluation {
    // model.valid() → SequenceClassifier<InferBackend>, no autodiff graph
    let model = model.valid();

    let batcher = SequenceBatcher::<InferBackend>::new(device.clone());
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1)
        .build(data);

    let bce = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(device);

    let mut loss_sum = 0.0f64;
    let mut correct = 0usize;
    let mut samples = 0usize;

    for batch in loader.iter() {
        let rows = batch.targets.dims()[0];
        let logits = model.forward_logits(batch.tokens);

        let batch_loss = bce
            .forward(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * rows as f64;
        correct += count_correct(logits, batch.targets);
        samples += rows;
    }

    let evaluation = Evaluation {
        loss: if samples > 0 { loss_sum / samples as f64 } else { f64::NAN },
        accuracy: if samples > 0 { correct as f64 / samples as f64 } else { 0.0 },
        samples,
    };
    tracing::info!(
        "Validation | loss={:.4} | accuracy={:.1}% | samples={}",
        evaluation.loss,
        evaluation.accuracy * 100.0,
        evaluation.samples,
    );
    evaluation
}

/// A logit above zero is a probability above 0.5.
fn count_correct<B: Backend>(logits: Tensor<B, 1>, targets: Tensor<B, 1, Int>) -> usize {
    logits
        .greater_elem(0.0)
        .int()
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
