// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, training and inference code lives here.
// The data layer only touches Burn through its Dataset and
// Batcher traits.
//
// What's in this layer:
//
//   model.rs      - The sequence classifier
//                   • Character embeddings (128 × 16)
//                   • Mean pooling over all positions
//                   • Dense(8, ReLU) → Dense(1) → sigmoid
//
//   trainer.rs    - Fit and evaluate
//                   Adam over shuffled batches for a fixed
//                   number of epochs, then one validation pass
//
//   inferencer.rs - The predictor behind the serving endpoint
//                   Loads a checkpoint and scores one record

/// Embedding + mean pooling binary classifier
pub mod model;

/// Training loop and validation scoring
pub mod trainer;

/// Checkpoint-backed single-record prediction
pub mod inferencer;
