// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one goal each. No model
// math, no HTTP handlers, no printing: only workflow.

// The training run: collect, prepare, fit, evaluate, track
pub mod train_use_case;

// The synthetic Sample Service
pub mod sample_use_case;

// Model serving over a trained checkpoint
pub mod predict_use_case;
