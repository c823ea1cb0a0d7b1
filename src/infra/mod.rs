// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by more than one other layer:
//
//   checkpoint.rs - Saving and loading model weights
//                   Full-precision NamedMpkGzFileRecorder weights
//                   and Config::save for the architecture, so
//                   serving can rebuild the exact model.
//
//   metrics.rs    - Per-epoch training history
//                   Writes epoch, loss and accuracy to a CSV
//                   that is attached to the tracking run.
//
//   tracking/     - Experiment tracking backends
//                   MLflow REST client and a local file store,
//                   both behind the domain Tracker trait, plus
//                   the scoped run helper.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training history CSV logger
pub mod metrics;

/// Tracker backends and run sessions
pub mod tracking;
