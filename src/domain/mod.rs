// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits shared by every other layer.
// No burn types, no HTTP, no file formats beyond serde derives.

// One labelled example and its wire shapes
pub mod record;

// The fixed pool of positive-class names
pub mod categories;

// Width/vocabulary constants shared by padding and the model
pub mod shape;

// Run tags passed through from the environment
pub mod tag;

// Error taxonomy for the pipeline
pub mod error;

// RecordSource and Tracker abstractions
pub mod traits;
