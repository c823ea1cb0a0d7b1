// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a random draw and a tensor batch:
//
//   RecordGenerator   → one synthetic labelled record
//       │  (served over HTTP by the sample service)
//       ▼
//   Collector         → n sequential fetches, audit CSV
//       │
//       ▼
//   padding           → fixed MAX_LEN rows
//       │
//       ▼
//   splitter          → stratified 60/40 train/validation
//       │
//       ▼
//   SequenceDataset   → Burn Dataset
//       │
//       ▼
//   SequenceBatcher   → Burn Batcher, feeds the training loop

/// Synthetic record sampling
pub mod generator;

/// Sequential HTTP collection of labelled records
pub mod collector;

/// Collected records and their CSV audit log
pub mod corpus;

/// Right-padding / truncation to MAX_LEN
pub mod padding;

/// Stratified train/validation split
pub mod splitter;

/// Implements Burn's Dataset trait for padded rows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
