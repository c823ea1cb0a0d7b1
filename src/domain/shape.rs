// ============================================================
// Layer 3 — Shared Shape Constants
// ============================================================
// The padding width used by the data preparer must equal the
// input width of the model, and every code fed to the embedding
// must be below VOCAB_SIZE. Both sides read these constants.

/// Fixed width of every padded encoding row.
pub const MAX_LEN: usize = 34;

/// Number of distinct symbols the embedding can look up (ASCII).
pub const VOCAB_SIZE: usize = 128;

/// Width of each embedded symbol vector.
pub const EMBEDDING_DIM: usize = 16;

/// Width of the hidden dense layer.
pub const HIDDEN_UNITS: usize = 8;

/// Sentinel written into padded positions.
pub const PAD_CODE: u32 = 0;

/// One padded encoding.
pub type PaddedRow = [u32; MAX_LEN];
