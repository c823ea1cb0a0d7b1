// ============================================================
// Layer 4 — Sequence Padding
// ============================================================
// Turns variable-length encodings into a rectangular matrix
// with MAX_LEN columns.
//
//   len < MAX_LEN  → copy, then fill the tail with PAD_CODE
//   len = MAX_LEN  → copy
//   len > MAX_LEN  → keep the first MAX_LEN codes
//
// Example (MAX_LEN = 6 for readability):
//   [112, 117, 103]             → [112, 117, 103, 0, 0, 0]
//   [1, 2, 3, 4, 5, 6, 7, 8]    → [1, 2, 3, 4, 5, 6]

use crate::domain::shape::{PaddedRow, MAX_LEN, PAD_CODE};

/// Pad or truncate one encoding to exactly MAX_LEN codes.
pub fn pad_encoding(encoding: &[u32]) -> PaddedRow {
    let mut row = [PAD_CODE; MAX_LEN];
    let n = encoding.len().min(MAX_LEN);
    row[..n].copy_from_slice(&encoding[..n]);
    row
}

/// Row-major matrix of padded encodings. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedMatrix {
    rows: Vec<PaddedRow>,
}

impl PaddedMatrix {
    pub fn from_encodings(encodings: &[Vec<u32>]) -> Self {
        let rows: Vec<PaddedRow> = encodings.iter().map(|e| pad_encoding(e)).collect();
        let truncated = encodings.iter().filter(|e| e.len() > MAX_LEN).count();
        if truncated > 0 {
            tracing::debug!("Truncated {} encodings to {} codes", truncated, MAX_LEN);
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[PaddedRow] {
        &self.rows
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_encoding_is_right_padded() {
        for len in [0usize, 1, 4, 20, MAX_LEN - 1, MAX_LEN] {
            let enc: Vec<u32> = (1..=len as u32).collect();
            let row = pad_encoding(&enc);
            assert_eq!(&row[..len], enc.as_slice());
            assert!(row[len..].iter().all(|&c| c == PAD_CODE));
        }
    }

    #[test]
    fn test_long_encoding_is_truncated_from_the_right() {
        let enc: Vec<u32> = (100..100 + MAX_LEN as u32 + 9).collect();
        let row = pad_encoding(&enc);
        assert_eq!(row.as_slice(), &enc[..MAX_LEN]);
    }

    #[test]
    fn test_matrix_is_rectangular() {
        let encodings = vec![vec![65; 3], vec![66; 34], vec![67; 50]];
        let m = PaddedMatrix::from_encodings(&encodings);
        assert_eq!(m.len(), 3);
        assert!(m.rows().iter().all(|r| r.len() == MAX_LEN));
        assert_eq!(m.rows()[0][3], PAD_CODE);
        assert_eq!(m.rows()[2][MAX_LEN - 1], 67);
    }
}
