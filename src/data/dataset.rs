use burn::data::dataset::Dataset;

use crate::data::splitter::LabeledRows;
use crate::domain::shape::PaddedRow;

/// One padded encoding with its 0/1 label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceItem {
    pub tokens: PaddedRow,
    pub label: u8,
}

pub struct SequenceDataset {
    items: Vec<SequenceItem>,
}

impl SequenceDataset {
    pub fn new(items: Vec<SequenceItem>) -> Self {
        Self { items }
    }
}

impl From<LabeledRows> for SequenceDataset {
    fn from(subset: LabeledRows) -> Self {
        let items = subset
            .rows
            .into_iter()
            .zip(subset.labels)
            .map(|(tokens, label)| SequenceItem { tokens, label })
            .collect();
        Self { items }
    }
}

impl Dataset<SequenceItem> for SequenceDataset {
    fn get(&self, index: usize) -> Option<SequenceItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shape::MAX_LEN;

    #[test]
    fn test_from_labeled_rows_keeps_alignment() {
        let mut a = [0u32; MAX_LEN];
        a[0] = 80;
        let subset = LabeledRows {
            rows: vec![a, [0; MAX_LEN]],
            labels: vec![1, 0],
        };
        let ds = SequenceDataset::from(subset);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0).unwrap().tokens[0], 80);
        assert_eq!(ds.get(0).unwrap().label, 1);
        assert_eq!(ds.get(1).unwrap().label, 0);
        assert!(ds.get(2).is_none());
    }
}
