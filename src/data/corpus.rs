// ============================================================
// Layer 4 — Training Corpus
// ============================================================
// The ordered records collected for one run. Written once as a
// CSV audit log, then split into parallel encoding/label vectors.
//
// Output format:
//   CONTENT,VALUE,FLAG
//   112|117|103,pug,1
//   65|98|49|120,Ab1x,0

use std::path::Path;

use crate::domain::{error::PipelineResult, record::Record};

pub const CSV_HEADER: [&str; 3] = ["CONTENT", "VALUE", "FLAG"];

/// Parallel containers handed to the data preparer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub encodings: Vec<Vec<u32>>,
    pub labels: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct TrainingCorpus {
    records: Vec<Record>,
}

impl TrainingCorpus {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.flag).count()
    }

    /// Write the audit CSV to `path`, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> PipelineResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        for r in &self.records {
            let content = r
                .content
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("|");
            let flag = if r.flag { "1" } else { "0" };
            writer.write_record([content.as_str(), r.value.as_str(), flag])?;
        }
        writer.flush()?;
        tracing::debug!("Wrote {} records to '{}'", self.records.len(), path.display());
        Ok(())
    }

    /// Consume the corpus, keeping collection order.
    pub fn into_collected(self) -> Collected {
        let (encodings, labels): (Vec<Vec<u32>>, Vec<u8>) = self
            .records
            .into_iter()
            .map(|r| {
                let label = r.label();
                (r.content, label)
            })
            .unzip();
        Collected { encodings, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> TrainingCorpus {
        let mut c = TrainingCorpus::with_capacity(2);
        c.push(Record::from_value("pug", true));
        c.push(Record::from_value("Ab1x", false));
        c
    }

    #[test]
    fn test_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_data.csv");
        corpus().write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["CONTENT,VALUE,FLAG", "112|117|103,pug,1", "65|98|49|120,Ab1x,0"]);
    }

    #[test]
    fn test_value_with_comma_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.csv");
        let mut c = TrainingCorpus::default();
        c.push(Record::from_value("a,b", true));
        c.write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "a,b");
        assert_eq!(&row[0], "97|44|98");
    }

    #[test]
    fn test_into_collected_keeps_order() {
        let c = corpus();
        assert_eq!(c.positives(), 1);
        let collected = c.into_collected();
        assert_eq!(collected.labels, vec![1, 0]);
        assert_eq!(collected.encodings[0], vec![112, 117, 103]);
        assert_eq!(collected.encodings[1].len(), 4);
    }
}
