//! Record ingestion: CSV batches and manual entries

use crate::config::DEFAULT_MAX_RECORDS;
use crate::error::{PipelineError, Result};
use crate::types::transaction::{Transaction, FEATURE_COUNT};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A named delimited-text payload submitted for bulk scoring
#[derive(Debug, Clone)]
pub struct BulkSource {
    /// File name as supplied by the uploader
    pub name: String,
    /// UTF-8 CSV contents including the header row
    pub contents: String,
}

impl BulkSource {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// A single manually entered transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualEntry {
    pub time: f64,
    pub amount: f64,
    #[serde(default)]
    pub v1: Option<f64>,
    #[serde(default)]
    pub v2: Option<f64>,
    #[serde(default)]
    pub v3: Option<f64>,
    #[serde(default)]
    pub v4: Option<f64>,
    #[serde(default)]
    pub v5: Option<f64>,
}

impl ManualEntry {
    /// Entry with only the required fields
    pub fn new(time: f64, amount: f64) -> Self {
        Self {
            time,
            amount,
            v1: None,
            v2: None,
            v3: None,
            v4: None,
            v5: None,
        }
    }

    /// Decode an entry from a JSON object, rejecting unknown fields
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PipelineError::format(format!("invalid manual entry: {}", e)))
    }

    fn features(&self) -> Vec<Option<f64>> {
        vec![self.v1, self.v2, self.v3, self.v4, self.v5]
    }
}

/// Transactions parsed from one source, with ground truth when supplied
#[derive(Debug, Clone, Default)]
pub struct LabeledBatch {
    pub transactions: Vec<Transaction>,
    /// `Some` when the source carried a `class` column
    pub labels: Option<Vec<bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Time,
    Amount,
    /// 0-based feature index (`v1` is 0)
    Feature(usize),
    Class,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let name = header.trim().trim_matches('"').to_ascii_lowercase();
        match name.as_str() {
            "time" => Some(Column::Time),
            "amount" => Some(Column::Amount),
            "class" => Some(Column::Class),
            _ => name
                .strip_prefix('v')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=FEATURE_COUNT).contains(n))
                .map(|n| Column::Feature(n - 1)),
        }
    }
}

/// Header layout of a bulk source
struct ColumnLayout {
    columns: Vec<Column>,
    feature_width: usize,
    has_class: bool,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut columns = Vec::with_capacity(headers.len());

        for header in headers.iter() {
            let column = Column::from_header(header)
                .ok_or_else(|| PipelineError::format(format!("unknown column '{}'", header.trim())))?;
            if columns.contains(&column) {
                return Err(PipelineError::format(format!(
                    "duplicate column '{}'",
                    header.trim()
                )));
            }
            columns.push(column);
        }

        for (required, name) in [(Column::Time, "time"), (Column::Amount, "amount")] {
            if !columns.contains(&required) {
                return Err(PipelineError::format(format!(
                    "missing required column '{}'",
                    name
                )));
            }
        }

        let feature_width = columns
            .iter()
            .filter_map(|c| match c {
                Column::Feature(i) => Some(i + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let has_class = columns.contains(&Column::Class);

        Ok(Self {
            columns,
            feature_width,
            has_class,
        })
    }

    fn parse_row(&self, record: &StringRecord, line: u64) -> Result<(Transaction, Option<bool>)> {
        let mut time = None;
        let mut amount = None;
        let mut features = vec![None; self.feature_width];
        let mut label = None;

        for (column, cell) in self.columns.iter().zip(record.iter()) {
            match column {
                Column::Time => time = Some(parse_number(cell, "time", line)?),
                Column::Amount => amount = Some(parse_number(cell, "amount", line)?),
                Column::Feature(i) => {
                    if !cell.is_empty() {
                        features[*i] = Some(parse_number(cell, &format!("v{}", i + 1), line)?);
                    }
                }
                Column::Class => {
                    label = Some(match cell {
                        "0" => false,
                        "1" => true,
                        other => {
                            return Err(PipelineError::format(format!(
                                "line {}: class must be 0 or 1, got '{}'",
                                line, other
                            )))
                        }
                    })
                }
            }
        }

        // Both are present: the layout guarantees the columns and the reader
        // guarantees equal row lengths.
        let (time, amount) = match (time, amount) {
            (Some(t), Some(a)) => (t, a),
            _ => {
                return Err(PipelineError::format(format!(
                    "line {}: missing time or amount",
                    line
                )))
            }
        };

        let transaction = Transaction::with_features(time, amount, features)
            .map_err(|e| PipelineError::format(format!("line {}: {}", line, e)))?;

        Ok((transaction, label))
    }
}

fn parse_number(cell: &str, column: &str, line: u64) -> Result<f64> {
    if cell.is_empty() {
        return Err(PipelineError::format(format!(
            "line {}: '{}' is empty",
            line, column
        )));
    }
    cell.parse::<f64>().map_err(|_| {
        PipelineError::format(format!(
            "line {}: '{}' is not a number: '{}'",
            line, column, cell
        ))
    })
}

/// Parses bulk sources and manual entries into transactions
#[derive(Debug, Clone)]
pub struct IngestionAdapter {
    max_records: usize,
}

impl IngestionAdapter {
    /// Create an adapter accepting at most `max_records` data rows per source
    pub fn new(max_records: usize) -> Self {
        Self { max_records }
    }

    /// Parse a CSV source with a header row.
    ///
    /// Required columns are `time` and `amount`; `v1..v28` and `class` are
    /// optional. Rows beyond the record cap fail the whole source.
    pub fn parse_bulk(&self, source: &BulkSource) -> Result<LabeledBatch> {
        if !source.name.to_ascii_lowercase().ends_with(".csv") {
            return Err(PipelineError::format(format!(
                "'{}' is not a CSV file",
                source.name
            )));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(source.contents.as_bytes());

        let layout = ColumnLayout::from_headers(reader.headers()?)?;
        let mut transactions = Vec::new();
        let mut labels = layout.has_class.then(Vec::new);

        for (index, result) in reader.records().enumerate() {
            if index >= self.max_records {
                return Err(PipelineError::CapacityExceeded {
                    limit: self.max_records,
                });
            }

            let record = result?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2);
            let (transaction, label) = layout.parse_row(&record, line)?;

            transactions.push(transaction);
            if let (Some(labels), Some(label)) = (labels.as_mut(), label) {
                labels.push(label);
            }
        }

        if transactions.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        info!(
            source = %source.name,
            rows = transactions.len(),
            labeled = labels.is_some(),
            features = layout.feature_width,
            "Bulk source parsed"
        );

        Ok(LabeledBatch {
            transactions,
            labels,
        })
    }

    /// Parse a manual entry; absent features stay absent
    pub fn parse_single(&self, entry: &ManualEntry) -> Result<Transaction> {
        let transaction = Transaction::with_features(entry.time, entry.amount, entry.features())?;
        debug!(
            time = entry.time,
            amount = entry.amount,
            "Manual entry parsed"
        );
        Ok(transaction)
    }
}

impl Default for IngestionAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(name: &str, contents: &str) -> BulkSource {
        BulkSource::new(name, contents)
    }

    #[test]
    fn test_parse_labeled_batch() {
        let adapter = IngestionAdapter::default();
        let source = csv(
            "creditcard.csv",
            "\"Time\",\"V1\",\"V2\",\"Amount\",\"Class\"\n\
             0,-1.35,-0.07,149.62,\"0\"\n\
             406,-2.31,1.95,0,\"1\"\n",
        );

        let batch = adapter.parse_bulk(&source).unwrap();

        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.labels, Some(vec![false, true]));
        assert_eq!(batch.transactions[0].amount(), 149.62);
        assert_eq!(batch.transactions[1].time(), 406.0);
        assert_eq!(batch.transactions[1].feature(2), Some(1.95));
    }

    #[test]
    fn test_unlabeled_batch_with_absent_features() {
        let adapter = IngestionAdapter::default();
        let source = csv("upload.CSV", "time,amount,v3\n10,5.5,\n20,7.25,0.3\n");

        let batch = adapter.parse_bulk(&source).unwrap();

        assert!(batch.labels.is_none());
        assert_eq!(batch.transactions[0].feature(3), None);
        assert_eq!(batch.transactions[1].feature(3), Some(0.3));
        assert_eq!(batch.transactions[1].feature(1), None);
    }

    #[test]
    fn test_missing_required_column() {
        let adapter = IngestionAdapter::default();
        let err = adapter
            .parse_bulk(&csv("a.csv", "time,v1\n1,2\n"))
            .unwrap_err();

        assert_eq!(err, PipelineError::Format("missing required column 'amount'".into()));
    }

    #[test]
    fn test_unknown_and_duplicate_columns() {
        let adapter = IngestionAdapter::default();

        assert!(matches!(
            adapter.parse_bulk(&csv("a.csv", "time,amount,merchant\n1,2,x\n")),
            Err(PipelineError::Format(_))
        ));
        assert!(matches!(
            adapter.parse_bulk(&csv("a.csv", "time,amount,v29\n1,2,3\n")),
            Err(PipelineError::Format(_))
        ));
        assert!(matches!(
            adapter.parse_bulk(&csv("a.csv", "time,amount,Amount\n1,2,3\n")),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_unparsable_cells() {
        let adapter = IngestionAdapter::default();

        let err = adapter
            .parse_bulk(&csv("a.csv", "time,amount\n1,2\n3,abc\n"))
            .unwrap_err();
        match err {
            PipelineError::Format(msg) => {
                assert!(msg.contains("line 3"), "{}", msg);
                assert!(msg.contains("amount"), "{}", msg);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(adapter
            .parse_bulk(&csv("a.csv", "time,amount,class\n1,2,yes\n"))
            .is_err());
        assert!(adapter
            .parse_bulk(&csv("a.csv", "time,amount\n1,-2\n"))
            .is_err());
        assert!(adapter
            .parse_bulk(&csv("a.csv", "time,amount\n,2\n"))
            .is_err());
        assert!(adapter
            .parse_bulk(&csv("a.csv", "time,amount\n1,2,3\n"))
            .is_err());
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let adapter = IngestionAdapter::default();
        let err = adapter
            .parse_bulk(&csv("a.csv", "time,amount,class\n"))
            .unwrap_err();

        assert_eq!(err, PipelineError::EmptyInput);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let adapter = IngestionAdapter::default();
        let batch = adapter
            .parse_bulk(&csv("a.csv", "time,amount\n\n1,2\n\n3,4\n"))
            .unwrap();

        assert_eq!(batch.transactions.len(), 2);
    }

    #[test]
    fn test_capacity_exceeded() {
        let adapter = IngestionAdapter::new(3);
        let ok = csv("a.csv", "time,amount\n1,1\n2,2\n3,3\n");
        let too_many = csv("a.csv", "time,amount\n1,1\n2,2\n3,3\n4,4\n");

        assert_eq!(adapter.parse_bulk(&ok).unwrap().transactions.len(), 3);
        assert_eq!(
            adapter.parse_bulk(&too_many).unwrap_err(),
            PipelineError::CapacityExceeded { limit: 3 }
        );
    }

    #[test]
    fn test_non_csv_name_rejected() {
        let adapter = IngestionAdapter::default();
        assert!(matches!(
            adapter.parse_bulk(&csv("report.xlsx", "time,amount\n1,2\n")),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_parse_single_entry() {
        let adapter = IngestionAdapter::default();
        let mut entry = ManualEntry::new(3600.0, 1500.0);
        entry.v2 = Some(-0.5);

        let tx = adapter.parse_single(&entry).unwrap();

        assert_eq!(tx.time(), 3600.0);
        assert_eq!(tx.amount(), 1500.0);
        assert_eq!(tx.feature(1), None);
        assert_eq!(tx.feature(2), Some(-0.5));
        assert_eq!(tx.present_features().count(), 1);
    }

    #[test]
    fn test_manual_entry_json() {
        let entry = ManualEntry::from_json(r#"{"time": 10, "amount": 99.5, "v1": 0.2}"#).unwrap();
        assert_eq!(entry.v1, Some(0.2));
        assert_eq!(entry.v5, None);

        assert!(matches!(
            ManualEntry::from_json(r#"{"time": 10, "amount": 1, "v6": 0.2}"#),
            Err(PipelineError::Format(_))
        ));
        assert!(matches!(
            ManualEntry::from_json(r#"{"amount": 1}"#),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_manual_entry_rejects_negative_values() {
        let adapter = IngestionAdapter::default();
        assert!(adapter.parse_single(&ManualEntry::new(-1.0, 10.0)).is_err());
        assert!(adapter.parse_single(&ManualEntry::new(1.0, -10.0)).is_err());
    }
}
