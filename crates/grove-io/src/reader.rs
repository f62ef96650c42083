//! CSV sample reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{LabelEncoding, SampleTable};

/// Reads labeled samples (and unlabeled queries) from a CSV file.
///
/// Expected CSV format:
/// - Optional header row (`feature1,...,featureN,label`)
/// - One sample per row: numeric feature columns, then the label column
/// - All rows must have the same number of columns
///
/// Labels may be numeric or text. If any label is not a finite number, all
/// labels are treated as names and numbered in first-seen order; the
/// mapping is kept in the returned [`SampleTable`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::TooFewColumns`] | Fewer than two columns |
/// | [`IoError::InconsistentRowLength`] | Row has a different column count |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`IoError::EmptyLabel`] | Label cell is blank |
pub struct SampleReader {
    path: PathBuf,
    has_headers: bool,
}

impl SampleReader {
    /// Create a new reader for the given CSV file path. Assumes no header row.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            has_headers: false,
        }
    }

    /// Treat the first row as a header.
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Read and validate labeled samples.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<SampleTable, IoError> {
        let mut rdr = self.open()?;

        let header: Option<Vec<String>> = if self.has_headers {
            let header = rdr.headers().map_err(|e| self.csv_error(e))?;
            Some(header.iter().map(String::from).collect())
        } else {
            None
        };
        let mut expected_cols = header.as_ref().map(Vec::len);

        let mut features: Vec<Vec<f64>> = Vec::new();
        let mut raw_labels: Vec<String> = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            let expected = *expected_cols.get_or_insert(record.len());
            if expected < 2 {
                return Err(IoError::TooFewColumns {
                    path: self.path.clone(),
                    columns: expected,
                });
            }
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }

            features.push(self.parse_features(&record, expected - 1, row_index)?);

            let label = record.get(expected - 1).unwrap_or("");
            if label.is_empty() {
                return Err(IoError::EmptyLabel {
                    path: self.path.clone(),
                    row_index,
                });
            }
            raw_labels.push(label.to_string());
        }

        if features.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let (labels, encoding) = encode_labels(&raw_labels);
        if let Some(n_named) = encoding.n_named() {
            debug!(n_named, "text labels encoded in first-seen order");
        }

        let rows: Vec<Vec<f64>> = features
            .into_iter()
            .zip(labels)
            .map(|(mut row, label)| {
                row.push(label);
                row
            })
            .collect();

        let feature_names = header.map(|mut names| {
            names.pop();
            names
        });

        let table = SampleTable::new(feature_names, rows, encoding);
        info!(
            n_samples = table.n_samples(),
            n_features = table.n_features(),
            "sample table loaded"
        );
        Ok(table)
    }

    /// Read query rows holding `n_features` numeric values each.
    ///
    /// A row may carry one extra trailing column (a label, numeric or not),
    /// which is dropped.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_queries(&self, n_features: usize) -> Result<Vec<Vec<f64>>, IoError> {
        let mut rdr = self.open()?;
        if self.has_headers {
            rdr.headers().map_err(|e| self.csv_error(e))?;
        }

        let mut queries = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != n_features && record.len() != n_features + 1 {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: n_features,
                    got: record.len(),
                });
            }
            queries.push(self.parse_features(&record, n_features, row_index)?);
        }

        if queries.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        info!(n_queries = queries.len(), "queries loaded");
        Ok(queries)
    }

    fn open(&self) -> Result<csv::Reader<std::fs::File>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        Ok(csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    /// Parse the first `n` cells of `record` as finite floats.
    fn parse_features(
        &self,
        record: &csv::StringRecord,
        n: usize,
        row_index: usize,
    ) -> Result<Vec<f64>, IoError> {
        record
            .iter()
            .take(n)
            .enumerate()
            .map(|(col_index, raw)| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })
            })
            .collect()
    }
}

/// Turn raw label cells into numbers.
///
/// All-numeric labels are kept as parsed; otherwise every distinct string
/// is numbered in first-seen order.
fn encode_labels(raw: &[String]) -> (Vec<f64>, LabelEncoding) {
    let numeric: Option<Vec<f64>> = raw
        .iter()
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();
    if let Some(values) = numeric {
        return (values, LabelEncoding::Numeric);
    }

    let mut names: Vec<String> = Vec::new();
    let values = raw
        .iter()
        .map(|s| match names.iter().position(|n| n == s) {
            Some(i) => i as f64,
            None => {
                names.push(s.clone());
                (names.len() - 1) as f64
            }
        })
        .collect();
    (values, LabelEncoding::Named(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_numeric_samples_without_header() {
        let f = write_csv("0,0,0\n0,1,0\n1,0,0\n1,1,1\n");
        let table = SampleReader::new(f.path()).read().unwrap();
        assert_eq!(table.n_samples(), 4);
        assert_eq!(table.n_features(), 2);
        assert_eq!(table.rows()[3], vec![1.0, 1.0, 1.0]);
        assert_eq!(table.label_encoding(), &LabelEncoding::Numeric);
        assert!(table.feature_names().is_none());
    }

    #[test]
    fn read_header_and_text_labels() {
        let csv = "length,width,species\n5.1,3.5,setosa\n6.3,3.3,virginica\n4.9,3.0,setosa\n";
        let f = write_csv(csv);
        let table = SampleReader::new(f.path()).with_headers(true).read().unwrap();
        assert_eq!(table.feature_names().unwrap(), &["length", "width"]);
        let labels: Vec<f64> = table.rows().iter().map(|r| r[2]).collect();
        assert_eq!(labels, vec![0.0, 1.0, 0.0]);
        assert_eq!(
            table.label_encoding(),
            &LabelEncoding::Named(vec!["setosa".into(), "virginica".into()])
        );
    }

    #[test]
    fn mixed_labels_are_all_named() {
        let f = write_csv("1.0,7\n2.0,x\n3.0,7\n");
        let table = SampleReader::new(f.path()).read().unwrap();
        assert_eq!(
            table.label_encoding(),
            &LabelEncoding::Named(vec!["7".into(), "x".into()])
        );
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("a,b,label\n");
        let err = SampleReader::new(f.path()).with_headers(true).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn too_few_columns_error() {
        let f = write_csv("1\n2\n");
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::TooFewColumns { columns: 1, .. }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("1.0,2.0,0\n1.0,1\n");
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength {
                row_index: 1,
                expected: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn non_finite_feature_error() {
        let f = write_csv("1.0,NaN,0\n");
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { col_index: 1, .. }));
    }

    #[test]
    fn unparseable_feature_error() {
        let f = write_csv("abc,0\n");
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { .. }));
    }

    #[test]
    fn empty_label_error() {
        let f = write_csv("1.0,0\n2.0,\n");
        let err = SampleReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyLabel { row_index: 1, .. }));
    }

    #[test]
    fn missing_file_error() {
        let err = SampleReader::new(Path::new("/nonexistent/samples.csv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn queries_drop_trailing_label() {
        let f = write_csv("1.0,2.0\n3.0,4.0,setosa\n");
        let queries = SampleReader::new(f.path()).read_queries(2).unwrap();
        assert_eq!(queries, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let err = SampleReader::new(f.path()).read_queries(3).unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 0, .. }));
    }
}
