//! Domain types for grove-io.

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the label column of a sample file maps onto numeric labels.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelEncoding {
    /// Every label parsed as a finite number and is used as-is.
    Numeric,
    /// Labels are text; `names[i]` is stored as the numeric label `i`.
    ///
    /// Names are numbered in the order they first appear in the file.
    Named(Vec<String>),
}

impl LabelEncoding {
    /// Render a numeric label the way it appeared in the file.
    ///
    /// Values with no matching name are rendered as numbers.
    #[must_use]
    pub fn decode(&self, value: f64) -> String {
        match self {
            LabelEncoding::Numeric => value.to_string(),
            LabelEncoding::Named(names) => {
                let index = value as usize;
                if value >= 0.0 && value.fract() == 0.0 && index < names.len() {
                    names[index].clone()
                } else {
                    value.to_string()
                }
            }
        }
    }

    /// Return the number of named labels, or `None` for numeric labels.
    #[must_use]
    pub fn n_named(&self) -> Option<usize> {
        match self {
            LabelEncoding::Numeric => None,
            LabelEncoding::Named(names) => Some(names.len()),
        }
    }
}

/// Labeled samples loaded from a CSV file.
///
/// Produced by [`SampleReader`](crate::SampleReader). Each row holds the
/// feature values followed by the (encoded) label, ready to become a
/// training set.
#[derive(Debug)]
pub struct SampleTable {
    /// Feature column names from the header, or `None` without a header.
    feature_names: Option<Vec<String>>,
    /// `rows[sample_index]` = features, then the label.
    rows: Vec<Vec<f64>>,
    /// How the label column was interpreted.
    labels: LabelEncoding,
}

impl SampleTable {
    pub(crate) fn new(
        feature_names: Option<Vec<String>>,
        rows: Vec<Vec<f64>>,
        labels: LabelEncoding,
    ) -> Self {
        Self {
            feature_names,
            rows,
            labels,
        }
    }

    /// Return the feature column names, if the file had a header.
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Return the samples, label last.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Consume the table and return its samples.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    /// Return the label encoding.
    #[must_use]
    pub fn label_encoding(&self) -> &LabelEncoding {
        &self.labels
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len() - 1)
    }
}
