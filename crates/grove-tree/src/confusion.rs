//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::error::GroveError;

/// A confusion matrix for multi-class classification.
///
/// Classes are the distinct label values seen in the actual labels, then in
/// the predictions, in first-seen order. Entry `matrix[a][p]` counts the
/// samples whose actual label is `labels[a]` and whose predicted label is
/// `labels[p]`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<f64>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// The class label.
    pub label: f64,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from actual and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`GroveError::LengthMismatch`] | The slices differ in length |
    /// | [`GroveError::EmptyDataset`] | Zero labels provided |
    pub fn from_labels(actual: &[f64], predicted: &[f64]) -> Result<Self, GroveError> {
        if actual.len() != predicted.len() {
            return Err(GroveError::LengthMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }
        if actual.is_empty() {
            return Err(GroveError::EmptyDataset);
        }

        let mut labels: Vec<f64> = Vec::new();
        for &label in actual.iter().chain(predicted) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        let position = |label: f64| labels.iter().position(|&l| l == label).unwrap_or(0);

        let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
        for (&a, &p) in actual.iter().zip(predicted) {
            matrix[position(a)][position(p)] += 1;
        }
        Ok(Self { labels, matrix })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        let total: usize = self.matrix.iter().flat_map(|row| row.iter()).sum();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.n_classes();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fp: usize = (0..n).filter(|&i| i != c).map(|i| self.matrix[i][c]).sum();
                let fn_: usize = (0..n).filter(|&j| j != c).map(|j| self.matrix[c][j]).sum();
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    label: self.labels[c],
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the class labels indexing rows and columns.
    #[must_use]
    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Add the counts of `other` into `self`, aligning classes by label.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        for &label in &other.labels {
            if !self.labels.contains(&label) {
                self.labels.push(label);
                for row in &mut self.matrix {
                    row.push(0);
                }
                self.matrix.push(vec![0; self.labels.len()]);
            }
        }
        let position = |label: f64| self.labels.iter().position(|&l| l == label).unwrap_or(0);
        let mapping: Vec<usize> = other.labels.iter().map(|&l| position(l)).collect();
        for (a, row) in other.matrix.iter().enumerate() {
            for (p, &count) in row.iter().enumerate() {
                self.matrix[mapping[a]][mapping[p]] += count;
            }
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for label in &self.labels {
            write!(f, " pred_{label:<5}")?;
        }
        writeln!(f)?;

        for (label, row) in self.labels.iter().zip(&self.matrix) {
            write!(f, "true_{label:<5}")?;
            for val in row {
                write!(f, " {val:>10}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
