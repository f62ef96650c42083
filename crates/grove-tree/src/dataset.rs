//! Validated collections of labeled samples.

use crate::error::GroveError;

/// Dense class identifier, assigned to labels in first-seen row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(usize);

impl ClassId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based class position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An in-memory set of fixed-arity samples whose last component is the label.
///
/// Construction validates that the set is non-empty, that every sample has
/// the same arity (at least one feature plus the label) and that every
/// value is finite. Each distinct label receives a [`ClassId`] in the order
/// it first appears; that order is also the tie-break order for majority
/// votes.
#[derive(Debug, Clone)]
pub struct DataSet {
    rows: Vec<Vec<f64>>,
    n_features: usize,
    classes: Vec<f64>,
    class_ids: Vec<ClassId>,
}

impl DataSet {
    /// Validate `rows` and build a data set from them.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`GroveError::EmptyDataset`] | `rows` is empty |
    /// | [`GroveError::TooFewColumns`] | samples have fewer than 2 columns |
    /// | [`GroveError::InconsistentArity`] | a sample's length differs from the first |
    /// | [`GroveError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, GroveError> {
        let Some(first) = rows.first() else {
            return Err(GroveError::EmptyDataset);
        };
        let arity = first.len();
        if arity < 2 {
            return Err(GroveError::TooFewColumns { arity });
        }

        let mut classes: Vec<f64> = Vec::new();
        let mut class_ids = Vec::with_capacity(rows.len());

        for (sample_index, row) in rows.iter().enumerate() {
            if row.len() != arity {
                return Err(GroveError::InconsistentArity {
                    expected: arity,
                    got: row.len(),
                    sample_index,
                });
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(GroveError::NonFiniteValue {
                    sample_index,
                    column,
                });
            }

            let label = row[arity - 1];
            let id = match classes.iter().position(|&c| c == label) {
                Some(pos) => pos,
                None => {
                    classes.push(label);
                    classes.len() - 1
                }
            };
            class_ids.push(ClassId::new(id));
        }

        Ok(Self {
            rows,
            n_features: arity - 1,
            classes,
            class_ids,
        })
    }

    /// Build a new data set holding the rows at `indices` (duplicates allowed).
    ///
    /// Class ids are reassigned in the first-seen order of the new set.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::EmptyDataset`] if `indices` is empty.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, GroveError> {
        Self::new(indices.iter().map(|&i| self.rows[i].clone()).collect())
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if the set holds no samples. Never true for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return the number of feature columns (arity minus the label).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of distinct labels.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Return all samples, label last.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the sample at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Return the feature value of sample `index` at column `feature`.
    #[must_use]
    pub fn value(&self, index: usize, feature: usize) -> f64 {
        self.rows[index][feature]
    }

    /// Return the label of sample `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> f64 {
        self.rows[index][self.n_features]
    }

    /// Return the labels of all samples in row order.
    #[must_use]
    pub fn labels(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r[self.n_features]).collect()
    }

    /// Return the dense class id of sample `index`.
    #[must_use]
    pub fn class_id(&self, index: usize) -> ClassId {
        self.class_ids[index]
    }

    /// Return the label value behind a class id.
    #[must_use]
    pub fn class_label(&self, id: ClassId) -> f64 {
        self.classes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::DataSet;
    use crate::error::GroveError;

    #[test]
    fn classes_in_first_seen_order() {
        let data = DataSet::new(vec![
            vec![0.0, 7.0],
            vec![1.0, 3.0],
            vec![2.0, 7.0],
            vec![3.0, 5.0],
        ])
        .unwrap();
        assert_eq!(data.n_features(), 1);
        assert_eq!(data.n_classes(), 3);
        assert_eq!(data.class_id(0).index(), 0);
        assert_eq!(data.class_id(1).index(), 1);
        assert_eq!(data.class_id(2).index(), 0);
        assert_eq!(data.class_id(3).index(), 2);
        assert!((data.class_label(data.class_id(3)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_rejected() {
        let err = DataSet::new(vec![]).unwrap_err();
        assert!(matches!(err, GroveError::EmptyDataset));
    }

    #[test]
    fn label_only_rejected() {
        let err = DataSet::new(vec![vec![1.0], vec![0.0]]).unwrap_err();
        assert!(matches!(err, GroveError::TooFewColumns { arity: 1 }));
    }

    #[test]
    fn inconsistent_arity_rejected() {
        let err = DataSet::new(vec![vec![1.0, 0.0], vec![1.0, 2.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            GroveError::InconsistentArity {
                expected: 2,
                got: 3,
                sample_index: 1
            }
        ));
    }

    #[test]
    fn non_finite_rejected() {
        let err = DataSet::new(vec![vec![1.0, 0.0], vec![f64::INFINITY, 1.0]]).unwrap_err();
        assert!(matches!(
            err,
            GroveError::NonFiniteValue {
                sample_index: 1,
                column: 0
            }
        ));
    }

    #[test]
    fn subset_keeps_duplicates() {
        let data = DataSet::new(vec![vec![0.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let sub = data.subset(&[1, 1, 0]).unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.labels(), vec![2.0, 2.0, 1.0]);
        assert_eq!(sub.class_id(2).index(), 1);
    }
}
