//! Prediction methods for the fitted forest.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::GroveError;
use crate::forest::Forest;
use crate::model::Predict;
use crate::processor::{EnsembleProcessor, SequentialProcessor};
use crate::schedule::Scheduler;
use crate::tree::ClassificationTree;
use crate::vote;

impl Forest {
    /// Return every tree's prediction for `query`, in draw order.
    ///
    /// # Errors
    ///
    /// Propagates the processor's error; see [`EnsembleProcessor::predictions`].
    pub fn votes(
        &self,
        query: &[f64],
        processor: &impl EnsembleProcessor,
    ) -> Result<Vec<f64>, GroveError> {
        processor.predictions(&self.trees, query)
    }

    /// Classify `query` by majority vote of the trees.
    ///
    /// Tied votes go to the label voted for by the lowest-indexed tree.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`GroveError::EmptyQuery`] | `query` is empty |
    /// | [`GroveError::ModelFailed`] | a tree rejected the query (wrong arity) |
    pub fn predict(&self, query: &[f64]) -> Result<f64, GroveError> {
        let votes = self.votes(query, &SequentialProcessor)?;
        vote::majority(&votes).ok_or(GroveError::InvalidEnsembleSize { ensemble_size: 0 })
    }

    /// Classify a batch of queries in parallel on `scheduler`.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`Forest::predict`] in query order.
    pub fn predict_batch(
        &self,
        queries: &[Vec<f64>],
        scheduler: &Scheduler,
    ) -> Result<Vec<f64>, GroveError> {
        scheduler.install(|| {
            queries
                .par_iter()
                .map(|query| self.predict(query))
                .collect()
        })
    }

    /// Return the trees in draw order.
    #[must_use]
    pub fn trees(&self) -> &[ClassificationTree] {
        &self.trees
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Predict for Forest {
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
        Forest::predict(self, input)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ForestConfig;
    use crate::dataset::DataSet;
    use crate::error::GroveError;
    use crate::processor::{ParallelProcessor, SequentialProcessor};
    use crate::schedule::Scheduler;

    fn make_data() -> DataSet {
        let rows = (0..40)
            .map(|i| {
                let x = i as f64;
                vec![x, (i % 3) as f64, if x < 20.0 { 0.0 } else { 1.0 }]
            })
            .collect();
        DataSet::new(rows).unwrap()
    }

    #[test]
    fn votes_have_one_entry_per_tree() {
        let data = make_data();
        let scheduler = Scheduler::new(2).unwrap();
        let forest = ForestConfig::bagging(9).unwrap().fit(&data, &scheduler).unwrap();

        let seq = forest.votes(&[3.0, 0.0], &SequentialProcessor).unwrap();
        let par = forest
            .votes(&[3.0, 0.0], &ParallelProcessor::new(scheduler))
            .unwrap();
        assert_eq!(seq.len(), 9);
        assert_eq!(seq, par);
    }

    #[test]
    fn batch_matches_individual() {
        let data = make_data();
        let scheduler = Scheduler::new(3).unwrap();
        let forest = ForestConfig::random_forest(11, 1)
            .unwrap()
            .fit(&data, &scheduler)
            .unwrap();

        let batch = forest.predict_batch(data.rows(), &scheduler).unwrap();
        for (row, &label) in data.rows().iter().zip(&batch) {
            assert_eq!(forest.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn wrong_arity_reports_first_tree() {
        let data = make_data();
        let forest = ForestConfig::bagging(4)
            .unwrap()
            .fit(&data, &Scheduler::new(1).unwrap())
            .unwrap();
        let err = forest.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, GroveError::ModelFailed { index: 0, .. }));
        assert!(matches!(forest.predict(&[]), Err(GroveError::EmptyQuery)));
    }
}
