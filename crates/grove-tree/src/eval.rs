//! Stratified k-fold cross-validation of a forest configuration.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::confusion::ConfusionMatrix;
use crate::dataset::DataSet;
use crate::error::GroveError;
use crate::schedule::Scheduler;

/// Fraction of `predicted` labels equal to the `actual` label at the same index.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`GroveError::LengthMismatch`] | The slices differ in length |
/// | [`GroveError::EmptyDataset`] | Both slices are empty |
pub fn accuracy(predicted: &[f64], actual: &[f64]) -> Result<f64, GroveError> {
    if predicted.len() != actual.len() {
        return Err(GroveError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }
    if actual.is_empty() {
        return Err(GroveError::EmptyDataset);
    }
    let correct = predicted.iter().zip(actual).filter(|&(p, a)| p == a).count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
}

/// Results of stratified k-fold cross-validation.
#[derive(Debug)]
pub struct CrossValidationResult {
    /// Accuracy for each fold.
    pub fold_accuracies: Vec<f64>,
    /// Aggregated confusion matrix (summed across all folds).
    pub confusion_matrix: ConfusionMatrix,
    /// Mean accuracy across folds.
    pub mean_accuracy: f64,
    /// Population standard deviation of fold accuracies.
    pub std_accuracy: f64,
    /// Number of folds.
    pub n_folds: usize,
    /// Total number of samples.
    pub n_samples: usize,
    /// Number of features.
    pub n_features: usize,
    /// Number of classes.
    pub n_classes: usize,
}

impl CrossValidation {
    /// Create a new cross-validation config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, GroveError> {
        if n_folds < 2 {
            return Err(GroveError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 42 })
    }

    /// Set the random seed for fold shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Run stratified k-fold cross-validation.
    ///
    /// Every fold holds roughly the same share of each class. Fold `k`
    /// trains a forest on the other folds, seeded with `config.seed() + k`,
    /// and classifies its own rows by majority vote.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`GroveError::TooFewSamplesForFolds`] | A class has fewer samples than folds |
    /// | Other errors | From forest training or prediction |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = data.len()))]
    pub fn evaluate(
        &self,
        config: &ForestConfig,
        data: &DataSet,
        scheduler: &Scheduler,
    ) -> Result<CrossValidationResult, GroveError> {
        let fold_assignments = self.stratified_split(data)?;

        let mut fold_accuracies = Vec::with_capacity(self.n_folds);
        let mut confusion_matrix: Option<ConfusionMatrix> = None;

        for fold in 0..self.n_folds {
            let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                (0..data.len()).partition(|&i| fold_assignments[i] == fold);

            let train = data.subset(&train_indices)?;
            let test = data.subset(&test_indices)?;

            let fold_config = config
                .clone()
                .with_seed(config.seed().wrapping_add(fold as u64));
            let forest = fold_config.fit(&train, scheduler)?;

            let predictions = forest.predict_batch(test.rows(), scheduler)?;
            let actual = test.labels();
            let fold_accuracy = accuracy(&predictions, &actual)?;
            fold_accuracies.push(fold_accuracy);

            debug!(
                fold,
                n_train = train.len(),
                n_test = test.len(),
                accuracy = fold_accuracy,
                "fold completed"
            );

            let fold_matrix = ConfusionMatrix::from_labels(&actual, &predictions)?;
            match confusion_matrix.as_mut() {
                Some(total) => total.merge(&fold_matrix),
                None => confusion_matrix = Some(fold_matrix),
            }
        }

        let n = self.n_folds as f64;
        let mean_accuracy = fold_accuracies.iter().sum::<f64>() / n;
        let std_accuracy = {
            let variance = fold_accuracies
                .iter()
                .map(|&a| (a - mean_accuracy).powi(2))
                .sum::<f64>()
                / n;
            variance.sqrt()
        };

        let confusion_matrix = confusion_matrix.ok_or(GroveError::EmptyDataset)?;
        info!(mean_accuracy, std_accuracy, "cross-validation complete");
        debug!("pooled confusion matrix:\n{confusion_matrix}");

        Ok(CrossValidationResult {
            fold_accuracies,
            confusion_matrix,
            mean_accuracy,
            std_accuracy,
            n_folds: self.n_folds,
            n_samples: data.len(),
            n_features: data.n_features(),
            n_classes: data.n_classes(),
        })
    }

    /// Assign every sample to a fold.
    ///
    /// Groups samples by class, shuffles within each class, then deals them
    /// round-robin across folds.
    fn stratified_split(&self, data: &DataSet) -> Result<Vec<usize>, GroveError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut class_indices: Vec<Vec<usize>> = vec![vec![]; data.n_classes()];
        for i in 0..data.len() {
            class_indices[data.class_id(i).index()].push(i);
        }

        for indices in &class_indices {
            if indices.len() < self.n_folds {
                return Err(GroveError::TooFewSamplesForFolds {
                    label: data.label(indices[0]),
                    count: indices.len(),
                    n_folds: self.n_folds,
                });
            }
        }

        let mut fold_assignments = vec![0usize; data.len()];
        for indices in &mut class_indices {
            indices.shuffle(&mut rng);
            for (j, &idx) in indices.iter().enumerate() {
                fold_assignments[idx] = j % self.n_folds;
            }
        }

        Ok(fold_assignments)
    }
}
