//! Configuration builder for bagged tree ensembles.

use crate::cost::CostFunction;
use crate::dataset::DataSet;
use crate::error::GroveError;
use crate::forest::Forest;
use crate::schedule::Scheduler;
use crate::split::FeatureSampling;
use crate::tree::TreeConfig;

/// Configuration for bootstrap aggregation of classification trees.
///
/// Without `features_per_split` this is plain bagging: every tree scans all
/// features at every split. With `Some(k)` it is a random forest: every
/// split of every tree considers a fresh random subset of `k` features.
///
/// Construct via [`ForestConfig::new`], [`ForestConfig::bagging`] or
/// [`ForestConfig::random_forest`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default |
/// |----------------------|---------|
/// | `resample_ratio`     | 1.0     |
/// | `features_per_split` | `None`  |
/// | `max_depth`          | 10      |
/// | `min_size`           | 1       |
/// | `cost`               | `Gini`  |
/// | `seed`               | 42      |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) ensemble_size: usize,
    pub(crate) resample_ratio: f64,
    pub(crate) features_per_split: Option<usize>,
    pub(crate) max_depth: usize,
    pub(crate) min_size: usize,
    pub(crate) cost: CostFunction,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config training `ensemble_size` trees.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::InvalidEnsembleSize`] if `ensemble_size` is zero.
    pub fn new(ensemble_size: usize) -> Result<Self, GroveError> {
        if ensemble_size == 0 {
            return Err(GroveError::InvalidEnsembleSize { ensemble_size });
        }
        Ok(Self {
            ensemble_size,
            resample_ratio: 1.0,
            features_per_split: None,
            max_depth: 10,
            min_size: 1,
            cost: CostFunction::Gini,
            seed: 42,
        })
    }

    /// Plain bagging of `ensemble_size` full-scan trees.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::InvalidEnsembleSize`] if `ensemble_size` is zero.
    pub fn bagging(ensemble_size: usize) -> Result<Self, GroveError> {
        Self::new(ensemble_size)
    }

    /// A random forest of `ensemble_size` trees, each split restricted to
    /// `features_per_split` random candidate features.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::InvalidEnsembleSize`] if `ensemble_size` is zero.
    /// The candidate count is checked against the data at [`fit`](Self::fit) time.
    pub fn random_forest(
        ensemble_size: usize,
        features_per_split: usize,
    ) -> Result<Self, GroveError> {
        Ok(Self::new(ensemble_size)?.with_features_per_split(Some(features_per_split)))
    }

    // --- Setters ---

    /// Set the share of the data set drawn (with replacement) for each tree.
    #[must_use]
    pub fn with_resample_ratio(mut self, resample_ratio: f64) -> Self {
        self.resample_ratio = resample_ratio;
        self
    }

    /// Set the number of random candidate features per split. `None` scans all.
    #[must_use]
    pub fn with_features_per_split(mut self, features_per_split: Option<usize>) -> Self {
        self.features_per_split = features_per_split;
        self
    }

    /// Set the maximum depth of every tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the subset size at or below which a child becomes a leaf.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the split cost function.
    #[must_use]
    pub fn with_cost(mut self, cost: CostFunction) -> Self {
        self.cost = cost;
        self
    }

    /// Set the master random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn ensemble_size(&self) -> usize {
        self.ensemble_size
    }

    /// Return the resample ratio.
    #[must_use]
    pub fn resample_ratio(&self) -> f64 {
        self.resample_ratio
    }

    /// Return the candidate feature count per split, if restricted.
    #[must_use]
    pub fn features_per_split(&self) -> Option<usize> {
        self.features_per_split
    }

    /// Return the maximum tree depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the leaf size threshold.
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Return the cost function.
    #[must_use]
    pub fn cost(&self) -> CostFunction {
        self.cost
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of samples a single bootstrap draw takes from `n_samples`: ⌈r·n⌉.
    ///
    /// Products within 1e-9 of an integer are rounded first, so `0.7 × 10`
    /// draws 7 and not 8.
    #[must_use]
    pub fn draw_count(&self, n_samples: usize) -> usize {
        let exact = n_samples as f64 * self.resample_ratio;
        let rounded = exact.round();
        if (exact - rounded).abs() < 1e-9 {
            rounded as usize
        } else {
            exact.ceil() as usize
        }
    }

    /// Tree configuration shared by every member; the seed is set per tree.
    pub(crate) fn tree_config(&self) -> TreeConfig {
        let sampling = match self.features_per_split {
            Some(candidates) => FeatureSampling::Random { candidates },
            None => FeatureSampling::All,
        };
        TreeConfig::new()
            .with_max_depth(self.max_depth)
            .with_min_size(self.min_size)
            .with_cost(self.cost)
            .with_sampling(sampling)
    }

    /// Train the ensemble on `data`, building trees in parallel on `scheduler`.
    ///
    /// # Errors
    ///
    /// | Variant                            | When                                           |
    /// |------------------------------------|------------------------------------------------|
    /// | [`GroveError::InvalidResampleRatio`] | `resample_ratio` is not in (0.0, 1.0]        |
    /// | [`GroveError::BootstrapTooSmall`]  | a draw would hold fewer than 2 samples         |
    /// | [`GroveError::InvalidCandidates`]  | `features_per_split` is 0 or exceeds the feature count |
    /// | [`GroveError::InvalidMaxDepth`]    | `max_depth` is 0                               |
    pub fn fit(&self, data: &DataSet, scheduler: &Scheduler) -> Result<Forest, GroveError> {
        crate::forest::train(self, data, scheduler)
    }
}
