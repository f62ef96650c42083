//! Bootstrap aggregation: training an ensemble of trees on resampled data.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::dataset::DataSet;
use crate::error::GroveError;
use crate::schedule::Scheduler;
use crate::tree::ClassificationTree;

/// A fitted ensemble of classification trees, held in draw order.
#[derive(Debug, Clone)]
pub struct Forest {
    pub(crate) trees: Vec<ClassificationTree>,
    pub(crate) n_features: usize,
}

/// Draw `draw_count` row indices from `0..n_samples` with replacement.
pub fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the ensemble.
#[instrument(skip_all, fields(n_trees = config.ensemble_size, n_samples = data.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    data: &DataSet,
    scheduler: &Scheduler,
) -> Result<Forest, GroveError> {
    // --- Validate config against the data ---
    let ratio = config.resample_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(GroveError::InvalidResampleRatio { ratio });
    }
    let n_samples = data.len();
    let draw_count = config.draw_count(n_samples);
    if draw_count < 2 {
        return Err(GroveError::BootstrapTooSmall {
            draw_count,
            n_samples,
        });
    }
    let tree_config = config.tree_config();
    tree_config.validate(data.n_features())?;

    info!(
        n_trees = config.ensemble_size,
        n_samples,
        n_features = data.n_features(),
        n_classes = data.n_classes(),
        features_per_split = config.features_per_split,
        draw_count,
        "training forest"
    );

    // Per-tree seeds come from the master RNG so results do not depend on
    // the number of workers.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.ensemble_size)
        .map(|_| master_rng.r#gen())
        .collect();

    let trees = scheduler.install(|| {
        tree_seeds
            .into_par_iter()
            .enumerate()
            .map(|(tree_index, seed)| -> Result<ClassificationTree, GroveError> {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let indices = bootstrap_sample(n_samples, draw_count, &mut rng);
                let tree = tree_config.fit_rows(data, &indices, &mut rng)?;
                debug!(
                    tree_index,
                    n_nodes = tree.n_nodes(),
                    depth = tree.depth(),
                    "tree trained"
                );
                Ok(tree)
            })
            .collect::<Result<Vec<_>, GroveError>>()
    })?;

    info!(n_trees_trained = trees.len(), "forest training complete");

    Ok(Forest {
        trees,
        n_features: data.n_features(),
    })
}
