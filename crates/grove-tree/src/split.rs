use std::cmp::Ordering;

use rand::Rng;

use crate::cost::{CostFunction, class_counts};
use crate::dataset::DataSet;
use crate::node::FeatureIndex;

/// Which features the split search may consider at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureSampling {
    /// Full scan: every feature is a candidate.
    #[default]
    All,
    /// A fresh random subset of `candidates` features per split site.
    Random {
        /// Number of features drawn at each split.
        candidates: usize,
    },
}

/// A candidate or chosen partition of the samples at a node.
///
/// `below` holds the rows with `value < threshold` and `above` the rest,
/// both as indices into the [`DataSet`] being split.
#[derive(Debug, Clone)]
pub struct Split {
    /// Feature the samples were partitioned on.
    pub feature: FeatureIndex,
    /// Threshold value taken from an observed sample.
    pub threshold: f64,
    /// Weighted cost of the partition.
    pub score: f64,
    /// Rows with `value < threshold`.
    pub below: Vec<usize>,
    /// Rows with `value >= threshold`.
    pub above: Vec<usize>,
}

impl Split {
    /// Return `true` if one side of the partition is empty.
    ///
    /// A degenerate split carries no information; the tree builder turns
    /// the node into a leaf instead.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.below.is_empty() || self.above.is_empty()
    }
}

/// Draw `k` distinct feature indices out of `0..n_features`.
///
/// Partial Fisher-Yates shuffle: only the first `k` positions are
/// randomized. `k` is clamped to `n_features`.
pub fn choose_features(n_features: usize, k: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = k.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}

/// Searches for the (feature, threshold) pair with the lowest weighted cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitOptimizer {
    cost: CostFunction,
    sampling: FeatureSampling,
}

impl SplitOptimizer {
    /// Create an optimizer with the given cost function and feature policy.
    #[must_use]
    pub fn new(cost: CostFunction, sampling: FeatureSampling) -> Self {
        Self { cost, sampling }
    }

    /// Create an optimizer that scans every feature.
    #[must_use]
    pub fn full_scan(cost: CostFunction) -> Self {
        Self::new(cost, FeatureSampling::All)
    }

    /// Create an optimizer that draws `candidates` random features per call.
    #[must_use]
    pub fn random_features(cost: CostFunction, candidates: usize) -> Self {
        Self::new(cost, FeatureSampling::Random { candidates })
    }

    /// Return the cost function.
    #[must_use]
    pub fn cost(&self) -> CostFunction {
        self.cost
    }

    /// Return the feature policy.
    #[must_use]
    pub fn sampling(&self) -> FeatureSampling {
        self.sampling
    }

    /// Find the lowest-cost split of the rows at `indices`.
    ///
    /// Every distinct observed value of every candidate feature is tried as
    /// a threshold. Candidates are visited feature by feature and, within a
    /// feature, in the order their values first appear in `indices`; a
    /// later candidate replaces the best only with a strictly lower score,
    /// so ties keep the first found.
    ///
    /// The smallest observed value always yields an empty "below" side
    /// scoring the unsplit impurity, hence the returned score never exceeds
    /// it. The result may be degenerate (see [`Split::is_degenerate`]).
    ///
    /// Returns `None` only when `indices` is empty.
    pub fn find_best_split(
        &self,
        data: &DataSet,
        indices: &[usize],
        rng: &mut impl Rng,
    ) -> Option<Split> {
        if indices.is_empty() {
            return None;
        }

        let n_classes = data.n_classes();
        let parent_counts = class_counts(indices.iter().map(|&i| data.class_id(i).index()), n_classes);

        let features = match self.sampling {
            FeatureSampling::All => (0..data.n_features()).collect(),
            FeatureSampling::Random { candidates } => {
                choose_features(data.n_features(), candidates, rng)
            }
        };

        let mut best: Option<(FeatureIndex, f64, f64)> = None;

        for feature in features {
            let scored = self.score_thresholds(data, indices, feature, &parent_counts);

            // Visit thresholds in first-seen row order.
            let mut tried = vec![false; scored.len()];
            for &row in indices {
                let value = data.value(row, feature);
                let Ok(pos) = scored.binary_search_by(|probe| {
                    probe.0.partial_cmp(&value).unwrap_or(Ordering::Equal)
                }) else {
                    continue;
                };
                if tried[pos] {
                    continue;
                }
                tried[pos] = true;

                let (threshold, score) = scored[pos];
                if best.is_none_or(|(_, _, best_score)| score < best_score) {
                    best = Some((FeatureIndex::new(feature), threshold, score));
                }
            }
        }

        let (feature, threshold, score) = best?;
        let (below, above): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&row| data.value(row, feature.index()) < threshold);

        Some(Split {
            feature,
            threshold,
            score,
            below,
            above,
        })
    }

    /// Score every distinct value of `feature` as a threshold.
    ///
    /// Returns `(threshold, score)` pairs sorted by ascending threshold. A
    /// single sorted sweep keeps the class counts of rows strictly below
    /// the current value.
    fn score_thresholds(
        &self,
        data: &DataSet,
        indices: &[usize],
        feature: usize,
        parent_counts: &[usize],
    ) -> Vec<(f64, f64)> {
        let n_samples = indices.len();
        let mut sorted: Vec<(f64, usize)> = indices
            .iter()
            .map(|&row| (data.value(row, feature), data.class_id(row).index()))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut below_counts = vec![0usize; parent_counts.len()];
        let mut above_counts = parent_counts.to_vec();
        let mut scored: Vec<(f64, f64)> = Vec::new();

        for (i, &(value, class)) in sorted.iter().enumerate() {
            if i == 0 || sorted[i - 1].0 != value {
                let score = self.cost.score(&[
                    (below_counts.as_slice(), i),
                    (above_counts.as_slice(), n_samples - i),
                ]);
                scored.push((value, score));
            }
            below_counts[class] += 1;
            above_counts[class] -= 1;
        }

        scored
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitOptimizer, choose_features};
    use crate::cost::CostFunction;
    use crate::dataset::DataSet;

    fn all(data: &DataSet) -> Vec<usize> {
        (0..data.len()).collect()
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let data = DataSet::new(vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 1.0],
            vec![11.0, 1.0],
            vec![12.0, 1.0],
        ])
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = SplitOptimizer::full_scan(CostFunction::Gini)
            .find_best_split(&data, &all(&data), &mut rng)
            .expect("should find a split");

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 10.0).abs() < f64::EPSILON);
        assert!(split.score.abs() < f64::EPSILON);
        assert_eq!(split.below, vec![0, 1, 2]);
        assert_eq!(split.above, vec![3, 4, 5]);
        assert!(!split.is_degenerate());
    }

    #[test]
    fn constant_feature_is_degenerate() {
        let data = DataSet::new(vec![
            vec![5.0, 0.0],
            vec![5.0, 0.0],
            vec![5.0, 1.0],
            vec![5.0, 1.0],
        ])
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = SplitOptimizer::full_scan(CostFunction::Gini)
            .find_best_split(&data, &all(&data), &mut rng)
            .unwrap();

        assert!(split.is_degenerate());
        assert!(split.below.is_empty());
        assert!((split.score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_keep_first_found() {
        // AND data: feature 0 at 1.0 and feature 1 at 1.0 both score 0.25.
        let data = DataSet::new(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = SplitOptimizer::full_scan(CostFunction::Gini)
            .find_best_split(&data, &all(&data), &mut rng)
            .unwrap();

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 1.0).abs() < f64::EPSILON);
        assert!((split.score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn thresholds_tried_in_first_seen_order() {
        // Thresholds 1.0 and 3.0 both score 1/3; 3.0 appears first in row order.
        let data = DataSet::new(vec![
            vec![3.0, 0.0],
            vec![2.0, 1.0],
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let split = SplitOptimizer::full_scan(CostFunction::Gini)
            .find_best_split(&data, &all(&data), &mut rng)
            .unwrap();

        assert!((split.threshold - 3.0).abs() < f64::EPSILON);
        assert!((split.score - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(split.below, vec![1, 2, 3]);
        assert_eq!(split.above, vec![0]);
    }

    #[test]
    fn score_never_exceeds_unsplit_impurity() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for seed in 0..20u64 {
            let mut gen_rng = ChaCha8Rng::seed_from_u64(seed);
            let rows: Vec<Vec<f64>> = (0..30)
                .map(|_| {
                    use rand::Rng;
                    vec![
                        gen_rng.gen_range(0..5) as f64,
                        gen_rng.gen_range(0..5) as f64,
                        gen_rng.gen_range(0..3) as f64,
                    ]
                })
                .collect();
            let data = DataSet::new(rows).unwrap();
            let indices = all(&data);
            let counts = crate::cost::class_counts(
                indices.iter().map(|&i| data.class_id(i).index()),
                data.n_classes(),
            );
            let unsplit = CostFunction::Gini.impurity(&counts, data.len()).value();

            for optimizer in [
                SplitOptimizer::full_scan(CostFunction::Gini),
                SplitOptimizer::random_features(CostFunction::Gini, 1),
            ] {
                let split = optimizer.find_best_split(&data, &indices, &mut rng).unwrap();
                assert!(
                    split.score <= unsplit + 1e-12,
                    "seed {seed}: split score {} > unsplit {unsplit}",
                    split.score
                );
            }
        }
    }

    #[test]
    fn random_features_only_use_drawn_feature() {
        // Feature 0 is informative, feature 1 is constant. With one candidate
        // per call, some draws must land on the constant feature.
        let data = DataSet::new(vec![
            vec![0.0, 9.0, 0.0],
            vec![1.0, 9.0, 0.0],
            vec![5.0, 9.0, 1.0],
            vec![6.0, 9.0, 1.0],
        ])
        .unwrap();
        let optimizer = SplitOptimizer::random_features(CostFunction::Gini, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = [false; 2];
        for _ in 0..64 {
            let split = optimizer
                .find_best_split(&data, &all(&data), &mut rng)
                .unwrap();
            seen[split.feature.index()] = true;
            if split.feature.index() == 1 {
                assert!(split.is_degenerate());
            }
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn empty_indices_yield_none() {
        let data = DataSet::new(vec![vec![1.0, 0.0]]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(
            SplitOptimizer::full_scan(CostFunction::Gini)
                .find_best_split(&data, &[], &mut rng)
                .is_none()
        );
    }

    #[test]
    fn choose_features_distinct_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for k in 0..=6 {
            let mut chosen = choose_features(5, k, &mut rng);
            assert_eq!(chosen.len(), k.min(5));
            chosen.sort_unstable();
            chosen.dedup();
            assert_eq!(chosen.len(), k.min(5));
            assert!(chosen.iter().all(|&f| f < 5));
        }
    }

    #[test]
    fn choose_features_reproducible_with_seed() {
        let a = choose_features(10, 4, &mut ChaCha8Rng::seed_from_u64(5));
        let b = choose_features(10, 4, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
