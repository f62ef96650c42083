use crate::node::Impurity;

/// Cost function scoring how mixed the classes of a sample group are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostFunction {
    /// Gini impurity: 1 - Σ(p_i²)
    #[default]
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl CostFunction {
    /// Compute the impurity of a group from its class counts.
    ///
    /// Returns [`Impurity::new(0.0)`] when `n_samples` is zero; an empty
    /// group contributes nothing to a split score.
    ///
    /// For `Gini`: `1 - Σ(p_i²)` where `p_i = count_i / n_samples`.
    /// For `Entropy`: `-Σ(p_i · ln(p_i))` summed only over classes where `p_i > 0`.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            CostFunction::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            CostFunction::Entropy => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.ln()
                    })
                    .sum::<f64>()
            }
        };
        Impurity::new(value)
    }

    /// Score a partition: Σ impurity(group) × |group| / |total|.
    ///
    /// Each group is given as `(class_counts, n_samples)`. Returns 0.0 when
    /// every group is empty.
    #[must_use]
    pub fn score(&self, groups: &[(&[usize], usize)]) -> f64 {
        let total: usize = groups.iter().map(|&(_, n)| n).sum();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        groups
            .iter()
            .map(|&(counts, n)| self.impurity(counts, n).value() * (n as f64 / total))
            .sum()
    }
}

/// Count how many of `labels` fall in each class.
pub(crate) fn class_counts(labels: impl IntoIterator<Item = usize>, n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for class in labels {
        counts[class] += 1;
    }
    counts
}
