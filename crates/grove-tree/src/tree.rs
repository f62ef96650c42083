use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    GroveError,
    cost::{CostFunction, class_counts},
    dataset::{ClassId, DataSet},
    model::Predict,
    node::{Node, NodeIndex},
    split::{FeatureSampling, SplitOptimizer},
};

/// Configuration for a single CART classification tree.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter   | Default            |
/// |-------------|--------------------|
/// | `max_depth` | 10                 |
/// | `min_size`  | 1                  |
/// | `cost`      | `Gini`             |
/// | `sampling`  | `All` (full scan)  |
/// | `seed`      | 42                 |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_size: usize,
    pub(crate) cost: CostFunction,
    pub(crate) sampling: FeatureSampling,
    pub(crate) seed: u64,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 10,
            min_size: 1,
            cost: CostFunction::Gini,
            sampling: FeatureSampling::All,
            seed: 42,
        }
    }

    /// Set the maximum tree depth.
    ///
    /// The root decision sits at depth 1, so `1` grows a single split with
    /// two leaves.
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

    /// Set the cost function used to score splits.
    #[must_use]
    pub fn with_cost(mut self, cost: CostFunction) -> Self {
        self.cost = cost;
        self
    }

    /// Set the feature policy of the split search.
    #[must_use]
    pub fn with_sampling(mut self, sampling: FeatureSampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the random seed used when features are sampled.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the maximum depth.
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

    /// Return the feature policy.
    #[must_use]
    pub fn sampling(&self) -> FeatureSampling {
        self.sampling
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a tree on every sample of `data`.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`GroveError::InvalidMaxDepth`] | `max_depth` is 0 |
    /// | [`GroveError::InvalidCandidates`] | random candidates are 0 or exceed the feature count |
    #[instrument(skip_all, fields(n_samples = data.len()))]
    pub fn fit(&self, data: &DataSet) -> Result<ClassificationTree, GroveError> {
        let indices: Vec<usize> = (0..data.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.fit_rows(data, &indices, &mut rng)
    }

    /// Train a tree on the rows of `data` at `indices` (duplicates allowed).
    pub(crate) fn fit_rows(
        &self,
        data: &DataSet,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<ClassificationTree, GroveError> {
        self.validate(data.n_features())?;
        if indices.is_empty() {
            return Err(GroveError::EmptyDataset);
        }

        let mut builder = TreeBuilder {
            data,
            optimizer: SplitOptimizer::new(self.cost, self.sampling),
            max_depth: self.max_depth,
            min_size: self.min_size,
            rng,
            arena: Vec::new(),
        };
        let root = builder.grow(indices, 1);
        let nodes = builder.arena;

        debug!(
            root_index = root.index(),
            n_nodes = nodes.len(),
            "classification tree built"
        );

        Ok(ClassificationTree {
            nodes,
            n_features: data.n_features(),
        })
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<(), GroveError> {
        if self.max_depth == 0 {
            return Err(GroveError::InvalidMaxDepth { max_depth: 0 });
        }
        if let FeatureSampling::Random { candidates } = self.sampling
            && (candidates == 0 || candidates > n_features)
        {
            return Err(GroveError::InvalidCandidates {
                candidates,
                n_features,
            });
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive state of one tree construction.
struct TreeBuilder<'a> {
    data: &'a DataSet,
    optimizer: SplitOptimizer,
    max_depth: usize,
    min_size: usize,
    rng: &'a mut ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Split the rows at `indices` into a decision node at `depth`, or a
    /// leaf when no informative split exists.
    fn grow(&mut self, indices: &[usize], depth: usize) -> NodeIndex {
        if self.is_single_class(indices) {
            return self.leaf(indices);
        }
        let split = match self.optimizer.find_best_split(self.data, indices, &mut *self.rng) {
            Some(split) if !split.is_degenerate() => split,
            _ => return self.leaf(indices),
        };

        // Arena pattern: reserve the slot, build children, then fill it in.
        let node_idx = self.arena.len();
        let impurity = self.impurity(indices);
        self.arena.push(Node::Leaf {
            label: 0.0,
            impurity,
            n_samples: indices.len(),
        });

        let (left, right) = if depth >= self.max_depth {
            (self.leaf(&split.below), self.leaf(&split.above))
        } else {
            (
                self.child(&split.below, depth),
                self.child(&split.above, depth),
            )
        };

        self.arena[node_idx] = Node::Decision {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples: indices.len(),
        };
        NodeIndex::new(node_idx)
    }

    /// Build the child of a node at `parent_depth`.
    fn child(&mut self, indices: &[usize], parent_depth: usize) -> NodeIndex {
        if indices.len() <= self.min_size {
            self.leaf(indices)
        } else {
            self.grow(indices, parent_depth + 1)
        }
    }

    fn leaf(&mut self, indices: &[usize]) -> NodeIndex {
        let label = self.data.class_label(majority_class(self.data, indices));
        let impurity = self.impurity(indices);
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            label,
            impurity,
            n_samples: indices.len(),
        });
        NodeIndex::new(idx)
    }

    fn impurity(&self, indices: &[usize]) -> crate::Impurity {
        let counts = class_counts(
            indices.iter().map(|&i| self.data.class_id(i).index()),
            self.data.n_classes(),
        );
        self.optimizer.cost().impurity(&counts, indices.len())
    }

    fn is_single_class(&self, indices: &[usize]) -> bool {
        match indices.split_first() {
            Some((&first, rest)) => {
                let class = self.data.class_id(first);
                rest.iter().all(|&i| self.data.class_id(i) == class)
            }
            None => true,
        }
    }
}

/// Most frequent class among `indices`; ties go to the class encountered first.
fn majority_class(data: &DataSet, indices: &[usize]) -> ClassId {
    let n_classes = data.n_classes();
    let mut counts = vec![0usize; n_classes];
    let mut first_seen = vec![usize::MAX; n_classes];
    for (pos, &row) in indices.iter().enumerate() {
        let class = data.class_id(row).index();
        counts[class] += 1;
        if first_seen[class] == usize::MAX {
            first_seen[class] = pos;
        }
    }
    let winner = (0..n_classes)
        .filter(|&c| counts[c] > 0)
        .max_by(|&a, &b| {
            counts[a]
                .cmp(&counts[b])
                .then(first_seen[b].cmp(&first_seen[a]))
        })
        .unwrap_or(0);
    ClassId::new(winner)
}

/// A fitted CART classification tree.
///
/// Stored as an arena-based `Vec<Node>` with index references; the root is
/// [`NodeIndex::ROOT`]. Immutable once trained.
#[derive(Debug, Clone)]
pub struct ClassificationTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl ClassificationTree {
    /// Classify a single query vector.
    ///
    /// Walks from the root: at each decision node, goes left when
    /// `query[feature] < threshold`, right otherwise. The query holds the
    /// feature values, optionally followed by a label which is ignored.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`GroveError::EmptyQuery`] | `query` is empty |
    /// | [`GroveError::QueryArityMismatch`] | `query.len()` is neither `n_features` nor `n_features + 1` |
    pub fn predict(&self, query: &[f64]) -> Result<f64, GroveError> {
        if query.is_empty() {
            return Err(GroveError::EmptyQuery);
        }
        if query.len() != self.n_features && query.len() != self.n_features + 1 {
            return Err(GroveError::QueryArityMismatch {
                expected: self.n_features,
                got: query.len(),
            });
        }
        match &self.nodes[self.traverse(query)] {
            Node::Leaf { label, .. } => Ok(*label),
            Node::Decision { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }

    /// Return the arena of nodes; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes in the tree (decisions and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the number of decision levels on the longest root-to-leaf path.
    ///
    /// A single-leaf tree has depth 0. Uses an iterative BFS.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((NodeIndex::ROOT.index(), 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Decision { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Traverse the tree from the root and return the arena index of the leaf.
    fn traverse(&self, query: &[f64]) -> usize {
        let mut idx = NodeIndex::ROOT.index();
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Decision {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if query[feature.index()] < *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}

impl Predict for ClassificationTree {
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
        ClassificationTree::predict(self, input)
    }
}
