//! Decision-tree ensembles: grow, bag, evaluate.
//!
//! Provides CART classification trees grown by a cost-function splitter,
//! bootstrap aggregation into bagged ensembles or random forests (trained in
//! parallel on an explicit worker pool), and processors that evaluate every
//! member of an ensemble on one input, sequentially or by recursive
//! fork-join into an index-addressed result vector.

mod config;
mod confusion;
mod cost;
mod dataset;
mod error;
mod eval;
mod forest;
mod model;
mod node;
mod predict;
mod processor;
mod schedule;
mod split;
mod tree;
pub mod vote;

pub use config::ForestConfig;
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use cost::CostFunction;
pub use dataset::{ClassId, DataSet};
pub use error::{ErrorKind, GroveError};
pub use eval::{CrossValidation, CrossValidationResult, accuracy};
pub use forest::{Forest, bootstrap_sample};
pub use model::Predict;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use processor::{EnsembleProcessor, ParallelProcessor, Processor, SequentialProcessor};
pub use schedule::Scheduler;
pub use split::{FeatureSampling, Split, SplitOptimizer, choose_features};
pub use tree::{ClassificationTree, TreeConfig};
