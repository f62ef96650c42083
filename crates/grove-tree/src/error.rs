/// Broad classification of a [`GroveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The data handed to an operation is unusable (empty, wrong arity, non-finite).
    InvalidInput,
    /// A construction parameter is out of its valid range.
    InvalidConfiguration,
}

/// Errors from tree growing, ensemble training and ensemble evaluation.
#[derive(Debug, thiserror::Error)]
pub enum GroveError {
    /// Returned when a training data set has zero samples.
    #[error("data set has zero samples")]
    EmptyDataset,

    /// Returned when samples carry no feature column in front of the label.
    #[error("samples have {arity} columns, need at least one feature and a label")]
    TooFewColumns {
        /// Number of columns in the first sample.
        arity: usize,
    },

    /// Returned when a sample has a different arity from the first sample.
    #[error("sample {sample_index} has {got} columns, expected {expected}")]
    InconsistentArity {
        /// Arity of the first sample.
        expected: usize,
        /// Arity of the offending sample.
        got: usize,
        /// Zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, column {column}")]
    NonFiniteValue {
        /// Zero-based index of the offending sample.
        sample_index: usize,
        /// Zero-based column of the offending value.
        column: usize,
    },

    /// Returned when a query vector is empty.
    #[error("query vector is empty")]
    EmptyQuery,

    /// Returned when a query vector cannot be matched to the model's features.
    #[error("query has {got} values, expected {expected} features (optionally followed by a label)")]
    QueryArityMismatch {
        /// Number of features the model was trained on.
        expected: usize,
        /// Length of the query vector.
        got: usize,
    },

    /// Returned when `max_depth` is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid depth limit.
        max_depth: usize,
    },

    /// Returned when the random split search is asked for 0 or too many candidate features.
    #[error("candidate feature count {candidates} must be in [1, {n_features}]")]
    InvalidCandidates {
        /// Requested number of candidate features per split.
        candidates: usize,
        /// Number of features available.
        n_features: usize,
    },

    /// Returned when the ensemble size is zero.
    #[error("ensemble_size must be at least 1, got {ensemble_size}")]
    InvalidEnsembleSize {
        /// The invalid ensemble size.
        ensemble_size: usize,
    },

    /// Returned when the resample ratio is not in (0.0, 1.0].
    #[error("resample_ratio must be in (0.0, 1.0], got {ratio}")]
    InvalidResampleRatio {
        /// The invalid ratio.
        ratio: f64,
    },

    /// Returned when a bootstrap draw would hold fewer than two samples.
    #[error("bootstrap draw of {draw_count} samples from {n_samples} is too small, need at least 2")]
    BootstrapTooSmall {
        /// Number of samples a single draw would contain.
        draw_count: usize,
        /// Number of samples in the data set.
        n_samples: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        n_folds: usize,
    },

    /// Returned when a class has fewer samples than the number of folds.
    #[error("label {label} has only {count} samples, need at least {n_folds} for stratified CV")]
    TooFewSamplesForFolds {
        /// The label with insufficient samples.
        label: f64,
        /// Number of samples carrying that label.
        count: usize,
        /// Requested number of folds.
        n_folds: usize,
    },

    /// Returned when predicted and actual label slices differ in length.
    #[error("{predicted} predictions for {actual} labels")]
    LengthMismatch {
        /// Number of predicted labels.
        predicted: usize,
        /// Number of actual labels.
        actual: usize,
    },

    /// Returned when the parallel cutoff fraction is not in (0.0, 1.0].
    #[error("cutoff fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidCutoffFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when the worker pool cannot be built.
    #[error("failed to build a pool of {n_threads} workers")]
    SchedulerBuild {
        /// Requested worker count.
        n_threads: usize,
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when a member of an ensemble fails during evaluation.
    #[error("model {index} of the ensemble failed")]
    ModelFailed {
        /// Index of the failing model in the ensemble.
        index: usize,
        /// The error reported by the model.
        source: Box<GroveError>,
    },
}

impl GroveError {
    /// Classify this error as bad input or bad configuration.
    ///
    /// A [`GroveError::ModelFailed`] takes the kind of the error it wraps.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroveError::EmptyDataset
            | GroveError::TooFewColumns { .. }
            | GroveError::InconsistentArity { .. }
            | GroveError::NonFiniteValue { .. }
            | GroveError::EmptyQuery
            | GroveError::QueryArityMismatch { .. }
            | GroveError::TooFewSamplesForFolds { .. }
            | GroveError::LengthMismatch { .. } => ErrorKind::InvalidInput,
            GroveError::InvalidMaxDepth { .. }
            | GroveError::InvalidCandidates { .. }
            | GroveError::InvalidEnsembleSize { .. }
            | GroveError::InvalidResampleRatio { .. }
            | GroveError::BootstrapTooSmall { .. }
            | GroveError::InvalidFoldCount { .. }
            | GroveError::InvalidCutoffFraction { .. }
            | GroveError::SchedulerBuild { .. } => ErrorKind::InvalidConfiguration,
            GroveError::ModelFailed { source, .. } => source.kind(),
        }
    }
}
