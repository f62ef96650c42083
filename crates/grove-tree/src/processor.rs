//! Evaluating every member of an ensemble on one input.

use tracing::trace;

use crate::error::GroveError;
use crate::model::Predict;
use crate::schedule::Scheduler;

/// Evaluates an ensemble on a single input.
///
/// `predictions(ensemble, input)[i]` is `ensemble[i].predict(input)` for
/// every `i`; the result has exactly `ensemble.len()` entries. A member
/// failure aborts the whole evaluation with [`GroveError::ModelFailed`].
pub trait EnsembleProcessor {
    /// Return the per-model predictions for `input`, ordered by ensemble index.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`GroveError::EmptyQuery`] | `input` is empty |
    /// | [`GroveError::ModelFailed`] | a member's `predict` failed |
    fn predictions<M: Predict>(&self, ensemble: &[M], input: &[f64])
    -> Result<Vec<f64>, GroveError>;
}

/// Evaluates members one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialProcessor;

impl EnsembleProcessor for SequentialProcessor {
    fn predictions<M: Predict>(
        &self,
        ensemble: &[M],
        input: &[f64],
    ) -> Result<Vec<f64>, GroveError> {
        if input.is_empty() {
            return Err(GroveError::EmptyQuery);
        }
        ensemble
            .iter()
            .enumerate()
            .map(|(index, model)| predict_member(model, input, index))
            .collect()
    }
}

/// Evaluates members with recursive fork-join on a [`Scheduler`].
///
/// The index range is bisected until a range holds at most
/// `cutoff_fraction × ensemble.len()` models (never less than one); such a
/// range is evaluated in place. Every task writes into its own disjoint
/// slice of one pre-sized result vector, so result `i` always belongs to
/// model `i` regardless of completion order.
#[derive(Debug, Clone)]
pub struct ParallelProcessor {
    scheduler: Scheduler,
    cutoff_fraction: f64,
}

impl ParallelProcessor {
    /// Share of the ensemble below which a range is evaluated sequentially.
    pub const DEFAULT_CUTOFF_FRACTION: f64 = 0.05;

    /// Create a processor running on `scheduler` with the default cutoff.
    #[must_use]
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            cutoff_fraction: Self::DEFAULT_CUTOFF_FRACTION,
        }
    }

    /// Set the sequential cutoff as a fraction of the ensemble size.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::InvalidCutoffFraction`] unless `fraction` is in (0.0, 1.0].
    pub fn with_cutoff_fraction(mut self, fraction: f64) -> Result<Self, GroveError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(GroveError::InvalidCutoffFraction { fraction });
        }
        self.cutoff_fraction = fraction;
        Ok(self)
    }

    /// Return the cutoff fraction.
    #[must_use]
    pub fn cutoff_fraction(&self) -> f64 {
        self.cutoff_fraction
    }

    /// Return the scheduler this processor runs on.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Largest range evaluated without forking, for an ensemble of `n` models.
    #[must_use]
    pub fn leaf_size(&self, n: usize) -> usize {
        ((n as f64 * self.cutoff_fraction).floor() as usize).max(1)
    }
}

impl EnsembleProcessor for ParallelProcessor {
    fn predictions<M: Predict>(
        &self,
        ensemble: &[M],
        input: &[f64],
    ) -> Result<Vec<f64>, GroveError> {
        if input.is_empty() {
            return Err(GroveError::EmptyQuery);
        }
        let leaf_size = self.leaf_size(ensemble.len());
        trace!(n_models = ensemble.len(), leaf_size, "parallel ensemble evaluation");

        let mut results = vec![0.0f64; ensemble.len()];
        self.scheduler
            .install(|| evaluate_range(ensemble, input, &mut results, 0, leaf_size))?;
        Ok(results)
    }
}

/// Either processor, chosen at runtime.
#[derive(Debug, Clone)]
pub enum Processor {
    /// See [`SequentialProcessor`].
    Sequential(SequentialProcessor),
    /// See [`ParallelProcessor`].
    Parallel(ParallelProcessor),
}

impl EnsembleProcessor for Processor {
    fn predictions<M: Predict>(
        &self,
        ensemble: &[M],
        input: &[f64],
    ) -> Result<Vec<f64>, GroveError> {
        match self {
            Processor::Sequential(p) => p.predictions(ensemble, input),
            Processor::Parallel(p) => p.predictions(ensemble, input),
        }
    }
}

/// Fill `out[i]` with the prediction of `models[i]`.
///
/// `offset` is the ensemble index of `models[0]`, used for error reporting.
/// Both halves of a fork always run to completion; the left error wins.
fn evaluate_range<M: Predict>(
    models: &[M],
    input: &[f64],
    out: &mut [f64],
    offset: usize,
    leaf_size: usize,
) -> Result<(), GroveError> {
    if models.len() <= leaf_size {
        for (i, (slot, model)) in out.iter_mut().zip(models).enumerate() {
            *slot = predict_member(model, input, offset + i)?;
        }
        return Ok(());
    }

    let mid = models.len() / 2;
    let (left_models, right_models) = models.split_at(mid);
    let (left_out, right_out) = out.split_at_mut(mid);
    let (left, right) = rayon::join(
        || evaluate_range(left_models, input, left_out, offset, leaf_size),
        || evaluate_range(right_models, input, right_out, offset + mid, leaf_size),
    );
    left.and(right)
}

fn predict_member<M: Predict>(model: &M, input: &[f64], index: usize) -> Result<f64, GroveError> {
    model
        .predict(input)
        .map_err(|source| GroveError::ModelFailed {
            index,
            source: Box::new(source),
        })
}
