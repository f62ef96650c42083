//! Explicit handle on the worker pool used for training and evaluation.

use std::sync::Arc;

use tracing::debug;

use crate::error::GroveError;

/// A bounded pool of workers for fork-join tasks.
///
/// Cloning a scheduler shares the same pool. Passing the handle explicitly
/// keeps concurrent work off rayon's global pool, so callers (and tests)
/// control exactly how many workers run.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pool: Arc<rayon::ThreadPool>,
}

impl Scheduler {
    /// Build a pool of `n_threads` workers; `0` lets rayon pick one per core.
    ///
    /// # Errors
    ///
    /// Returns [`GroveError::SchedulerBuild`] if the pool cannot be created.
    pub fn new(n_threads: usize) -> Result<Self, GroveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("grove-worker-{i}"))
            .build()
            .map_err(|source| GroveError::SchedulerBuild { n_threads, source })?;
        debug!(n_threads = pool.current_num_threads(), "worker pool ready");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Return the number of workers in the pool.
    #[must_use]
    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool; rayon calls made by `op` use its workers.
    pub fn install<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        self.pool.install(op)
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;

    #[test]
    fn pool_has_requested_workers() {
        let scheduler = Scheduler::new(3).unwrap();
        assert_eq!(scheduler.n_threads(), 3);
        assert_eq!(scheduler.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn clones_share_the_pool() {
        let scheduler = Scheduler::new(2).unwrap();
        let clone = scheduler.clone();
        assert_eq!(clone.install(|| 40 + 2), 42);
        assert_eq!(clone.n_threads(), scheduler.n_threads());
    }
}
