//! Data-parallel implementation of [`ComputeBackend`] built on [`rayon`].
//!
//! Groups of one dispatch are spread over a dedicated thread pool. The call
//! joins on every group before returning, which is the barrier between two
//! consecutive passes.

use crate::{ComputeBackend, ComputeError, Kernel, Workgroup};
use rayon::prelude::*;

pub struct ParallelBackend {
    pool: rayon::ThreadPool,
}

impl ParallelBackend {
    /// Creates a pool sized to the available cores.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BackendUnavailable`] if the pool cannot be built.
    pub fn new() -> Result<Self, ComputeError> {
        Self::with_threads(0)
    }

    /// Creates a pool with `threads` workers (`0` picks the core count).
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BackendUnavailable`] if the pool cannot be built.
    pub fn with_threads(threads: usize) -> Result<Self, ComputeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("jiggle-worker-{i}"))
            .build()
            .map_err(|e| ComputeError::BackendUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ComputeBackend for ParallelBackend {
    fn dispatch(
        &self,
        kernel: Kernel,
        groups: &mut [&mut dyn Workgroup],
    ) -> Result<(), ComputeError> {
        tracing::trace!(?kernel, groups = groups.len(), "parallel dispatch");
        self.pool.install(|| {
            groups.par_iter_mut().for_each(|group| group.run(kernel));
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}
