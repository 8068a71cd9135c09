#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Compute dispatch layer
//!
//! Runs the frame passes of the jiggle simulation over independent work
//! groups. A work group is one chain instance: its head record and its block
//! of particles. Backends only decide *how* the groups of a single
//! [`Kernel`] are scheduled; every [`ComputeBackend::dispatch`] call returns
//! after all groups have finished, so consecutive dispatches are separated by
//! a hard barrier.

use thiserror::Error;

pub mod backend;
pub mod cpu_backend;
#[cfg(feature = "parallel")]
pub mod parallel_backend;

pub use backend::{ComputeBackend, Workgroup};
pub use cpu_backend::CpuBackend;
#[cfg(feature = "parallel")]
pub use parallel_backend::ParallelBackend;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("backend not available: {0}")]
    BackendUnavailable(String),
}

/// The per-frame passes, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Read the anchor pose and compute this frame's movement delta.
    CaptureRoot,
    /// Compose rest-local poses down the chain (sequential per group).
    PropagateRest,
    /// Inertia, damping and external forces.
    Integrate,
    /// Elasticity, stiffness clamp and parent distance constraint.
    SolveConstraints,
    /// Collider projection and final orientation.
    ResolveCollisions,
}

impl Kernel {
    /// All kernels of one frame in barrier order.
    pub const FRAME_ORDER: [Kernel; 5] = [
        Kernel::CaptureRoot,
        Kernel::PropagateRest,
        Kernel::Integrate,
        Kernel::SolveConstraints,
        Kernel::ResolveCollisions,
    ];
}

/// Returns the preferred backend for this build.
///
/// With the `parallel` feature a rayon pool sized to the available cores is
/// used; if it cannot be created, or the feature is off, the sequential
/// [`CpuBackend`] is returned.
#[must_use]
pub fn default_backend() -> std::sync::Arc<dyn ComputeBackend> {
    #[cfg(feature = "parallel")]
    {
        match ParallelBackend::new() {
            Ok(pool) => {
                tracing::info!(threads = pool.threads(), "Using ParallelBackend.");
                return std::sync::Arc::new(pool);
            }
            Err(e) => {
                tracing::warn!("ParallelBackend initialization failed ({e}), falling back...");
            }
        }
    }

    tracing::info!("Using CpuBackend.");
    std::sync::Arc::new(CpuBackend::new())
}
