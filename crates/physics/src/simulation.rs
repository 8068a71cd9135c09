//! # Jiggle Simulation Core
//!
//! [`JiggleWorld`] owns the batch registry, the collider set and the compute
//! backend, and runs one frame per [`JiggleWorld::step`] call:
//!
//! 1. queued admissions/releases are applied,
//! 2. collider poses are refreshed from the host,
//! 3. the five passes of [`Kernel::FRAME_ORDER`] are dispatched over every
//!    active instance, each a barrier for the next,
//! 4. results are written back to the host, sequentially.

use std::ops::Range;
use std::sync::Arc;

use compute::{ComputeBackend, Kernel, Workgroup};
use glam::Vec3;

use crate::builder::{build_chain, ChainConfig};
use crate::collision::{ColliderInfo, ColliderSet, ResolvedCollider};
use crate::error::{BuildError, PhysicsError};
use crate::host::{JointTree, TransformAccess, TransformHandle, TransformWrite};
use crate::registry::BatchRegistry;
use crate::steps;
use crate::types::{ColliderId, HeadInfo, InstanceId, Particle, DEFAULT_PARTICLE_CAPACITY};

/// Summary of one simulated frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub instances: usize,
    pub particles: usize,
    /// Particles that touched a collider this frame.
    pub collisions: usize,
    /// Host transforms written back.
    pub written: usize,
}

pub struct JiggleWorld {
    registry: BatchRegistry,
    colliders: ColliderSet,
    backend: Arc<dyn ComputeBackend>,
    frame: u64,
}

impl Default for JiggleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl JiggleWorld {
    /// World with the default backend and per-instance capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(compute::default_backend(), DEFAULT_PARTICLE_CAPACITY)
    }

    #[must_use]
    pub fn with_backend(backend: Arc<dyn ComputeBackend>, capacity: usize) -> Self {
        Self {
            registry: BatchRegistry::new(capacity),
            colliders: ColliderSet::new(),
            backend,
            frame: 0,
        }
    }

    pub fn set_backend(&mut self, backend: Arc<dyn ComputeBackend>) {
        tracing::info!(backend = backend.name(), "switching compute backend");
        self.backend = backend;
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    #[must_use]
    pub fn registry(&self) -> &BatchRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BatchRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn colliders_mut(&mut self) -> &mut ColliderSet {
        &mut self.colliders
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn add_collider(
        &mut self,
        info: ColliderInfo,
        transform: Option<TransformHandle>,
    ) -> ColliderId {
        let id = self.colliders.add(info, transform);
        tracing::debug!(?id, global = info.global, "collider added");
        id
    }

    pub fn remove_collider(&mut self, id: ColliderId) -> Option<ColliderInfo> {
        self.colliders.remove(id)
    }

    /// Builds a chain from `tree` and queues it for admission on the next
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] that rejected the configuration; nothing is
    /// registered in that case.
    pub fn attach_chain<T: JointTree + ?Sized>(
        &mut self,
        tree: &T,
        config: &ChainConfig,
    ) -> Result<InstanceId, BuildError> {
        let built = config
            .colliders
            .iter()
            .find(|id| !self.colliders.contains(**id))
            .map_or_else(
                || build_chain(tree, config, self.registry.capacity()),
                |id| Err(BuildError::UnknownCollider(*id)),
            );
        let chain = match built {
            Ok(chain) => chain,
            Err(err) => {
                tracing::warn!(root = ?config.root, %err, "chain rejected");
                return Err(err);
            }
        };
        let particles = chain.particles.len();
        let id = self.registry.register(chain).inspect_err(|err| {
            tracing::warn!(root = ?config.root, %err, "chain rejected");
        })?;
        self.registry.queue_admit(id);
        tracing::debug!(?id, root = ?config.root, particles, "chain attached");
        Ok(id)
    }

    /// Releases a chain right away and forgets it. Returns `false` for an
    /// unknown id.
    pub fn detach_chain(&mut self, id: InstanceId) -> bool {
        self.registry.unregister(id).is_some()
    }

    /// Queues (re)admission of a registered chain.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn enable(&self, id: InstanceId) -> Result<(), PhysicsError> {
        self.require(id)?;
        self.registry.queue_admit(id);
        Ok(())
    }

    /// Queues release of a chain without forgetting it.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn disable(&self, id: InstanceId) -> Result<(), PhysicsError> {
        self.require(id)?;
        self.registry.queue_release(id);
        Ok(())
    }

    fn require(&self, id: InstanceId) -> Result<(), PhysicsError> {
        if self.registry.is_registered(id) {
            Ok(())
        } else {
            Err(PhysicsError::UnknownInstance(id))
        }
    }

    fn update_head(
        &mut self,
        id: InstanceId,
        f: impl Fn(&mut HeadInfo),
    ) -> Result<(), PhysicsError> {
        if self.registry.update_head(id, f) {
            Ok(())
        } else {
            Err(PhysicsError::UnknownInstance(id))
        }
    }

    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn set_gravity(&mut self, id: InstanceId, gravity: Vec3) -> Result<(), PhysicsError> {
        self.update_head(id, |h| h.gravity = gravity)
    }

    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn set_force(&mut self, id: InstanceId, force: Vec3) -> Result<(), PhysicsError> {
        self.update_head(id, |h| h.force = force)
    }

    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn set_weight(&mut self, id: InstanceId, weight: f32) -> Result<(), PhysicsError> {
        let weight = weight.clamp(0.0, 1.0);
        self.update_head(id, |h| h.weight = weight)
    }

    /// Snaps the chain back to its animated pose on the next frame.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::UnknownInstance`] if `id` was never registered.
    pub fn reset(&mut self, id: InstanceId) -> Result<(), PhysicsError> {
        self.update_head(id, |h| h.reset_pending = true)
    }

    #[must_use]
    pub fn head(&self, id: InstanceId) -> Option<&HeadInfo> {
        self.registry.head(id)
    }

    #[must_use]
    pub fn particles(&self, id: InstanceId) -> Option<&[Particle]> {
        self.registry.particles_of(id)
    }

    /// Advances every active chain by `dt` seconds and writes the result to
    /// `host`. Negative or non-finite `dt` is treated as zero.
    ///
    /// # Errors
    ///
    /// Propagates a failing compute dispatch. Buffers may then hold a
    /// partially simulated frame; nothing is written back.
    pub fn step<H>(&mut self, host: &mut H, dt: f32) -> Result<FrameStats, PhysicsError>
    where
        H: TransformAccess + TransformWrite,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let applied = self.registry.apply_pending();
        if applied > 0 {
            tracing::debug!(applied, active = self.registry.len(), "membership changed");
        }
        self.colliders.refresh(&*host);

        let mut order = Vec::new();
        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(self.registry.len());
        for list in self.registry.collider_lists() {
            let start = order.len();
            self.colliders.effective_order(list, &mut order);
            ranges.push(start..order.len());
        }

        let capacity = self.registry.capacity();
        let access: &dyn TransformAccess = &*host;
        let resolved = self.colliders.resolved();
        let (heads, particles) = self.registry.active_buffers_mut();

        let mut views: Vec<InstanceView<'_>> = heads
            .iter_mut()
            .zip(particles.chunks_mut(capacity))
            .zip(ranges)
            .map(|((head, block), range)| {
                let count = head.particle_count as usize;
                InstanceView {
                    head,
                    particles: &mut block[..count],
                    host: access,
                    colliders: resolved,
                    order: &order[range],
                    dt,
                    touched: 0,
                }
            })
            .collect();

        {
            let mut groups: Vec<&mut dyn Workgroup> =
                views.iter_mut().map(|v| v as &mut dyn Workgroup).collect();
            for kernel in Kernel::FRAME_ORDER {
                self.backend.dispatch(kernel, &mut groups)?;
            }
        }

        let instances = views.len();
        let particle_count: usize = views.iter().map(|v| v.particles.len()).sum();
        let collisions: usize = views.iter().map(|v| v.touched as usize).sum();
        drop(views);

        let written = self.registry.write_back(host);
        self.frame += 1;

        let stats = FrameStats {
            frame: self.frame,
            instances,
            particles: particle_count,
            collisions,
            written,
        };
        tracing::trace!(?stats, backend = self.backend.name(), "frame complete");
        Ok(stats)
    }
}

/// One instance's share of a frame: its head, its particle block and
/// read-only views of the host and colliders.
struct InstanceView<'a> {
    head: &'a mut HeadInfo,
    particles: &'a mut [Particle],
    host: &'a dyn TransformAccess,
    colliders: &'a [Option<ResolvedCollider>],
    order: &'a [usize],
    dt: f32,
    touched: u32,
}

impl Workgroup for InstanceView<'_> {
    fn run(&mut self, kernel: Kernel) {
        match kernel {
            Kernel::CaptureRoot => {
                let anchor = self.host.world_pose(self.head.anchor);
                steps::capture_root(self.head, anchor);
            }
            Kernel::PropagateRest => steps::propagate_rest(self.head, self.particles),
            Kernel::Integrate => steps::integrate(self.head, self.particles, self.dt),
            Kernel::SolveConstraints => {
                let time_var = self.head.time_var(self.dt);
                steps::solve_constraints(self.head, self.particles, time_var);
            }
            Kernel::ResolveCollisions => {
                self.touched =
                    steps::resolve_collisions(self.head, self.particles, self.colliders, self.order);
            }
        }
    }
}
