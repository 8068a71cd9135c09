#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::missing_panics_doc
)]
//! # Jiggle Physics
//!
//! Secondary-motion simulation for chains of joints hanging off an animated
//! skeleton: hair strands, tails, accessories.
//!
//! Each chain is flattened once into a pre-order array of particles and
//! simulated every frame with a verlet integrator (damping, inertia,
//! gravity), an elasticity/stiffness pull toward the animated pose, a rest
//! length constraint and projection against sphere and capsule colliders.
//!
//! ## Key Components
//!
//! -   **Host access:** [`JointTree`], [`TransformAccess`] and
//!     [`TransformWrite`] connect the simulation to any transform hierarchy.
//!     [`Skeleton`] is a ready-made arena implementation.
//! -   **Chains:** [`ChainConfig`] describes a chain; [`build_chain`] turns a
//!     joint subtree into particles.
//! -   **Batching:** [`BatchRegistry`] packs active chains into fixed-stride
//!     flat buffers.
//! -   **Simulation:** [`JiggleWorld`] runs the per-frame passes over every
//!     active chain through a [`compute::ComputeBackend`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glam::Vec3;
//! use physics::{ChainConfig, JiggleWorld, Pose, Skeleton};
//!
//! let mut skel = Skeleton::new();
//! let hips = skel.add_joint(None, "hips", Pose::IDENTITY);
//! let tail = skel.add_joint(Some(hips), "tail", Pose::IDENTITY);
//! skel.add_joint(Some(tail), "tail_tip", Pose::from_position(Vec3::NEG_Y));
//!
//! let mut world = JiggleWorld::new();
//! world.attach_chain(&skel, &ChainConfig::new(tail).with_gravity(Vec3::NEG_Y * 9.8))?;
//! world.step(&mut skel, 1.0 / 60.0)?;
//! ```

pub mod builder;
pub mod collision;
pub mod curve;
pub mod error;
pub mod host;
pub mod registry;
pub mod simulation;
pub mod steps;
pub mod transform;
pub mod types;

pub use builder::{build_chain, BuiltChain, ChainConfig, CoefficientCurves};
pub use collision::{Axis, Bound, ColliderInfo, ColliderSet, ResolvedCollider};
pub use curve::Curve;
pub use error::{BuildError, PhysicsError};
pub use host::{JointTree, Skeleton, TransformAccess, TransformHandle, TransformWrite};
pub use registry::BatchRegistry;
pub use simulation::{FrameStats, JiggleWorld};
pub use transform::Pose;
pub use types::{
    Coefficients, ColliderId, HeadInfo, InstanceId, Particle, DEFAULT_PARTICLE_CAPACITY,
    DEFAULT_UPDATE_RATE,
};
