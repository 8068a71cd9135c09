//! # Collider Geometry
//!
//! Analytic projection of a particle (point plus radius) against implicit
//! sphere and capsule surfaces. Every routine mutates the position in place,
//! returns whether it applied a correction, and never produces NaN.

mod capsule;
mod collider;
mod sphere;

pub use capsule::{keep_inside_capsule, push_outside_capsule};
pub use collider::{Axis, Bound, ColliderInfo, ColliderSet, ResolvedCollider};
pub use sphere::{keep_inside_sphere, push_outside_sphere, FALLBACK_NORMAL};
