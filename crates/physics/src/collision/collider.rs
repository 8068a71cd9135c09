//! Collider records and their per-frame world resolution.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::capsule::{keep_inside_capsule, push_outside_capsule};
use super::sphere::{keep_inside_sphere, push_outside_sphere};
use crate::host::{TransformAccess, TransformHandle};
use crate::transform::Pose;
use crate::types::ColliderId;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    #[must_use]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Which side of the surface particles are kept on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Bound {
    #[default]
    Outside,
    Inside,
}

/// Sphere (`height <= 0`) or capsule collider in its transform's local space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColliderInfo {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
    pub axis: Axis,
    pub bound: Bound,
    /// Applies to every chain, after its own list.
    pub global: bool,
    /// World pose, refreshed from the host each frame.
    pub pose: Pose,
}

impl Default for ColliderInfo {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 0.5,
            height: 0.0,
            axis: Axis::Y,
            bound: Bound::Outside,
            global: false,
            pose: Pose::IDENTITY,
        }
    }
}

impl ColliderInfo {
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self { radius, ..Self::default() }
    }

    #[must_use]
    pub fn capsule(radius: f32, height: f32, axis: Axis) -> Self {
        Self { radius, height, axis, ..Self::default() }
    }

    #[must_use]
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    #[must_use]
    pub fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = bound;
        self
    }

    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    #[must_use]
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// World-space shape for the current pose.
    #[must_use]
    pub fn resolve(&self) -> ResolvedCollider {
        let radius = self.radius * self.pose.max_scale();
        let half = self.height * 0.5 - self.radius;
        if self.height <= 0.0 || half <= 0.0 {
            return ResolvedCollider::Sphere {
                center: self.pose.transform_point(self.center),
                radius,
                bound: self.bound,
            };
        }
        let offset = self.axis.unit() * half;
        ResolvedCollider::Capsule {
            c0: self.pose.transform_point(self.center + offset),
            c1: self.pose.transform_point(self.center - offset),
            radius,
            bound: self.bound,
        }
    }
}

/// World-space collider ready for the collision pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResolvedCollider {
    Sphere { center: Vec3, radius: f32, bound: Bound },
    Capsule { c0: Vec3, c1: Vec3, radius: f32, bound: Bound },
}

impl ResolvedCollider {
    /// Projects `position` (a particle of `particle_radius`) to the legal
    /// side of this collider. Returns whether it moved.
    pub fn collide(&self, position: &mut Vec3, particle_radius: f32) -> bool {
        match *self {
            ResolvedCollider::Sphere { center, radius, bound: Bound::Outside } => {
                push_outside_sphere(position, particle_radius, center, radius)
            }
            ResolvedCollider::Sphere { center, radius, bound: Bound::Inside } => {
                keep_inside_sphere(position, particle_radius, center, radius)
            }
            ResolvedCollider::Capsule { c0, c1, radius, bound: Bound::Outside } => {
                push_outside_capsule(position, particle_radius, c0, c1, radius)
            }
            ResolvedCollider::Capsule { c0, c1, radius, bound: Bound::Inside } => {
                keep_inside_capsule(position, particle_radius, c0, c1, radius)
            }
        }
    }
}

#[derive(Clone, Debug)]
struct ColliderEntry {
    info: ColliderInfo,
    transform: Option<TransformHandle>,
}

/// Owner of every collider record. Ids stay stable across removals.
#[derive(Clone, Debug, Default)]
pub struct ColliderSet {
    entries: Vec<Option<ColliderEntry>>,
    resolved: Vec<Option<ResolvedCollider>>,
}

impl ColliderSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collider that follows `transform` (or stays at
    /// `info.pose` when `None`).
    pub fn add(&mut self, info: ColliderInfo, transform: Option<TransformHandle>) -> ColliderId {
        let id = ColliderId(self.entries.len() as u32);
        self.resolved.push(Some(info.resolve()));
        self.entries.push(Some(ColliderEntry { info, transform }));
        id
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<ColliderInfo> {
        let slot = id.0 as usize;
        if let Some(r) = self.resolved.get_mut(slot) {
            *r = None;
        }
        self.entries.get_mut(slot)?.take().map(|e| e.info)
    }

    #[must_use]
    pub fn get(&self, id: ColliderId) -> Option<&ColliderInfo> {
        self.entries.get(id.0 as usize)?.as_ref().map(|e| &e.info)
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut ColliderInfo> {
        self.entries
            .get_mut(id.0 as usize)?
            .as_mut()
            .map(|e| &mut e.info)
    }

    #[must_use]
    pub fn contains(&self, id: ColliderId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolved shapes indexed by `ColliderId`; removed slots are `None`.
    #[must_use]
    pub fn resolved(&self) -> &[Option<ResolvedCollider>] {
        &self.resolved
    }

    /// Pulls fresh world poses from the host and re-resolves every shape.
    /// A transform that no longer resolves keeps its last pose.
    pub fn refresh<A: TransformAccess + ?Sized>(&mut self, host: &A) {
        for (entry, resolved) in self.entries.iter_mut().zip(self.resolved.iter_mut()) {
            let Some(entry) = entry else {
                continue;
            };
            if let Some(pose) = entry.transform.and_then(|t| host.world_pose(t)) {
                entry.info.pose = pose;
            }
            *resolved = Some(entry.info.resolve());
        }
    }

    /// Appends the effective collider order for one chain to `out`: its
    /// explicit list first, then every global collider it does not list.
    pub fn effective_order(&self, explicit: &[ColliderId], out: &mut Vec<usize>) {
        let start = out.len();
        for id in explicit {
            if self.contains(*id) {
                out.push(id.0 as usize);
            }
        }
        for (i, entry) in self.entries.iter().enumerate() {
            let is_global = entry.as_ref().is_some_and(|e| e.info.global);
            if is_global && !out[start..].contains(&i) {
                out.push(i);
            }
        }
    }
}
