use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::host::TransformHandle;
use crate::transform::Pose;

/// Particle slots reserved per instance when no capacity is given.
pub const DEFAULT_PARTICLE_CAPACITY: usize = 32;

/// Default `update_rate`, in simulated steps per second.
pub const DEFAULT_UPDATE_RATE: f32 = 60.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// Tunable physical response of a particle.
///
/// All values except `radius` live in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Coefficients {
    /// Fraction of velocity removed every step.
    pub damping: f32,
    /// Pull toward the rest position per step.
    pub elasticity: f32,
    /// Limit on deviation from the rest position.
    pub stiffness: f32,
    /// How much of the anchor's movement is carried along.
    pub inertia: f32,
    /// Extra damping while touching a collider.
    pub friction: f32,
    /// Collision radius.
    pub radius: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            damping: 0.1,
            elasticity: 0.1,
            stiffness: 0.1,
            inertia: 0.0,
            friction: 0.0,
            radius: 0.0,
        }
    }
}

impl Coefficients {
    /// Clamps every value to its valid range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            damping: self.damping.clamp(0.0, 1.0),
            elasticity: self.elasticity.clamp(0.0, 1.0),
            stiffness: self.stiffness.clamp(0.0, 1.0),
            inertia: self.inertia.clamp(0.0, 1.0),
            friction: self.friction.clamp(0.0, 1.0),
            radius: self.radius.max(0.0),
        }
    }

    /// All response terms zeroed; the chain only keeps its lengths.
    #[must_use]
    pub const fn limp() -> Self {
        Self {
            damping: 0.0,
            elasticity: 0.0,
            stiffness: 0.0,
            inertia: 0.0,
            friction: 0.0,
            radius: 0.0,
        }
    }
}

/// Per-instance record shared by all particles of a chain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeadInfo {
    pub instance: InstanceId,
    /// Host transform the chain root hangs from.
    pub anchor: TransformHandle,
    pub root_position: Vec3,
    pub root_rotation: Quat,
    pub root_scale: Vec3,
    pub prev_root_position: Vec3,
    /// Anchor displacement since the previous frame.
    pub object_move: Vec3,
    /// Acceleration in world units per second squared.
    pub gravity: Vec3,
    pub force: Vec3,
    pub weight: f32,
    pub update_rate: f32,
    pub particle_count: u32,
    /// First particle slot of this instance in the flat buffers.
    pub offset: u32,
    /// Snap every particle to its nominal pose on the next frame.
    pub reset_pending: bool,
}

impl HeadInfo {
    #[must_use]
    pub fn new(instance: InstanceId, anchor: TransformHandle, anchor_pose: Pose) -> Self {
        Self {
            instance,
            anchor,
            root_position: anchor_pose.position,
            root_rotation: anchor_pose.rotation,
            root_scale: anchor_pose.scale,
            prev_root_position: anchor_pose.position,
            object_move: Vec3::ZERO,
            gravity: Vec3::ZERO,
            force: Vec3::ZERO,
            weight: 1.0,
            update_rate: DEFAULT_UPDATE_RATE,
            particle_count: 0,
            offset: 0,
            reset_pending: true,
        }
    }

    #[must_use]
    pub fn anchor_pose(&self) -> Pose {
        Pose {
            position: self.root_position,
            rotation: self.root_rotation,
            scale: self.root_scale,
        }
    }

    /// Uniform scale used for particle radii and forces. Same rule as
    /// collider radii: the largest absolute scale component.
    #[must_use]
    pub fn object_scale(&self) -> f32 {
        self.anchor_pose().max_scale()
    }

    /// Step scale for the elasticity term: `dt * update_rate`, or `1` when no
    /// rate is configured.
    #[must_use]
    pub fn time_var(&self, dt: f32) -> f32 {
        if self.update_rate > 0.0 {
            dt * self.update_rate
        } else {
            1.0
        }
    }
}

/// One simulated point of a chain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    /// Index within the instance.
    pub index: u32,
    /// Parent index within the instance, `-1` for the chain root.
    pub parent: i32,
    pub child_count: u32,
    /// Synthetic tip with no host transform behind it.
    pub is_end: bool,

    pub local_position: Vec3,
    pub local_rotation: Quat,
    /// Accumulated joint scale between the chain root and this particle's parent.
    pub parent_scale: Vec3,
    /// Path length from the chain root at rest.
    pub bone_length: f32,

    pub damping: f32,
    pub elasticity: f32,
    pub stiffness: f32,
    pub inertia: f32,
    pub friction: f32,
    pub radius: f32,

    pub nominal_position: Vec3,
    pub nominal_rotation: Quat,
    pub position: Vec3,
    pub prev_position: Vec3,
    pub rotation: Quat,
    pub collided: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            index: 0,
            parent: -1,
            child_count: 0,
            is_end: false,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            parent_scale: Vec3::ONE,
            bone_length: 0.0,
            damping: 0.0,
            elasticity: 0.0,
            stiffness: 0.0,
            inertia: 0.0,
            friction: 0.0,
            radius: 0.0,
            nominal_position: Vec3::ZERO,
            nominal_rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            prev_position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            collided: false,
        }
    }
}

impl Particle {
    #[must_use]
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    /// Rest offset from the parent, in the parent's rotated frame.
    #[must_use]
    pub fn scaled_offset(&self, root_scale: Vec3) -> Vec3 {
        self.local_position * self.parent_scale * root_scale
    }

    #[must_use]
    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            damping: self.damping,
            elasticity: self.elasticity,
            stiffness: self.stiffness,
            inertia: self.inertia,
            friction: self.friction,
            radius: self.radius,
        }
    }

    pub fn set_coefficients(&mut self, c: Coefficients) {
        self.damping = c.damping;
        self.elasticity = c.elasticity;
        self.stiffness = c.stiffness;
        self.inertia = c.inertia;
        self.friction = c.friction;
        self.radius = c.radius;
    }

    /// Places the particle on its nominal pose with no velocity.
    pub fn snap_to_nominal(&mut self) {
        self.position = self.nominal_position;
        self.prev_position = self.nominal_position;
        self.rotation = self.nominal_rotation;
        self.collided = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_clamp_to_range() {
        let c = Coefficients {
            damping: 1.5,
            elasticity: -0.2,
            stiffness: 0.5,
            inertia: 2.0,
            friction: 0.3,
            radius: -1.0,
        }
        .clamped();
        assert_eq!(c.damping, 1.0);
        assert_eq!(c.elasticity, 0.0);
        assert_eq!(c.stiffness, 0.5);
        assert_eq!(c.inertia, 1.0);
        assert_eq!(c.radius, 0.0);
    }

    #[test]
    fn time_var_without_rate_is_one() {
        let mut head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        assert!((head.time_var(1.0 / 60.0) - 1.0).abs() < 1e-6);
        head.update_rate = 0.0;
        assert_eq!(head.time_var(0.5), 1.0);
        head.update_rate = 60.0;
        assert_eq!(head.time_var(0.0), 0.0);
    }

    #[test]
    fn object_scale_matches_collider_radius_rule() {
        let pose = Pose::IDENTITY.with_scale(Vec3::new(0.5, -2.0, 1.0));
        let head = HeadInfo::new(InstanceId(0), TransformHandle(0), pose);
        assert_eq!(head.object_scale(), 2.0);

        let collider = crate::ColliderInfo::sphere(1.0).with_pose(pose);
        match collider.resolve() {
            crate::ResolvedCollider::Sphere { radius, .. } => {
                assert_eq!(radius, head.object_scale());
            }
            other => panic!("expected sphere, got {other:?}"),
        }
    }

    #[test]
    fn root_has_no_parent_index() {
        let p = Particle::default();
        assert!(p.is_root());
        assert_eq!(p.parent_index(), None);
        let child = Particle { parent: 3, ..Particle::default() };
        assert_eq!(child.parent_index(), Some(3));
    }
}
