//! Pose utilities for joints, anchors and colliders.
//!
//! A [`Pose`] is position + rotation + scale, applied scale first, then
//! rotation, then translation, matching the host's transform hierarchy.

use glam::{Quat, Vec3};

/// Squared length under which a direction is treated as degenerate.
pub const DIRECTION_EPSILON_SQ: f32 = 1e-12;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation, scale: Vec3::ONE }
    }

    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (point * self.scale)
    }

    /// Maps a world point into this pose's local space. Zero scale axes are
    /// left unscaled instead of producing infinities.
    #[must_use]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (point - self.position);
        local / safe_scale(self.scale)
    }

    /// World pose of a child whose local pose is `local`.
    #[must_use]
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: (self.rotation * local.rotation).normalize(),
            scale: self.scale * local.scale,
        }
    }

    /// Local pose that reproduces `world` under this parent.
    #[must_use]
    pub fn relative(&self, world: &Pose) -> Pose {
        Pose {
            position: self.inverse_transform_point(world.position),
            rotation: (self.rotation.inverse() * world.rotation).normalize(),
            scale: world.scale / safe_scale(self.scale),
        }
    }

    /// Largest absolute scale component, used to scale radii.
    #[must_use]
    pub fn max_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }
}

fn safe_scale(scale: Vec3) -> Vec3 {
    Vec3::new(
        if scale.x == 0.0 { 1.0 } else { scale.x },
        if scale.y == 0.0 { 1.0 } else { scale.y },
        if scale.z == 0.0 { 1.0 } else { scale.z },
    )
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Returns `None` when either vector is too short to define a direction.
#[must_use]
pub fn from_to_rotation(from: Vec3, to: Vec3) -> Option<Quat> {
    if from.length_squared() <= DIRECTION_EPSILON_SQ || to.length_squared() <= DIRECTION_EPSILON_SQ
    {
        return None;
    }
    Some(Quat::from_rotation_arc(from.normalize(), to.normalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn max_scale_ignores_sign() {
        let pose = Pose::IDENTITY.with_scale(Vec3::new(1.0, -3.0, 2.0));
        assert_eq!(pose.max_scale(), 3.0);
        assert_eq!(Pose::IDENTITY.max_scale(), 1.0);
    }

    #[test]
    fn zero_scale_axis_stays_finite() {
        let pose = Pose::from_position(Vec3::X).with_scale(Vec3::new(0.0, 2.0, 1.0));
        let local = pose.inverse_transform_point(Vec3::new(2.0, 2.0, 0.0));
        assert!(local.is_finite());
        assert!(approx(local, Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn compose_then_relative_round_trips() {
        let parent = Pose::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        )
        .with_scale(Vec3::splat(2.0));
        let local = Pose::from_position(Vec3::new(0.0, 1.0, 0.0));

        let world = parent.compose(&local);
        // +Y rotated a quarter turn about Z points along -X, doubled by scale.
        assert!(approx(world.position, Vec3::new(-1.0, 0.0, 0.0)));

        let back = parent.relative(&world);
        assert!(approx(back.position, local.position));
    }

    #[test]
    fn from_to_rejects_zero_vectors() {
        assert!(from_to_rotation(Vec3::ZERO, Vec3::X).is_none());
        assert!(from_to_rotation(Vec3::Y, Vec3::ZERO).is_none());

        let q = from_to_rotation(Vec3::X, Vec3::Y).unwrap();
        assert!(approx(q * Vec3::X, Vec3::Y));
    }
}
