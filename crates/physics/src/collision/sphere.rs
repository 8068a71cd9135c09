//! Point-versus-sphere projection

use glam::Vec3;

/// Direction used when a particle sits exactly on a sphere's center.
pub const FALLBACK_NORMAL: Vec3 = Vec3::Y;

/// Pushes `position` out of the sphere `(center, radius)` inflated by
/// `particle_radius`. Returns whether the position was corrected.
pub fn push_outside_sphere(
    position: &mut Vec3,
    particle_radius: f32,
    center: Vec3,
    radius: f32,
) -> bool {
    let r = radius + particle_radius;
    let delta = *position - center;
    let dist_sq = delta.length_squared();

    if dist_sq >= r * r {
        return false;
    }
    if dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        *position = center + delta * (r / dist);
    } else {
        *position = center + FALLBACK_NORMAL * r;
    }
    true
}

/// Pulls `position` back inside the sphere `(center, radius)` shrunk by
/// `particle_radius`. Returns whether the position was corrected.
pub fn keep_inside_sphere(
    position: &mut Vec3,
    particle_radius: f32,
    center: Vec3,
    radius: f32,
) -> bool {
    let r = (radius - particle_radius).max(0.0);
    let delta = *position - center;
    let dist_sq = delta.length_squared();

    if dist_sq <= r * r {
        return false;
    }
    // dist_sq > r^2 >= 0 here, so the division is safe.
    let dist = dist_sq.sqrt();
    *position = center + delta * (r / dist);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_pushes_to_surface() {
        let mut p = Vec3::new(0.5, 0.0, 0.0);
        assert!(push_outside_sphere(&mut p, 0.1, Vec3::ZERO, 1.0));
        assert!((p.length() - 1.1).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn outside_leaves_clear_points() {
        let mut p = Vec3::new(2.0, 0.0, 0.0);
        assert!(!push_outside_sphere(&mut p, 0.1, Vec3::ZERO, 1.0));
        assert_eq!(p, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_center_uses_fallback_normal() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let mut p = center;
        assert!(push_outside_sphere(&mut p, 0.25, center, 0.75));
        assert!(p.is_finite());
        assert!(((p - center).length() - 1.0).abs() < 1e-6);
        assert!((p - (center + Vec3::Y)).length() < 1e-6);
    }

    #[test]
    fn inside_confines_to_shrunk_sphere() {
        let mut p = Vec3::new(0.0, 0.0, 3.0);
        assert!(keep_inside_sphere(&mut p, 0.5, Vec3::ZERO, 2.0));
        assert!((p - Vec3::new(0.0, 0.0, 1.5)).length() < 1e-6);

        let mut q = Vec3::ZERO;
        assert!(!keep_inside_sphere(&mut q, 0.5, Vec3::ZERO, 2.0));
        assert_eq!(q, Vec3::ZERO);
    }
}
