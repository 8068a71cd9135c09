//! Point-versus-capsule projection
//!
//! The capsule is the segment `c0..c1` swept by `radius`. Points projecting
//! before `c0` or past `c1` are handed to the sphere routines unchanged, so
//! both caps behave exactly like spheres.

use glam::Vec3;

use super::sphere::{keep_inside_sphere, push_outside_sphere};

/// Pushes `position` out of the capsule inflated by `particle_radius`.
pub fn push_outside_capsule(
    position: &mut Vec3,
    particle_radius: f32,
    c0: Vec3,
    c1: Vec3,
    radius: f32,
) -> bool {
    let axis = c1 - c0;
    let delta = *position - c0;
    let t = delta.dot(axis);

    if t <= 0.0 {
        return push_outside_sphere(position, particle_radius, c0, radius);
    }
    let axis_len_sq = axis.length_squared();
    if t >= axis_len_sq {
        return push_outside_sphere(position, particle_radius, c1, radius);
    }

    let r = radius + particle_radius;
    let radial = delta - axis * (t / axis_len_sq);
    let dist_sq = radial.length_squared();
    if dist_sq <= 0.0 || dist_sq >= r * r {
        return false;
    }
    let dist = dist_sq.sqrt();
    *position += radial * ((r - dist) / dist);
    true
}

/// Pulls `position` back inside the capsule shrunk by `particle_radius`.
pub fn keep_inside_capsule(
    position: &mut Vec3,
    particle_radius: f32,
    c0: Vec3,
    c1: Vec3,
    radius: f32,
) -> bool {
    let axis = c1 - c0;
    let delta = *position - c0;
    let t = delta.dot(axis);

    if t <= 0.0 {
        return keep_inside_sphere(position, particle_radius, c0, radius);
    }
    let axis_len_sq = axis.length_squared();
    if t >= axis_len_sq {
        return keep_inside_sphere(position, particle_radius, c1, radius);
    }

    let r = (radius - particle_radius).max(0.0);
    let radial = delta - axis * (t / axis_len_sq);
    let dist_sq = radial.length_squared();
    if dist_sq <= r * r {
        return false;
    }
    let dist = dist_sq.sqrt();
    *position += radial * ((r - dist) / dist);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const C0: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const C1: Vec3 = Vec3::new(0.0, -1.0, 0.0);

    #[test]
    fn cylinder_region_pushes_radially() {
        let mut p = Vec3::new(0.2, 0.3, 0.0);
        assert!(push_outside_capsule(&mut p, 0.0, C0, C1, 0.5));
        assert!((p - Vec3::new(0.5, 0.3, 0.0)).length() < 1e-6);
    }

    #[test]
    fn point_on_axis_is_left_alone() {
        let mut p = Vec3::new(0.0, 0.3, 0.0);
        assert!(!push_outside_capsule(&mut p, 0.0, C0, C1, 0.5));
        assert_eq!(p, Vec3::new(0.0, 0.3, 0.0));
    }

    #[test]
    fn endpoint_projection_matches_sphere_exactly() {
        // t == 0: projects exactly onto c0.
        let start = Vec3::new(0.3, 1.0, 0.1);
        let mut via_capsule = start;
        let mut via_sphere = start;
        let a = push_outside_capsule(&mut via_capsule, 0.05, C0, C1, 0.5);
        let b = push_outside_sphere(&mut via_sphere, 0.05, C0, 0.5);
        assert_eq!(a, b);
        assert_eq!(via_capsule.to_array(), via_sphere.to_array());

        // t == |axis|^2: projects exactly onto c1.
        let start = Vec3::new(-0.2, -1.0, 0.2);
        let mut via_capsule = start;
        let mut via_sphere = start;
        let a = push_outside_capsule(&mut via_capsule, 0.05, C0, C1, 0.5);
        let b = push_outside_sphere(&mut via_sphere, 0.05, C1, 0.5);
        assert_eq!(a, b);
        assert_eq!(via_capsule.to_array(), via_sphere.to_array());
    }

    #[test]
    fn zero_length_axis_is_a_sphere() {
        let mut p = Vec3::new(0.1, 0.0, 0.0);
        assert!(push_outside_capsule(&mut p, 0.0, Vec3::ZERO, Vec3::ZERO, 1.0));
        assert!((p.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn inside_capsule_confines_radially() {
        let mut p = Vec3::new(2.0, 0.0, 0.0);
        assert!(keep_inside_capsule(&mut p, 0.1, C0, C1, 0.6));
        assert!((p - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);

        let mut q = Vec3::new(0.1, 0.5, 0.0);
        assert!(!keep_inside_capsule(&mut q, 0.1, C0, C1, 0.6));
    }
}
