use crate::types::{HeadInfo, Particle};

/// Pulls each particle toward its rest position (elasticity), bounds how
/// far it may stray (stiffness) and restores its rest distance to the
/// parent. One pass in index order; parents are settled before children.
pub fn solve_constraints(head: &HeadInfo, particles: &mut [Particle], time_var: f32) {
    if head.weight <= 0.0 {
        return;
    }
    for i in 0..particles.len() {
        let Some(pi) = particles[i].parent_index() else {
            continue;
        };
        let parent_position = particles[pi].position;
        let parent_nominal = particles[pi].nominal_position;
        let parent_rotation = particles[pi].nominal_rotation;
        let p = &mut particles[i];

        let rest_len = (parent_nominal - p.nominal_position).length();
        let stiffness = 1.0 + (p.stiffness - 1.0) * head.weight;

        if stiffness > 0.0 || p.elasticity > 0.0 {
            let rest_position = parent_position + parent_rotation * p.scaled_offset(head.root_scale);
            let pull = rest_position - p.position;
            p.position += pull * (p.elasticity * time_var);

            if stiffness > 0.0 {
                let stray = rest_position - p.position;
                let len = stray.length();
                let max_len = rest_len * (1.0 - stiffness) * 2.0;
                if len > max_len && len > 0.0 {
                    p.position += stray * ((len - max_len) / len);
                }
            }
        }

        let to_parent = parent_position - p.position;
        let len = to_parent.length();
        if len > 0.0 {
            p.position += to_parent * ((len - rest_len) / len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TransformHandle;
    use crate::transform::Pose;
    use crate::types::InstanceId;
    use glam::Vec3;

    fn pair(child_position: Vec3, stiffness: f32, elasticity: f32) -> Vec<Particle> {
        vec![
            Particle::default(),
            Particle {
                parent: 0,
                local_position: Vec3::new(0.0, -1.0, 0.0),
                nominal_position: Vec3::new(0.0, -1.0, 0.0),
                position: child_position,
                stiffness,
                elasticity,
                ..Particle::default()
            },
        ]
    }

    #[test]
    fn length_is_restored() {
        let mut head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        head.weight = 1.0;
        let mut particles = pair(Vec3::new(3.0, 0.0, 0.0), 0.0, 0.0);
        solve_constraints(&head, &mut particles, 1.0);
        assert!((particles[1].position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn full_stiffness_snaps_to_rest() {
        let head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        let mut particles = pair(Vec3::new(0.7, -0.2, 0.3), 1.0, 0.0);
        solve_constraints(&head, &mut particles, 1.0);
        assert!((particles[1].position - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn coincident_particles_are_left_alone() {
        let head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        let mut particles = pair(Vec3::ZERO, 0.0, 0.0);
        particles[1].nominal_position = Vec3::ZERO;
        particles[1].local_position = Vec3::ZERO;
        solve_constraints(&head, &mut particles, 1.0);
        assert!(particles[1].position.is_finite());
        assert_eq!(particles[1].position, Vec3::ZERO);
    }
}
