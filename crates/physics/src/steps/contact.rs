use crate::collision::ResolvedCollider;
use crate::transform::from_to_rotation;
use crate::types::{HeadInfo, Particle};

/// Projects every non-root particle out of (or into) its chain's colliders
/// in list order, then derives final orientations. Returns the number of
/// particles that touched a collider.
pub fn resolve_collisions(
    head: &mut HeadInfo,
    particles: &mut [Particle],
    colliders: &[Option<ResolvedCollider>],
    order: &[usize],
) -> u32 {
    let mut touched = 0;
    if head.weight > 0.0 && !order.is_empty() {
        let scale = head.object_scale();
        for p in particles.iter_mut().filter(|p| !p.is_root()) {
            let radius = p.radius * scale;
            for collider in order.iter().filter_map(|&c| colliders.get(c).copied().flatten()) {
                if collider.collide(&mut p.position, radius) {
                    p.collided = true;
                }
            }
            if p.collided {
                touched += 1;
            }
        }
    }
    update_orientations(head, particles);
    head.reset_pending = false;
    touched
}

/// Rotates every single-child parent so its bone points at the child's
/// simulated position. Everything else keeps its nominal rotation.
pub fn update_orientations(head: &HeadInfo, particles: &mut [Particle]) {
    for p in particles.iter_mut() {
        p.rotation = p.nominal_rotation;
    }
    for i in 0..particles.len() {
        let Some(pi) = particles[i].parent_index() else {
            continue;
        };
        if particles[pi].child_count > 1 {
            continue;
        }
        let child = particles[i];
        let parent = &mut particles[pi];
        let rest_dir = parent.nominal_rotation * child.scaled_offset(head.root_scale);
        let sim_dir = child.position - parent.position;
        if let Some(turn) = from_to_rotation(rest_dir, sim_dir) {
            parent.rotation = (turn * parent.nominal_rotation).normalize();
        }
    }
}
