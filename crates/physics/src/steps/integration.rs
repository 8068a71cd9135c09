use crate::types::{HeadInfo, Particle};

/// Verlet step: carries velocity, inertia from anchor motion, gravity and
/// external force. The root is pinned to its nominal position.
pub fn integrate(head: &HeadInfo, particles: &mut [Particle], dt: f32) {
    if head.reset_pending || head.weight <= 0.0 {
        particles.iter_mut().for_each(Particle::snap_to_nominal);
        return;
    }

    let force_step = (head.gravity + head.force) * (head.object_scale() * dt * dt);
    for p in particles.iter_mut() {
        if p.is_root() {
            p.prev_position = p.position;
            p.position = p.nominal_position;
            continue;
        }
        let velocity = p.position - p.prev_position;
        let carried = head.object_move * p.inertia;
        p.prev_position = p.position + carried;

        let mut damping = p.damping;
        if p.collided {
            damping = (damping + p.friction).min(1.0);
            p.collided = false;
        }
        p.position += velocity * (1.0 - damping) + force_step + carried;
    }
}
