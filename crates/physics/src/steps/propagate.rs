use crate::types::{HeadInfo, Particle};

/// Recomputes every particle's nominal (animated, unsimulated) pose from its
/// parent's. Runs in index order; pre-order guarantees each parent is
/// already up to date.
pub fn propagate_rest(head: &HeadInfo, particles: &mut [Particle]) {
    let anchor = head.anchor_pose();
    for i in 0..particles.len() {
        let (parent_position, parent_rotation) = match particles[i].parent_index() {
            Some(p) => (particles[p].nominal_position, particles[p].nominal_rotation),
            None => (anchor.position, anchor.rotation),
        };
        let particle = &mut particles[i];
        let offset = particle.scaled_offset(head.root_scale);
        particle.nominal_position = parent_position + parent_rotation * offset;
        particle.nominal_rotation = (parent_rotation * particle.local_rotation).normalize();
    }
}
