use crate::host::{TransformHandle, TransformWrite};
use crate::types::Particle;

/// Writes each bound particle's pose to its host transform, in index order.
/// Synthetic tips have no binding and are skipped.
pub fn write_back<W: TransformWrite + ?Sized>(
    host: &mut W,
    particles: &[Particle],
    bindings: &[Option<TransformHandle>],
) -> usize {
    let mut written = 0;
    for (particle, binding) in particles.iter().zip(bindings) {
        if let Some(handle) = binding {
            host.set_world_pose(*handle, particle.position, particle.rotation);
            written += 1;
        }
    }
    written
}
