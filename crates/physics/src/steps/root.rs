use glam::Vec3;

use crate::transform::Pose;
use crate::types::HeadInfo;

/// Records the anchor's pose for this frame and how far it moved since the
/// last one. A missing anchor keeps the previous pose and reports no motion.
pub fn capture_root(head: &mut HeadInfo, anchor: Option<Pose>) {
    let Some(pose) = anchor else {
        head.object_move = Vec3::ZERO;
        return;
    };
    head.object_move = if head.reset_pending {
        Vec3::ZERO
    } else {
        pose.position - head.prev_root_position
    };
    head.prev_root_position = pose.position;
    head.root_position = pose.position;
    head.root_rotation = pose.rotation;
    head.root_scale = pose.scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TransformHandle;
    use crate::types::InstanceId;

    #[test]
    fn motion_is_measured_between_frames() {
        let mut head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        head.reset_pending = false;

        capture_root(&mut head, Some(Pose::from_position(Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(head.object_move, Vec3::new(1.0, 0.0, 0.0));
        capture_root(&mut head, Some(Pose::from_position(Vec3::new(1.5, 0.0, 0.0))));
        assert_eq!(head.object_move, Vec3::new(0.5, 0.0, 0.0));

        capture_root(&mut head, None);
        assert_eq!(head.object_move, Vec3::ZERO);
        assert_eq!(head.root_position, Vec3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn reset_reports_no_motion() {
        let mut head = HeadInfo::new(InstanceId(0), TransformHandle(0), Pose::IDENTITY);
        capture_root(&mut head, Some(Pose::from_position(Vec3::new(9.0, 0.0, 0.0))));
        assert_eq!(head.object_move, Vec3::ZERO);
        assert_eq!(head.prev_root_position, Vec3::new(9.0, 0.0, 0.0));
    }
}
