//! # Host transform access
//!
//! The simulation never owns the scene graph. It reads joint poses through
//! [`JointTree`] / [`TransformAccess`] and writes results through
//! [`TransformWrite`]. [`Skeleton`] is a small arena-backed implementation
//! used by the scene loader, the runtime and the tests.

use glam::{Quat, Vec3};

use crate::transform::Pose;

/// Opaque reference to a host transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformHandle(pub u32);

impl TransformHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Read-only world pose lookup, shared across workers during a frame.
pub trait TransformAccess: Sync {
    /// Current world pose, or `None` if the handle no longer resolves.
    fn world_pose(&self, handle: TransformHandle) -> Option<Pose>;
}

/// Hierarchy queries needed to build a chain.
pub trait JointTree: TransformAccess {
    fn parent(&self, joint: TransformHandle) -> Option<TransformHandle>;

    /// Children in the host's declared order.
    fn children(&self, joint: TransformHandle) -> &[TransformHandle];

    fn local_pose(&self, joint: TransformHandle) -> Option<Pose>;
}

/// Sink for simulated poses.
pub trait TransformWrite {
    fn set_world_pose(&mut self, handle: TransformHandle, position: Vec3, rotation: Quat);
}

#[derive(Clone, Debug)]
struct Joint {
    name: String,
    parent: Option<TransformHandle>,
    children: Vec<TransformHandle>,
    local: Pose,
    world: Pose,
}

/// Arena of named joints with cached world poses.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Adds a joint under `parent` (or at the top level when `None`).
    ///
    /// A parent handle that does not resolve is treated as `None`.
    pub fn add_joint(
        &mut self,
        parent: Option<TransformHandle>,
        name: impl Into<String>,
        local: Pose,
    ) -> TransformHandle {
        let handle = TransformHandle(self.joints.len() as u32);
        let parent = parent.filter(|p| p.index() < self.joints.len());
        let world = match parent {
            Some(p) => self.joints[p.index()].world.compose(&local),
            None => local,
        };
        if let Some(p) = parent {
            self.joints[p.index()].children.push(handle);
        }
        self.joints.push(Joint {
            name: name.into(),
            parent,
            children: Vec::new(),
            local,
            world,
        });
        handle
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<TransformHandle> {
        self.joints
            .iter()
            .position(|j| j.name == name)
            .map(|i| TransformHandle(i as u32))
    }

    #[must_use]
    pub fn name(&self, joint: TransformHandle) -> Option<&str> {
        self.joints.get(joint.index()).map(|j| j.name.as_str())
    }

    /// Replaces a joint's local pose and refreshes its subtree.
    pub fn set_local_pose(&mut self, joint: TransformHandle, local: Pose) {
        let Some(node) = self.joints.get_mut(joint.index()) else {
            return;
        };
        node.local = local;
        self.refresh(joint);
    }

    fn refresh(&mut self, joint: TransformHandle) {
        let mut stack = vec![joint];
        while let Some(current) = stack.pop() {
            let idx = current.index();
            let world = match self.joints[idx].parent {
                Some(p) => self.joints[p.index()].world.compose(&self.joints[idx].local),
                None => self.joints[idx].local,
            };
            self.joints[idx].world = world;
            stack.extend(self.joints[idx].children.iter().copied());
        }
    }
}

impl TransformAccess for Skeleton {
    fn world_pose(&self, handle: TransformHandle) -> Option<Pose> {
        self.joints.get(handle.index()).map(|j| j.world)
    }
}

impl JointTree for Skeleton {
    fn parent(&self, joint: TransformHandle) -> Option<TransformHandle> {
        self.joints.get(joint.index()).and_then(|j| j.parent)
    }

    fn children(&self, joint: TransformHandle) -> &[TransformHandle] {
        self.joints
            .get(joint.index())
            .map(|j| j.children.as_slice())
            .unwrap_or_default()
    }

    fn local_pose(&self, joint: TransformHandle) -> Option<Pose> {
        self.joints.get(joint.index()).map(|j| j.local)
    }
}

impl TransformWrite for Skeleton {
    /// Sets the world position and rotation, keeping the joint's scale, by
    /// rewriting its local pose relative to the parent.
    fn set_world_pose(&mut self, handle: TransformHandle, position: Vec3, rotation: Quat) {
        let Some(joint) = self.joints.get(handle.index()) else {
            return;
        };
        let target = Pose {
            position,
            rotation,
            scale: joint.world.scale,
        };
        let local = match joint.parent {
            Some(p) => {
                let mut local = self.joints[p.index()].world.relative(&target);
                local.scale = joint.local.scale;
                local
            }
            None => Pose { scale: joint.local.scale, ..target },
        };
        self.set_local_pose(handle, local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_poses_follow_the_hierarchy() {
        let mut skel = Skeleton::new();
        let root = skel.add_joint(None, "root", Pose::from_position(Vec3::new(0.0, 2.0, 0.0)));
        let a = skel.add_joint(Some(root), "a", Pose::from_position(Vec3::new(0.0, -1.0, 0.0)));

        let world = skel.world_pose(a).unwrap();
        assert!((world.position - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);

        skel.set_local_pose(root, Pose::from_position(Vec3::new(5.0, 2.0, 0.0)));
        let world = skel.world_pose(a).unwrap();
        assert!((world.position - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn children_keep_declaration_order() {
        let mut skel = Skeleton::new();
        let root = skel.add_joint(None, "root", Pose::IDENTITY);
        let b = skel.add_joint(Some(root), "b", Pose::IDENTITY);
        let c = skel.add_joint(Some(root), "c", Pose::IDENTITY);
        assert_eq!(skel.children(root), &[b, c]);
        assert_eq!(skel.parent(c), Some(root));
        assert_eq!(skel.find("c"), Some(c));
        assert!(skel.children(TransformHandle(99)).is_empty());
    }

    #[test]
    fn set_world_pose_round_trips() {
        let mut skel = Skeleton::new();
        let root = skel.add_joint(
            None,
            "root",
            Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(0.7)),
        );
        let a = skel.add_joint(Some(root), "a", Pose::from_position(Vec3::X));

        let target = Vec3::new(3.0, -2.0, 0.5);
        let rot = Quat::from_rotation_x(0.3);
        skel.set_world_pose(a, target, rot);

        let world = skel.world_pose(a).unwrap();
        assert!((world.position - target).length() < 1e-5);
        assert!(world.rotation.angle_between(rot) < 1e-4);
    }
}
