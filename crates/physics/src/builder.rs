//! # Chain Builder
//!
//! Walks a host joint hierarchy once and flattens it into a pre-order
//! particle array. Index 0 is the chain root; every other particle's parent
//! index is smaller than its own. Synthetic tip particles are appended where
//! the chain needs a bone end that has no host transform behind it.

use std::collections::HashSet;

use glam::Vec3;

use crate::curve::Curve;
use crate::error::BuildError;
use crate::host::{JointTree, TransformHandle};
use crate::transform::Pose;
use crate::types::{Coefficients, ColliderId, HeadInfo, InstanceId, Particle, DEFAULT_UPDATE_RATE};

/// Optional depth profiles, one per coefficient.
#[derive(Clone, Debug, Default)]
pub struct CoefficientCurves {
    pub damping: Option<Curve>,
    pub elasticity: Option<Curve>,
    pub stiffness: Option<Curve>,
    pub inertia: Option<Curve>,
    pub friction: Option<Curve>,
    pub radius: Option<Curve>,
}

/// Everything needed to turn a joint subtree into a chain.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub root: TransformHandle,
    pub coefficients: Coefficients,
    pub curves: CoefficientCurves,
    /// Length of the synthetic tip as a multiple of the last bone.
    pub end_length: f32,
    /// Synthetic tip offset in the chain root's frame.
    pub end_offset: Vec3,
    pub gravity: Vec3,
    pub force: Vec3,
    pub weight: f32,
    pub update_rate: f32,
    /// Joints (and their subtrees) left out of the simulation.
    pub exclusions: Vec<TransformHandle>,
    pub colliders: Vec<ColliderId>,
}

impl ChainConfig {
    #[must_use]
    pub fn new(root: TransformHandle) -> Self {
        Self {
            root,
            coefficients: Coefficients::default(),
            curves: CoefficientCurves::default(),
            end_length: 0.0,
            end_offset: Vec3::ZERO,
            gravity: Vec3::ZERO,
            force: Vec3::ZERO,
            weight: 1.0,
            update_rate: DEFAULT_UPDATE_RATE,
            exclusions: Vec::new(),
            colliders: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_coefficients(mut self, coefficients: Coefficients) -> Self {
        self.coefficients = coefficients;
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_end_length(mut self, end_length: f32) -> Self {
        self.end_length = end_length;
        self
    }

    #[must_use]
    pub fn with_end_offset(mut self, end_offset: Vec3) -> Self {
        self.end_offset = end_offset;
        self
    }

    #[must_use]
    pub fn with_colliders(mut self, colliders: Vec<ColliderId>) -> Self {
        self.colliders = colliders;
        self
    }

    #[must_use]
    pub fn excluding(mut self, joint: TransformHandle) -> Self {
        self.exclusions.push(joint);
        self
    }

    fn has_end(&self) -> bool {
        self.end_length > 0.0 || self.end_offset != Vec3::ZERO
    }
}

/// A flattened chain, ready to be registered.
#[derive(Clone, Debug)]
pub struct BuiltChain {
    pub head: HeadInfo,
    pub particles: Vec<Particle>,
    /// Host transform per particle; `None` for synthetic tips.
    pub bindings: Vec<Option<TransformHandle>>,
    pub colliders: Vec<ColliderId>,
    /// Longest rest path from the root.
    pub total_length: f32,
}

/// Flattens the subtree under `config.root`.
///
/// # Errors
///
/// Fails if the root has no parent, a joint does not resolve, or the chain
/// needs more than `capacity` particles.
pub fn build_chain<T: JointTree + ?Sized>(
    tree: &T,
    config: &ChainConfig,
    capacity: usize,
) -> Result<BuiltChain, BuildError> {
    let root = config.root;
    let root_world = tree.world_pose(root).ok_or(BuildError::UnknownJoint(root))?;
    let anchor = tree.parent(root).ok_or(BuildError::RootWithoutParent(root))?;
    let anchor_pose = tree.world_pose(anchor).ok_or(BuildError::UnknownJoint(anchor))?;

    let mut walker = Walker {
        tree,
        config,
        root_world,
        excluded: config.exclusions.iter().copied().collect(),
        particles: Vec::new(),
        bindings: Vec::new(),
        local_scales: Vec::new(),
        world_positions: Vec::new(),
        total_length: 0.0,
    };
    walker.append(Some(root), -1, 0.0)?;

    let count = walker.particles.len();
    if count > capacity {
        return Err(BuildError::CapacityExceeded { count, capacity });
    }

    let Walker { mut particles, bindings, total_length, .. } = walker;

    for i in 0..particles.len() {
        if let Some(parent) = particles[i].parent_index() {
            particles[parent].child_count += 1;
        }
    }
    for p in &mut particles {
        let depth = if total_length > 0.0 { Some(p.bone_length / total_length) } else { None };
        p.set_coefficients(modulate(config.coefficients, &config.curves, depth));
    }

    let mut head = HeadInfo::new(InstanceId(u32::MAX), anchor, anchor_pose);
    head.gravity = config.gravity;
    head.force = config.force;
    head.weight = config.weight.clamp(0.0, 1.0);
    head.update_rate = config.update_rate;
    head.particle_count = count as u32;

    Ok(BuiltChain {
        head,
        particles,
        bindings,
        colliders: config.colliders.clone(),
        total_length,
    })
}

fn modulate(base: Coefficients, curves: &CoefficientCurves, depth: Option<f32>) -> Coefficients {
    let apply = |value: f32, curve: &Option<Curve>| match (curve, depth) {
        (Some(curve), Some(t)) => value * curve.sample(t),
        _ => value,
    };
    Coefficients {
        damping: apply(base.damping, &curves.damping),
        elasticity: apply(base.elasticity, &curves.elasticity),
        stiffness: apply(base.stiffness, &curves.stiffness),
        inertia: apply(base.inertia, &curves.inertia),
        friction: apply(base.friction, &curves.friction),
        radius: apply(base.radius, &curves.radius),
    }
    .clamped()
}

struct Walker<'a, T: ?Sized> {
    tree: &'a T,
    config: &'a ChainConfig,
    root_world: Pose,
    excluded: HashSet<TransformHandle>,
    particles: Vec<Particle>,
    bindings: Vec<Option<TransformHandle>>,
    local_scales: Vec<Vec3>,
    world_positions: Vec<Vec3>,
    total_length: f32,
}

impl<T: JointTree + ?Sized> Walker<'_, T> {
    /// Appends `joint` (or a synthetic tip when `None`) and, for real joints,
    /// its subtree.
    fn append(
        &mut self,
        joint: Option<TransformHandle>,
        parent: i32,
        mut bone_length: f32,
    ) -> Result<(), BuildError> {
        let parent_idx = usize::try_from(parent).ok();
        let parent_scale = parent_idx.map_or(Vec3::ONE, |p| {
            self.particles[p].parent_scale * self.local_scales[p]
        });

        let tree = self.tree;
        let (local, world) = match joint {
            Some(j) => {
                let local = tree.local_pose(j).ok_or(BuildError::UnknownJoint(j))?;
                let world = tree.world_pose(j).ok_or(BuildError::UnknownJoint(j))?;
                (local, world)
            }
            None => {
                let owner = parent_idx.and_then(|p| self.bindings[p]);
                let (offset, owner_world) = match owner {
                    Some(o) => (
                        self.end_offset_for(o)?,
                        tree.world_pose(o).ok_or(BuildError::UnknownJoint(o))?,
                    ),
                    None => (Vec3::ZERO, self.root_world),
                };
                let world = Pose::new(owner_world.transform_point(offset), owner_world.rotation);
                (Pose::from_position(offset), world)
            }
        };
        let world_position = world.position;

        if let Some(p) = parent_idx {
            bone_length += (self.world_positions[p] - world_position).length();
            self.total_length = self.total_length.max(bone_length);
        }

        let index = self.particles.len();
        self.particles.push(Particle {
            index: index as u32,
            parent,
            is_end: joint.is_none(),
            local_position: local.position,
            local_rotation: local.rotation,
            parent_scale,
            bone_length,
            nominal_position: world_position,
            nominal_rotation: world.rotation,
            position: world_position,
            prev_position: world_position,
            rotation: world.rotation,
            ..Particle::default()
        });
        self.bindings.push(joint);
        self.local_scales.push(local.scale);
        self.world_positions.push(world_position);

        let Some(joint) = joint else {
            return Ok(());
        };
        let children = tree.children(joint);
        let has_end = self.config.has_end();
        let index = index as i32;
        if children.is_empty() && has_end {
            self.append(None, index, bone_length)?;
        }
        for &child in children {
            if self.excluded.contains(&child) {
                if has_end {
                    self.append(None, index, bone_length)?;
                }
            } else {
                self.append(Some(child), index, bone_length)?;
            }
        }
        Ok(())
    }

    /// Tip offset in `owner`'s local frame.
    fn end_offset_for(&self, owner: TransformHandle) -> Result<Vec3, BuildError> {
        let owner_world = self
            .tree
            .world_pose(owner)
            .ok_or(BuildError::UnknownJoint(owner))?;
        if self.config.end_length > 0.0 {
            let grand = self.tree.parent(owner).and_then(|g| self.tree.world_pose(g));
            Ok(match grand {
                Some(grand) => {
                    let beyond = owner_world.position * 2.0 - grand.position;
                    owner_world.inverse_transform_point(beyond) * self.config.end_length
                }
                None => Vec3::new(self.config.end_length, 0.0, 0.0),
            })
        } else {
            let target = self.root_world.rotation * self.config.end_offset + owner_world.position;
            Ok(owner_world.inverse_transform_point(target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Skeleton;

    fn straight_chain(links: usize) -> (Skeleton, TransformHandle) {
        let mut skel = Skeleton::new();
        let anchor = skel.add_joint(None, "anchor", Pose::IDENTITY);
        let root = skel.add_joint(Some(anchor), "root", Pose::IDENTITY);
        let mut parent = root;
        for i in 0..links {
            parent = skel.add_joint(
                Some(parent),
                format!("link{i}"),
                Pose::from_position(Vec3::new(0.0, -1.0, 0.0)),
            );
        }
        (skel, root)
    }

    #[test]
    fn straight_chain_is_pre_order() {
        let (skel, root) = straight_chain(3);
        let chain = build_chain(&skel, &ChainConfig::new(root), 32).unwrap();

        assert_eq!(chain.particles.len(), 4);
        assert_eq!(chain.head.particle_count, 4);
        assert_eq!(chain.particles[0].parent, -1);
        for (i, p) in chain.particles.iter().enumerate().skip(1) {
            assert!((p.parent as usize) < i);
        }
        assert!((chain.total_length - 3.0).abs() < 1e-6);
        assert!((chain.particles[3].bone_length - 3.0).abs() < 1e-6);
        assert_eq!(chain.particles[0].child_count, 1);
        assert_eq!(chain.particles[3].child_count, 0);
    }

    #[test]
    fn end_length_appends_synthetic_tip() {
        let (skel, root) = straight_chain(2);
        let config = ChainConfig::new(root).with_end_length(0.5);
        let chain = build_chain(&skel, &config, 32).unwrap();

        assert_eq!(chain.particles.len(), 4);
        let tip = chain.particles[3];
        assert!(tip.is_end);
        assert_eq!(chain.bindings[3], None);
        // Extends the last bone direction by half its length.
        assert!((tip.nominal_position - Vec3::new(0.0, -2.5, 0.0)).length() < 1e-5);
        assert!((chain.total_length - 2.5).abs() < 1e-5);
    }

    #[test]
    fn excluded_child_becomes_tip_only_with_end() {
        let mut skel = Skeleton::new();
        let anchor = skel.add_joint(None, "anchor", Pose::IDENTITY);
        let root = skel.add_joint(Some(anchor), "root", Pose::IDENTITY);
        let keep = skel.add_joint(Some(root), "keep", Pose::from_position(Vec3::X));
        let skip = skel.add_joint(Some(root), "skip", Pose::from_position(Vec3::Z));
        skel.add_joint(Some(skip), "skip_child", Pose::from_position(Vec3::Z));

        let config = ChainConfig::new(root).excluding(skip);
        let chain = build_chain(&skel, &config, 32).unwrap();
        assert_eq!(chain.bindings, vec![Some(root), Some(keep)]);

        let config = config.with_end_offset(Vec3::new(0.0, -0.2, 0.0));
        let chain = build_chain(&skel, &config, 32).unwrap();
        // root, keep, keep's tip, tip standing in for the excluded child.
        assert_eq!(chain.bindings, vec![Some(root), Some(keep), None, None]);
        assert_eq!(chain.particles[3].parent, 0);
        assert_eq!(chain.particles[0].child_count, 2);
    }

    #[test]
    fn root_without_parent_is_rejected() {
        let mut skel = Skeleton::new();
        let root = skel.add_joint(None, "root", Pose::IDENTITY);
        let err = build_chain(&skel, &ChainConfig::new(root), 32).unwrap_err();
        assert_eq!(err, BuildError::RootWithoutParent(root));
    }

    #[test]
    fn oversized_chain_is_rejected_not_truncated() {
        let (skel, root) = straight_chain(9);
        let err = build_chain(&skel, &ChainConfig::new(root), 8).unwrap_err();
        assert_eq!(err, BuildError::CapacityExceeded { count: 10, capacity: 8 });
    }

    #[test]
    fn curves_scale_coefficients_by_depth() {
        let (skel, root) = straight_chain(2);
        let mut config = ChainConfig::new(root).with_coefficients(Coefficients {
            stiffness: 0.8,
            ..Coefficients::default()
        });
        config.curves.stiffness = Some(Curve::linear(1.0, 0.0));
        let chain = build_chain(&skel, &config, 32).unwrap();

        assert!((chain.particles[0].stiffness - 0.8).abs() < 1e-6);
        assert!((chain.particles[1].stiffness - 0.4).abs() < 1e-6);
        assert!(chain.particles[2].stiffness.abs() < 1e-6);
        // Unmodulated coefficients keep the global value.
        assert!((chain.particles[2].damping - 0.1).abs() < 1e-6);
    }
}
