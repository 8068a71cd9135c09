#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc
)]
//! # Scene descriptions
//!
//! JSON files describing a joint hierarchy, its colliders and the chains to
//! simulate. [`SceneDesc::into_scene`] turns one into a [`Skeleton`] plus a
//! populated [`JiggleWorld`].

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::{Quat, Vec3};
use physics::{
    Axis, Bound, ChainConfig, ColliderId, ColliderInfo, Coefficients, Curve, FrameStats,
    InstanceId, JiggleWorld, JointTree, Pose, Skeleton, TransformHandle, DEFAULT_UPDATE_RATE,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SceneDesc {
    pub joints: Vec<JointDesc>,
    #[serde(default)]
    pub colliders: Vec<ColliderDesc>,
    #[serde(default)]
    pub chains: Vec<ChainDesc>,
}

/// A joint; `parent` must name a joint declared earlier.
#[derive(Deserialize)]
pub struct JointDesc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "zero_vec")]
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    #[serde(default = "identity_quat")]
    pub rotation: [f32; 4],
    #[serde(default = "one_vec")]
    pub scale: [f32; 3],
}

#[derive(Deserialize)]
#[serde(tag = "shape")]
pub enum ColliderDesc {
    #[serde(rename = "sphere")]
    Sphere {
        id: String,
        radius: f32,
        #[serde(default)]
        attach: Option<String>,
        #[serde(default = "zero_vec")]
        center: [f32; 3],
        #[serde(default)]
        bound: Bound,
        #[serde(default)]
        global: bool,
    },
    #[serde(rename = "capsule")]
    Capsule {
        id: String,
        radius: f32,
        height: f32,
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        attach: Option<String>,
        #[serde(default = "zero_vec")]
        center: [f32; 3],
        #[serde(default)]
        bound: Bound,
        #[serde(default)]
        global: bool,
    },
}

/// Keyframes `[t, value]` per coefficient.
#[derive(Deserialize, Default)]
pub struct CurveDescs {
    pub damping: Option<Vec<[f32; 2]>>,
    pub elasticity: Option<Vec<[f32; 2]>>,
    pub stiffness: Option<Vec<[f32; 2]>>,
    pub inertia: Option<Vec<[f32; 2]>>,
    pub friction: Option<Vec<[f32; 2]>>,
    pub radius: Option<Vec<[f32; 2]>>,
}

#[derive(Deserialize)]
pub struct ChainDesc {
    pub root: String,
    #[serde(default)]
    pub coefficients: Coefficients,
    #[serde(default)]
    pub curves: CurveDescs,
    #[serde(default)]
    pub end_length: f32,
    #[serde(default = "zero_vec")]
    pub end_offset: [f32; 3],
    #[serde(default = "zero_vec")]
    pub gravity: [f32; 3],
    #[serde(default = "zero_vec")]
    pub force: [f32; 3],
    #[serde(default = "one")]
    pub weight: f32,
    #[serde(default = "default_update_rate")]
    pub update_rate: f32,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub colliders: Vec<String>,
}

fn zero_vec() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn one_vec() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn identity_quat() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn one() -> f32 {
    1.0
}

fn default_update_rate() -> f32 {
    DEFAULT_UPDATE_RATE
}

fn keys(points: Option<&Vec<[f32; 2]>>) -> Option<Curve> {
    points.map(|p| Curve::keyframes(p.iter().map(|[t, v]| (*t, *v)).collect()))
}

/// A loaded scene: the host skeleton and the world simulating it.
pub struct Scene {
    pub skeleton: Skeleton,
    pub world: JiggleWorld,
    pub chains: Vec<(String, InstanceId)>,
    pub colliders: HashMap<String, ColliderId>,
}

impl Scene {
    pub fn step(&mut self, dt: f32) -> Result<FrameStats> {
        Ok(self.world.step(&mut self.skeleton, dt)?)
    }

    /// Transforms the chains hang from, one per chain.
    #[must_use]
    pub fn anchors(&self) -> Vec<TransformHandle> {
        self.chains
            .iter()
            .filter_map(|(root, _)| self.skeleton.find(root))
            .filter_map(|root| self.skeleton.parent(root))
            .collect()
    }
}

impl SceneDesc {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        Self::from_str(&json).with_context(|| format!("parsing scene {}", path.display()))
    }

    /// `chains` hair-like strands of `links` joints each, hanging from anchors
    /// laid out on a grid, with one global head sphere.
    #[must_use]
    pub fn demo(chains: usize, links: usize) -> Self {
        let side = (chains as f32).sqrt().ceil().max(1.0) as usize;
        let mut joints = Vec::new();
        let mut chain_descs = Vec::new();
        for c in 0..chains {
            let anchor = format!("anchor{c}");
            joints.push(JointDesc {
                name: anchor.clone(),
                parent: None,
                position: [(c % side) as f32 * 1.5, 2.0, (c / side) as f32 * 1.5],
                rotation: identity_quat(),
                scale: one_vec(),
            });
            let root = format!("strand{c}");
            joints.push(JointDesc {
                name: root.clone(),
                parent: Some(anchor),
                position: zero_vec(),
                rotation: identity_quat(),
                scale: one_vec(),
            });
            let mut parent = root.clone();
            for i in 0..links {
                let name = format!("strand{c}_{i}");
                joints.push(JointDesc {
                    name: name.clone(),
                    parent: Some(parent),
                    position: [0.05, -0.25, 0.0],
                    rotation: identity_quat(),
                    scale: one_vec(),
                });
                parent = name;
            }
            chain_descs.push(ChainDesc {
                root,
                coefficients: Coefficients { radius: 0.05, ..Coefficients::default() },
                curves: CurveDescs {
                    stiffness: Some(vec![[0.0, 1.0], [1.0, 0.2]]),
                    ..CurveDescs::default()
                },
                end_length: 0.5,
                end_offset: zero_vec(),
                gravity: [0.0, -9.8, 0.0],
                force: zero_vec(),
                weight: 1.0,
                update_rate: DEFAULT_UPDATE_RATE,
                exclude: Vec::new(),
                colliders: Vec::new(),
            });
        }
        Self {
            joints,
            colliders: vec![ColliderDesc::Sphere {
                id: "head".to_string(),
                radius: 0.6,
                attach: None,
                center: [0.0, 1.2, 0.0],
                bound: Bound::Outside,
                global: true,
            }],
            chains: chain_descs,
        }
    }

    /// Builds the joint arena. Returns the handle of every named joint.
    pub fn build_skeleton(&self) -> Result<(Skeleton, HashMap<String, TransformHandle>)> {
        let mut skeleton = Skeleton::new();
        let mut names: HashMap<String, TransformHandle> = HashMap::new();
        for joint in &self.joints {
            if names.contains_key(&joint.name) {
                bail!("duplicate joint {}", joint.name);
            }
            let parent = match &joint.parent {
                Some(p) => Some(
                    *names
                        .get(p)
                        .ok_or_else(|| anyhow!("joint {} has unknown parent {p}", joint.name))?,
                ),
                None => None,
            };
            let local = Pose {
                position: Vec3::from_array(joint.position),
                rotation: Quat::from_array(joint.rotation).normalize(),
                scale: Vec3::from_array(joint.scale),
            };
            let handle = skeleton.add_joint(parent, joint.name.clone(), local);
            names.insert(joint.name.clone(), handle);
        }
        Ok((skeleton, names))
    }

    /// Builds the skeleton, registers colliders and attaches every chain to
    /// `world`.
    pub fn into_scene(self, mut world: JiggleWorld) -> Result<Scene> {
        let (skeleton, names) = self.build_skeleton()?;
        let joint = |name: &str| {
            names
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("unknown joint {name}"))
        };

        let mut colliders = HashMap::new();
        for desc in self.colliders {
            let (id, info, attach) = match desc {
                ColliderDesc::Sphere { id, radius, attach, center, bound, global } => {
                    let info = ColliderInfo {
                        center: Vec3::from_array(center),
                        bound,
                        global,
                        ..ColliderInfo::sphere(radius)
                    };
                    (id, info, attach)
                }
                ColliderDesc::Capsule { id, radius, height, axis, attach, center, bound, global } => {
                    let info = ColliderInfo {
                        center: Vec3::from_array(center),
                        bound,
                        global,
                        ..ColliderInfo::capsule(radius, height, axis)
                    };
                    (id, info, attach)
                }
            };
            let transform = attach.as_deref().map(joint).transpose()?;
            let collider = world.add_collider(info, transform);
            colliders.insert(id, collider);
        }

        let mut chains = Vec::new();
        for desc in self.chains {
            let mut config = ChainConfig::new(joint(&desc.root)?);
            config.coefficients = desc.coefficients;
            config.curves.damping = keys(desc.curves.damping.as_ref());
            config.curves.elasticity = keys(desc.curves.elasticity.as_ref());
            config.curves.stiffness = keys(desc.curves.stiffness.as_ref());
            config.curves.inertia = keys(desc.curves.inertia.as_ref());
            config.curves.friction = keys(desc.curves.friction.as_ref());
            config.curves.radius = keys(desc.curves.radius.as_ref());
            config.end_length = desc.end_length;
            config.end_offset = Vec3::from_array(desc.end_offset);
            config.gravity = Vec3::from_array(desc.gravity);
            config.force = Vec3::from_array(desc.force);
            config.weight = desc.weight;
            config.update_rate = desc.update_rate;
            config.exclusions = desc
                .exclude
                .iter()
                .map(|name| joint(name))
                .collect::<Result<_>>()?;
            config.colliders = desc
                .colliders
                .iter()
                .map(|name| {
                    colliders
                        .get(name)
                        .copied()
                        .ok_or_else(|| anyhow!("chain {} uses unknown collider {name}", desc.root))
                })
                .collect::<Result<_>>()?;

            let id = world
                .attach_chain(&skeleton, &config)
                .with_context(|| format!("building chain {}", desc.root))?;
            chains.push((desc.root, id));
        }

        tracing::info!(
            joints = skeleton.len(),
            colliders = colliders.len(),
            chains = chains.len(),
            "scene loaded"
        );
        Ok(Scene { skeleton, world, chains, colliders })
    }
}
