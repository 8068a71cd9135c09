#![cfg(feature = "parallel")]

use std::sync::Arc;

use compute::{ComputeBackend, CpuBackend, ParallelBackend};
use glam::{Quat, Vec3};
use physics::{
    Axis, ChainConfig, ColliderInfo, Coefficients, Curve, JiggleWorld, JointTree, Pose, Skeleton,
};

fn scene() -> (Skeleton, Vec<physics::TransformHandle>) {
    let mut skel = Skeleton::new();
    let mut anchors = Vec::new();
    for c in 0..24 {
        let anchor = skel.add_joint(
            None,
            format!("anchor{c}"),
            Pose::from_position(Vec3::new((c % 6) as f32 * 2.0, 0.0, (c / 6) as f32 * 2.0)),
        );
        let root = skel.add_joint(Some(anchor), format!("root{c}"), Pose::IDENTITY);
        let mut parent = root;
        for i in 0..(3 + c % 5) {
            parent = skel.add_joint(
                Some(parent),
                format!("c{c}_{i}"),
                Pose::new(Vec3::new(0.3, -0.8, 0.0), Quat::from_rotation_z(0.1)),
            );
        }
        anchors.push(anchor);
    }
    (skel, anchors)
}

fn run(backend: Arc<dyn ComputeBackend>) -> Vec<physics::Particle> {
    let (mut skel, anchors) = scene();
    let mut world = JiggleWorld::with_backend(backend, 16);
    let floor = world.add_collider(
        ColliderInfo::capsule(0.5, 30.0, Axis::X)
            .with_pose(Pose::from_position(Vec3::new(5.0, -2.0, 3.0))),
        None,
    );
    let mut ids = Vec::new();
    for &anchor in &anchors {
        let root = skel.children(anchor)[0];
        let mut config = ChainConfig::new(root)
            .with_coefficients(Coefficients {
                inertia: 0.3,
                friction: 0.4,
                radius: 0.1,
                ..Coefficients::default()
            })
            .with_gravity(Vec3::new(0.0, -9.8, 0.0))
            .with_end_length(0.5)
            .with_colliders(vec![floor]);
        config.curves.stiffness = Some(Curve::linear(1.0, 0.2));
        ids.push(world.attach_chain(&skel, &config).unwrap());
    }

    for frame in 0..45 {
        let t = frame as f32 / 60.0;
        for (i, &anchor) in anchors.iter().enumerate() {
            let base = Vec3::new((i % 6) as f32 * 2.0, 0.0, (i / 6) as f32 * 2.0);
            let sway = Vec3::new((t * 4.0 + i as f32).sin() * 0.5, 0.0, 0.0);
            skel.set_local_pose(anchor, Pose::from_position(base + sway));
        }
        world.step(&mut skel, 1.0 / 60.0).unwrap();
    }

    ids.iter()
        .flat_map(|&id| world.particles(id).unwrap().to_vec())
        .collect()
}


#[test]
fn parallel_matches_sequential_bit_for_bit() {
    let sequential = run(Arc::new(CpuBackend::new()));
    let parallel = run(Arc::new(ParallelBackend::with_threads(4).unwrap()));
    assert_eq!(sequential.len(), parallel.len());
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(a.position.to_array(), b.position.to_array());
        assert_eq!(a.rotation.to_array(), b.rotation.to_array());
    }
}

#[test]
fn default_backend_runs_frames() {
    let mut world = JiggleWorld::new();
    let (mut skel, anchors) = scene();
    let root = skel.children(anchors[0])[0];
    world.attach_chain(&skel, &ChainConfig::new(root)).unwrap();
    let stats = world.step(&mut skel, 1.0 / 60.0).unwrap();
    assert_eq!(stats.instances, 1);
    assert!(!world.backend_name().is_empty());
}
