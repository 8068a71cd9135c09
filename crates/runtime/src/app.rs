//! Simulation loop.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use compute::{ComputeBackend, CpuBackend};
use glam::{Quat, Vec3};
use physics::{JiggleWorld, JointTree, Pose, TransformHandle, DEFAULT_PARTICLE_CAPACITY};
use scene::{Scene, SceneDesc};

use crate::{Args, BackendChoice};

const SWAY_AMPLITUDE: f32 = 0.3;
const SWAY_FREQUENCY: f32 = 1.5;

pub fn select_backend(choice: BackendChoice, threads: usize) -> Result<Arc<dyn ComputeBackend>> {
    match choice {
        BackendChoice::Cpu => Ok(Arc::new(CpuBackend::new())),
        #[cfg(feature = "parallel")]
        BackendChoice::Parallel => {
            let pool = if threads == 0 {
                compute::ParallelBackend::new()
            } else {
                compute::ParallelBackend::with_threads(threads)
            }
            .context("creating parallel backend")?;
            Ok(Arc::new(pool))
        }
        #[cfg(not(feature = "parallel"))]
        BackendChoice::Parallel => {
            let _ = threads;
            tracing::warn!("built without the parallel feature, using the cpu backend");
            Ok(Arc::new(CpuBackend::new()))
        }
    }
}

/// Anchor rest poses, captured once so the sway never drifts.
struct Sway {
    anchors: Vec<(TransformHandle, Pose)>,
}

impl Sway {
    fn new(scene: &Scene) -> Self {
        let anchors = scene
            .anchors()
            .into_iter()
            .filter_map(|a| scene.skeleton.local_pose(a).map(|pose| (a, pose)))
            .collect();
        Self { anchors }
    }

    fn apply(&self, scene: &mut Scene, time: f32) {
        let phase = (time * SWAY_FREQUENCY * std::f32::consts::TAU).sin();
        for (anchor, rest) in &self.anchors {
            let pose = Pose {
                position: rest.position + Vec3::X * (SWAY_AMPLITUDE * phase),
                rotation: rest.rotation * Quat::from_rotation_z(0.2 * phase),
                scale: rest.scale,
            };
            scene.skeleton.set_local_pose(*anchor, pose);
        }
    }
}

/// Runs `args.frames` frames and returns the total number of collisions.
pub fn run(args: &Args) -> Result<usize> {
    let backend = select_backend(args.backend, args.threads)?;
    tracing::info!(backend = backend.name(), "Initializing jiggle simulation...");
    let world = JiggleWorld::with_backend(backend, DEFAULT_PARTICLE_CAPACITY);

    let desc = match &args.scene {
        Some(path) => SceneDesc::from_path(path)?,
        None => SceneDesc::demo(args.chains, args.links),
    };
    let mut scene = desc.into_scene(world)?;
    let sway = Sway::new(&scene);

    let started = Instant::now();
    let mut collisions = 0;
    for i in 0..args.frames {
        sway.apply(&mut scene, i as f32 * args.dt);
        let stats = scene.step(args.dt)?;
        collisions += stats.collisions;
        if args.report_every > 0 && stats.frame % u64::from(args.report_every) == 0 {
            tracing::info!(
                frame = stats.frame,
                instances = stats.instances,
                particles = stats.particles,
                collisions = stats.collisions,
                written = stats.written,
                "frame"
            );
        }
    }

    let elapsed = started.elapsed();
    tracing::info!(
        frames = args.frames,
        collisions,
        ms_per_frame = elapsed.as_secs_f64() * 1000.0 / f64::from(args.frames.max(1)),
        "simulation finished"
    );
    Ok(collisions)
}
