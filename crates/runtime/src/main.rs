#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
//! # Jiggle Runtime
//!
//! Headless driver for the jiggle simulation. Loads a scene file (or builds a
//! demo scene of hanging strands), sways the chain anchors and steps the
//! world for a fixed number of frames, logging per-frame statistics.

mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// Sequential, one instance after another.
    Cpu,
    /// Instances spread over a rayon pool.
    Parallel,
}

#[derive(Parser, Debug)]
#[command(name = "jiggle_runtime", about = "Steps spring-bone chains headlessly")]
pub struct Args {
    /// Scene description (JSON). A demo scene is generated when omitted.
    #[arg(long)]
    pub scene: Option<PathBuf>,
    #[arg(long, default_value_t = 240)]
    pub frames: u32,
    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,
    /// Demo strands.
    #[arg(long, default_value_t = 16)]
    pub chains: usize,
    /// Joints per demo strand.
    #[arg(long, default_value_t = 8)]
    pub links: usize,
    #[arg(long, value_enum, default_value_t = BackendChoice::Parallel)]
    pub backend: BackendChoice,
    /// Worker threads for the parallel backend; 0 uses every core.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
    /// Log statistics every this many frames.
    #[arg(long, default_value_t = 60)]
    pub report_every: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    app::run(&args).map(|_| ())
}
