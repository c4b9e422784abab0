//! Headless particle-life driver
//!
//! Builds the stock four-group world and advances it frame by frame, logging
//! the average tick time. `--compare` runs every strategy on the same seeded
//! population instead.

use anyhow::Result;
use clap::Parser;
use particle_physics::Domain;
use particle_simulation::{ParticleSimulation, PhysicsEngine, PopulationSeed, Settings, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Simulated seconds per frame at a nominal 60 FPS
const FRAME_SECONDS: f32 = 1.0 / 60.0;
const REPORT_EVERY: u32 = 60;
const TIMING_WINDOW: usize = 100;

#[derive(Parser, Debug)]
#[command(about = "Run a particle-life world without a window")]
struct Args {
    /// brute, brute-parallel, grid, grid-parallel, grid-cached or grid-cached-parallel
    #[arg(short, long, default_value_t = Strategy::default())]
    strategy: Strategy,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    #[arg(long, default_value_t = 500)]
    width: u32,

    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Particles per group
    #[arg(short = 'n', long, default_value_t = particle_physics::DEFAULT_GROUP_SIZE)]
    group_size: usize,

    /// Interaction radius (clamped to half the smaller domain side)
    #[arg(short, long)]
    radius: Option<f32>,

    /// Seed for the starting positions; random when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Time every strategy on the same population
    #[arg(long)]
    compare: bool,
}

fn main() -> Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting particle-life simulation...");

    let domain = Domain::new(args.width, args.height)?;
    let settings = Arc::new(Settings::default());
    if let Some(radius) = args.radius {
        settings.set_interaction_radius(radius)?;
    }

    let seed = PopulationSeed {
        group_sizes: vec![args.group_size; particle_physics::MAX_GROUPS],
        ..PopulationSeed::default()
    };
    let rng_seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Population seed {rng_seed}");

    let strategies = if args.compare {
        Strategy::ALL.to_vec()
    } else {
        vec![args.strategy]
    };

    for strategy in strategies {
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let mut simulation = ParticleSimulation::from_seed(
            domain,
            Arc::clone(&settings),
            &seed,
            strategy,
            &mut rng,
        )?;
        let average = run(&mut simulation, args.frames);
        log::info!(
            "{strategy}: {:.3} ms per tick over {} frames",
            average,
            args.frames
        );
    }

    Ok(())
}

/// Advance `frames` times, logging the rolling tick time. Returns the overall mean in ms.
fn run(simulation: &mut ParticleSimulation, frames: u32) -> f32 {
    let mut frame_times: VecDeque<f32> = VecDeque::with_capacity(TIMING_WINDOW);
    let mut total = 0.0;

    for frame in 1..=frames {
        let start = Instant::now();
        simulation.advance_frame(FRAME_SECONDS);
        let frame_time = start.elapsed().as_secs_f32() * 1000.0;
        total += frame_time;

        frame_times.push_back(frame_time);
        if frame_times.len() > TIMING_WINDOW {
            frame_times.pop_front();
        }

        if frame % REPORT_EVERY == 0 {
            let avg_frame_time = frame_times.iter().sum::<f32>() / frame_times.len() as f32;
            log::info!(
                "frame {frame}: {avg_frame_time:.2} ms ({:.0} ticks/s), {} particles",
                1000.0 / avg_frame_time,
                simulation.particle_groups().particle_count()
            );
        }
    }

    if frames == 0 {
        0.0
    } else {
        total / frames as f32
    }
}
