/*
 * Shoal - Headless Runner
 *
 * Runs the flocking simulation without a window. Parameters come from the
 * defaults, an optional JSON file, and finally the command-line flags, in
 * that order. A summary line is logged every few ticks and once at the end.
 *
 * Set RUST_LOG (for example RUST_LOG=shoal=debug) to see more detail.
 */

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shoal::{IndexKind, Simulation, SimulationParams, DEFAULT_DT};

#[derive(Parser, Debug)]
#[command(name = "shoal", about = "Headless 3D flocking simulation", version)]
struct Cli {
    /// JSON parameter file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Override the number of boids.
    #[arg(long)]
    boids: Option<usize>,

    /// Neighbor structure: `grid` or `octree`.
    #[arg(long)]
    index: Option<IndexKind>,

    /// Seconds simulated per tick.
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f32,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Update agents on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Log a summary every N ticks (0 disables periodic summaries).
    #[arg(long, default_value_t = 60)]
    summary_every: u64,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn load_params(cli: &Cli) -> Result<SimulationParams> {
    let mut params = match &cli.config {
        Some(path) => SimulationParams::from_path(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => SimulationParams::default(),
    };

    if let Some(boids) = cli.boids {
        params.num_boids = boids;
    }
    if let Some(kind) = cli.index {
        params.index_kind = kind;
    }
    if cli.seed.is_some() {
        params.seed = cli.seed;
    }
    if cli.sequential {
        params.enable_parallel = false;
    }
    Ok(params)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if !(cli.dt.is_finite() && cli.dt > 0.0) {
        anyhow::bail!("--dt must be a positive number of seconds, got {}", cli.dt);
    }

    let params = load_params(&cli)?;
    let mut sim = Simulation::new(params).context("invalid simulation parameters")?;

    info!(
        boids = sim.boids().len(),
        index = sim.index_kind().label(),
        ticks = cli.ticks,
        parallel = sim.params().enable_parallel,
        "starting run"
    );

    let started = Instant::now();
    let mut busy = Duration::ZERO;
    let mut last = None;

    for _ in 0..cli.ticks {
        let tick = sim.step(cli.dt);
        busy += tick.step_time;
        if cli.summary_every > 0 && tick.tick % cli.summary_every == 0 {
            info!("{tick}");
        }
        last = Some(tick);
    }

    if let Some(tick) = last {
        let per_tick = busy.as_secs_f64() * 1000.0 / tick.tick.max(1) as f64;
        info!(
            wall_ms = started.elapsed().as_millis() as u64,
            avg_tick_ms = per_tick,
            candidates_per_agent = tick.candidates_per_agent(),
            "finished: {tick}"
        );
    }
    Ok(())
}
