/*
 * Shoal - Interactive Viewer
 *
 * Opens a nannou window with the flock seen from above and an egui panel
 * for switching between the uniform grid and the octree, showing their
 * structure and tuning parameters while the simulation runs.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use shoal::app::{self, model, update};
use shoal::SimulationParams;

#[derive(Parser, Debug)]
#[command(name = "viewer", about = "Interactive 3D flocking viewer")]
struct Cli {
    /// JSON parameter file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible flock.
    #[arg(long)]
    seed: Option<u64>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => SimulationParams::from_path(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => SimulationParams::default(),
    };
    if cli.seed.is_some() {
        params.seed = cli.seed;
    }
    params.validate().context("invalid simulation parameters")?;

    app::set_startup_params(params);
    nannou::app(model).update(update).run();
    Ok(())
}
