#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Colony simulation headless.

mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colony_core::{Event, WorldConfig, WELCOME_BANNER};
use colony_rendering::{RenderingBackend, Scene, TerrainPresentation};
use colony_system_simulation::Simulation;
use colony_system_workforce::{Config as WorkforceConfig, Workforce};
use colony_world::query;
use tracing::{info, trace};
use tracing_subscriber::EnvFilter;

use settings::Overrides;

/// Headless Colony simulation runner.
#[derive(Debug, Parser)]
#[command(name = "colony", about = "Runs the Colony paving simulation headless")]
struct Cli {
    /// TOML document describing the world; omitted keys use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tiles along each edge of the grid.
    #[arg(long)]
    grid_size: Option<u32>,
    /// Coverage that triggers a world reset.
    #[arg(long)]
    threshold: Option<f32>,
    /// Factory placements per reset.
    #[arg(long)]
    factories: Option<usize>,
    /// Seed for world generation and worker draws.
    #[arg(long, default_value_t = 0x00c0_104e)]
    seed: u64,
    /// Number of paving workers.
    #[arg(long, default_value_t = 64)]
    workers: usize,
    /// Worker threads; zero uses one per logical core.
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    frames: u32,
    /// Seconds advanced per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Leave trees out of captured scenes.
    #[arg(long)]
    hide_trees: bool,
}

/// Backend that tallies captured scenes instead of drawing them.
#[derive(Debug, Default)]
struct HeadlessBackend {
    terrain_tiles: usize,
    frames: u64,
    peak_instances: usize,
}

impl RenderingBackend for HeadlessBackend {
    fn load_terrain(&mut self, terrain: &TerrainPresentation) -> Result<()> {
        self.terrain_tiles = terrain.tile_positions.len();
        trace!(tiles = self.terrain_tiles, extent = terrain.extent(), "terrain loaded");
        Ok(())
    }

    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.frames += 1;
        self.peak_instances = self.peak_instances.max(scene.instance_count());
        trace!(
            paved = scene.paved_tiles.len(),
            factories = scene.factories.len(),
            coverage = scene.coverage,
            "frame presented"
        );
        Ok(())
    }
}

/// Entry point for the Colony command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();
    println!("{WELCOME_BANNER}");

    let base = match &cli.config {
        Some(path) => settings::load(path)?,
        None => WorldConfig::default(),
    };
    let config = Overrides {
        grid_size: cli.grid_size,
        coverage_threshold: cli.threshold,
        max_factories: cli.factories,
    }
    .apply(base)
    .context("invalid world configuration")?;

    let workforce = Workforce::new(WorkforceConfig::new(cli.workers, cli.threads, cli.seed))?;
    let mut simulation = Simulation::new(config, cli.seed, workforce)?;
    let mut backend = HeadlessBackend::default();
    backend.load_terrain(&TerrainPresentation::from_field(simulation.field()))?;

    let mut events = Vec::new();
    let mut time = 0.0;
    for _ in 0..cli.frames {
        time += cli.dt;
        simulation.update(time, cli.dt, &mut events);
        for event in events.drain(..) {
            if let Event::WorldReset { epoch, .. } = event {
                info!(epoch, time, "world regenerated");
                backend.load_terrain(&TerrainPresentation::from_field(simulation.field()))?;
            }
        }
        backend.present(&Scene::capture(simulation.field(), !cli.hide_trees))?;
    }

    let stats = query::stats(simulation.field());
    println!(
        "simulated {} frames over {time:.1}s: {} resets, coverage {:.3}, {}/{} tiles paved, {} trees standing, {} factories, peak {} instances",
        backend.frames,
        simulation.epoch(),
        stats.coverage,
        stats.active_tiles,
        stats.tile_count,
        stats.active_trees,
        stats.active_factories,
        backend.peak_instances,
    );
    Ok(())
}
