#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-threaded unit manager that paves the field with a fixed crew.
//!
//! Each worker owns a seeded random stream. On every tick it either continues
//! paving its current tile or draws a fresh one from the inactive pool. Ticks
//! run on a dedicated rayon pool, so workers race each other for tiles and
//! rely on the field's claim protocol to settle those races.

use colony_core::{FieldError, TileIndex};
use colony_system_simulation::UnitManager;
use colony_world::TileField;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;

/// Configuration parameters required to construct the workforce.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    workers: usize,
    threads: usize,
    seed: u64,
}

impl Config {
    /// Creates a configuration for `workers` units on `threads` threads.
    ///
    /// A thread count of zero lets rayon pick one per logical core.
    #[must_use]
    pub const fn new(workers: usize, threads: usize, seed: u64) -> Self {
        Self {
            workers,
            threads,
            seed,
        }
    }
}

/// Failures raised while constructing the workforce.
#[derive(Debug, Error)]
pub enum WorkforceError {
    /// The worker thread pool could not be created.
    #[error("failed to build worker thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug)]
struct Worker {
    rng: ChaCha8Rng,
    target: Option<TileIndex>,
    paved: u64,
}

impl Worker {
    fn seeded(seed: u64, epoch: u64, id: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ epoch.rotate_left(32));
        rng.set_stream(id as u64);
        Self {
            rng,
            target: None,
            paved: 0,
        }
    }

    fn step(&mut self, field: &TileField, elapsed: f32) -> Result<(), FieldError> {
        let tile = match self.target {
            Some(tile) => tile,
            None => {
                let tile = field.pick_inactive_tile(&mut self.rng)?;
                self.target = Some(tile);
                tile
            }
        };

        // Another worker finished this tile first.
        if field.is_active(tile)? {
            self.target = None;
            return Ok(());
        }

        if field.pave_tick(tile, elapsed)? {
            self.target = None;
            self.paved += 1;
        }
        Ok(())
    }
}

/// Crew of workers paving the field in parallel.
#[derive(Debug)]
pub struct Workforce {
    config: Config,
    pool: rayon::ThreadPool,
    workers: Vec<Worker>,
    epoch: u64,
    working: bool,
}

impl Workforce {
    /// Builds the thread pool; workers are created by [`UnitManager::initialize`].
    pub fn new(config: Config) -> Result<Self, WorkforceError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|index| format!("colony-worker-{index}"))
            .build()?;
        Ok(Self {
            config,
            pool,
            workers: Vec::new(),
            epoch: 0,
            working: false,
        })
    }

    /// Number of workers in the crew.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tiles each worker is currently paving.
    #[must_use]
    pub fn assignments(&self) -> Vec<Option<TileIndex>> {
        self.workers.iter().map(|worker| worker.target).collect()
    }

    /// Tiles completed by the crew since the last reset.
    #[must_use]
    pub fn tiles_paved(&self) -> u64 {
        self.workers.iter().map(|worker| worker.paved).sum()
    }

    /// Reports whether the crew accepts work.
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.working
    }

    fn hire(&mut self) {
        let (seed, epoch) = (self.config.seed, self.epoch);
        self.workers = (0..self.config.workers)
            .map(|id| Worker::seeded(seed, epoch, id))
            .collect();
    }
}

impl UnitManager for Workforce {
    fn initialize(&mut self, field: &TileField) {
        self.hire();
        self.working = true;
        tracing::debug!(
            workers = self.workers.len(),
            threads = self.pool.current_num_threads(),
            tiles = field.tile_count(),
            "workforce initialised"
        );
    }

    fn update(&mut self, field: &TileField, elapsed: f32) {
        if !self.working {
            return;
        }

        let workers = &mut self.workers;
        self.pool.install(|| {
            workers.par_iter_mut().for_each(|worker| {
                if let Err(error) = worker.step(field, elapsed) {
                    tracing::warn!(%error, "worker could not pave");
                }
            });
        });
    }

    fn stop_work(&mut self) {
        self.working = false;
        for worker in &mut self.workers {
            worker.target = None;
        }
    }

    fn reset(&mut self, field: &TileField) {
        self.epoch += 1;
        self.hire();
        self.working = true;
        tracing::debug!(
            epoch = self.epoch,
            inactive = field.inactive_tile_count(),
            "workforce reset"
        );
    }
}
