#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation loop that sequences unit work against world regeneration.
//!
//! [`Simulation::update`] hands the shared [`TileField`] to the unit manager
//! for the duration of a tick. Only after that call returns, and with it every
//! worker borrow of the field, does the loop inspect coverage and regenerate
//! the world. Claims and resets therefore never overlap.

use colony_core::{ConfigError, Event, Phase, WorldConfig};
use colony_world::{GenerationSummary, TileField};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Collaborator that owns the workers paving the field.
///
/// Workers may run on any number of threads during [`UnitManager::update`],
/// calling [`TileField::pick_inactive_tile`] and [`TileField::pave_tick`]
/// through the shared reference, but must not outlive the call.
pub trait UnitManager {
    /// Prepares the manager for the field it will work on.
    fn initialize(&mut self, field: &TileField);

    /// Advances every worker by `elapsed` seconds.
    fn update(&mut self, field: &TileField, elapsed: f32);

    /// Abandons outstanding work ahead of a regeneration.
    fn stop_work(&mut self);

    /// Rebuilds internal state against the freshly generated field.
    fn reset(&mut self, field: &TileField);
}

/// Owner of the tile field and driver of its reset lifecycle.
#[derive(Debug)]
pub struct Simulation<U> {
    field: TileField,
    units: U,
    rng: ChaCha8Rng,
    phase: Phase,
    epoch: u64,
    epoch_announced: bool,
    time: f32,
    elapsed: f32,
}

impl<U> Simulation<U>
where
    U: UnitManager,
{
    /// Allocates the field, initialises `units` and generates the first world.
    pub fn new(config: WorldConfig, seed: u64, mut units: U) -> Result<Self, ConfigError> {
        let field = TileField::new(config)?;
        units.initialize(&field);

        let mut simulation = Self {
            field,
            units,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: Phase::Building,
            epoch: 0,
            epoch_announced: false,
            time: 0.0,
            elapsed: 0.0,
        };
        let summary = simulation.regenerate();
        tracing::info!(
            tiles = simulation.field.tile_count(),
            active_trees = summary.active_trees,
            factory_tiles = summary.factory_tiles,
            "colony initialised"
        );
        Ok(simulation)
    }

    /// Advances the simulation to `time`, `elapsed` seconds after the last tick.
    pub fn update(&mut self, time: f32, elapsed: f32, out_events: &mut Vec<Event>) {
        self.time = time;
        self.elapsed = elapsed;

        if !self.epoch_announced {
            self.epoch_announced = true;
            out_events.push(Event::EpochStarted { epoch: self.epoch });
        }

        self.units.update(&self.field, elapsed);

        let coverage = self.field.coverage();
        let threshold = self.field.config().coverage_threshold;
        if coverage > threshold {
            self.phase = Phase::CoverageExceeded;
            tracing::info!(epoch = self.epoch, coverage, threshold, "coverage exceeded");
            out_events.push(Event::CoverageExceeded {
                coverage,
                threshold,
            });
            self.reset(out_events);
        } else if self.field.inactive_tile_count() == 0 {
            tracing::error!(
                epoch = self.epoch,
                coverage,
                threshold,
                "inactive pool drained below the reset threshold"
            );
            self.reset(out_events);
        }
    }

    /// Stops the workers and regenerates the world, starting a new epoch.
    pub fn reset(&mut self, out_events: &mut Vec<Event>) {
        let summary = self.regenerate();
        self.epoch += 1;
        self.epoch_announced = false;
        tracing::info!(epoch = self.epoch, "world reset");
        out_events.push(Event::WorldReset {
            epoch: self.epoch,
            active_trees: summary.active_trees,
            inactive_trees: summary.inactive_trees,
            factory_tiles: summary.factory_tiles,
        });
    }

    fn regenerate(&mut self) -> GenerationSummary {
        self.phase = Phase::Resetting;
        self.units.stop_work();
        let summary = self.field.reset(&mut self.rng);
        self.units.reset(&self.field);
        self.phase = Phase::Building;
        summary
    }

    /// Shared view of the tile field.
    #[must_use]
    pub fn field(&self) -> &TileField {
        &self.field
    }

    /// The unit manager driving the workers.
    #[must_use]
    pub fn units(&self) -> &U {
        &self.units
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of resets performed since start-up.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Time passed to the most recent update.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Elapsed seconds passed to the most recent update.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
