#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tile field for the Colony simulation.
//!
//! The [`TileField`] is shared by reference between the simulation loop and
//! the worker threads of a unit manager. Workers pave tiles through
//! [`TileField::pave_tick`] and claim them through [`TileField::claim`], both
//! of which take `&self`: counters are atomic, and the inactive pool, tree
//! pool and factory pool each sit behind their own short-lived lock.
//! Regeneration goes through [`TileField::reset`], which needs `&mut self`
//! and therefore can never overlap a claim.

mod generation;
mod pools;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use colony_core::{ConfigError, FieldError, TileIndex, WorldConfig};
use glam::{Mat4, Vec2, Vec3};
use parking_lot::Mutex;
use rand::Rng;

pub use generation::GenerationSummary;
use pools::{AtomicScalar, InactivePool, PavedSlots, TreePool};

/// Outcome of a [`TileField::claim`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Claim {
    /// The tile transitioned to active and received the given paving slot.
    Activated {
        /// Zero-based order in which the tile was claimed this epoch.
        slot: usize,
    },
    /// The tile was already active; nothing changed.
    AlreadyActive,
}

#[derive(Debug)]
struct Tile {
    position: Vec2,
    active: AtomicBool,
    timer: AtomicScalar,
    factory: bool,
}

impl Tile {
    fn translation(&self) -> Vec3 {
        Vec3::new(self.position.x, 0.0, self.position.y)
    }
}

/// Grid of tiles together with the pools that track their state.
#[derive(Debug)]
pub struct TileField {
    config: WorldConfig,
    coverage_per_tile: f32,
    tiles: Vec<Tile>,
    inactive: Mutex<InactivePool>,
    active_tiles: AtomicUsize,
    coverage: AtomicScalar,
    paved: PavedSlots,
    trees: Mutex<TreePool>,
    decorative_trees: Vec<Mat4>,
    factories: Mutex<Vec<Mat4>>,
    factory_sites: Vec<TileIndex>,
}

impl TileField {
    /// Allocates a field for `config` with every tile inactive and no scenery.
    ///
    /// Call [`TileField::reset`] to scatter trees and factories.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid_size = config.grid_size;
        let tile_count = config.tile_count();
        let half_tile = config.tile_size / 2.0;
        let mut tiles = Vec::with_capacity(tile_count);
        for x in 0..grid_size {
            for y in 0..grid_size {
                tiles.push(Tile {
                    position: Vec2::new(
                        x as f32 * config.tile_size + half_tile,
                        y as f32 * config.tile_size + half_tile,
                    ),
                    active: AtomicBool::new(false),
                    timer: AtomicScalar::new(config.tile_time),
                    factory: false,
                });
            }
        }

        let mut inactive = InactivePool::with_capacity(tile_count);
        for index in 0..tile_count {
            inactive.push(TileIndex::new(index as u32));
        }

        Ok(Self {
            coverage_per_tile: config.coverage_per_tile(),
            tiles,
            inactive: Mutex::new(inactive),
            active_tiles: AtomicUsize::new(0),
            coverage: AtomicScalar::new(0.0),
            paved: PavedSlots::new(tile_count),
            trees: Mutex::new(TreePool::new(tile_count, config.tree_count)),
            decorative_trees: Vec::with_capacity(config.tree_count),
            factories: Mutex::new(Vec::with_capacity(config.max_factories)),
            factory_sites: Vec::with_capacity(config.max_factories),
            config,
        })
    }

    /// Configuration the field was built from.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn tile(&self, index: TileIndex) -> Result<&Tile, FieldError> {
        self.tiles
            .get(index.as_usize())
            .ok_or(FieldError::InvalidTile {
                index,
                tile_count: self.tiles.len(),
            })
    }

    /// World-space centre of the tile.
    pub fn position(&self, index: TileIndex) -> Result<Vec2, FieldError> {
        self.tile(index).map(|tile| tile.position)
    }

    /// Reports whether the tile has been paved.
    pub fn is_active(&self, index: TileIndex) -> Result<bool, FieldError> {
        self.tile(index)
            .map(|tile| tile.active.load(Ordering::Acquire))
    }

    /// Reports whether the tile was chosen as a factory site.
    pub fn is_factory(&self, index: TileIndex) -> Result<bool, FieldError> {
        self.tile(index).map(|tile| tile.factory)
    }

    /// Slot of the active tree standing on the tile, if any.
    pub fn tree_of(&self, index: TileIndex) -> Result<Option<usize>, FieldError> {
        let _ = self.tile(index)?;
        Ok(self.trees.lock().slot_of(index))
    }

    /// Remaining paving time of the tile.
    pub fn timer(&self, index: TileIndex) -> Result<f32, FieldError> {
        self.tile(index).map(|tile| tile.timer.load())
    }

    /// Coverage accumulated since the last reset.
    #[must_use]
    pub fn coverage(&self) -> f32 {
        self.coverage.load()
    }

    /// Number of tiles claimed since the last reset.
    #[must_use]
    pub fn active_tile_count(&self) -> usize {
        self.active_tiles.load(Ordering::Acquire)
    }

    /// Number of tiles still waiting to be claimed.
    #[must_use]
    pub fn inactive_tile_count(&self) -> usize {
        self.inactive.lock().len()
    }

    /// Number of trees still standing on the grid.
    #[must_use]
    pub fn active_tree_count(&self) -> usize {
        self.trees.lock().len()
    }

    /// Number of decorative trees outside the grid.
    #[must_use]
    pub fn inactive_tree_count(&self) -> usize {
        self.decorative_trees.len()
    }

    /// Number of factories raised by claims this epoch.
    #[must_use]
    pub fn active_factory_count(&self) -> usize {
        self.factories.lock().len()
    }

    /// Draws a uniformly random tile from the inactive pool.
    ///
    /// The pool may change as soon as the lock is released, so the returned
    /// tile can already be claimed by the time the caller acts on it.
    /// [`TileField::claim`] tolerates that.
    pub fn pick_inactive_tile<R>(&self, rng: &mut R) -> Result<TileIndex, FieldError>
    where
        R: Rng + ?Sized,
    {
        let pool = self.inactive.lock();
        if pool.len() == 0 {
            return Err(FieldError::EmptyPool);
        }
        let position = rng.gen_range(0..pool.len());
        pool.get(position).ok_or(FieldError::EmptyPool)
    }

    /// Transitions a tile from inactive to active.
    ///
    /// Claiming an active tile is a no-op reported as [`Claim::AlreadyActive`].
    pub fn claim(&self, index: TileIndex) -> Result<Claim, FieldError> {
        let tile = self.tile(index)?;
        if tile.active.swap(true, Ordering::AcqRel) {
            return Ok(Claim::AlreadyActive);
        }

        let slot = self.active_tiles.fetch_add(1, Ordering::AcqRel);
        let _ = self.coverage.add(self.coverage_per_tile);

        let removed = self.inactive.lock().remove(index);
        debug_assert!(removed, "tile {index} was active and pooled at once");

        if tile.factory {
            self.factories
                .lock()
                .push(Mat4::from_translation(tile.translation()));
        } else {
            self.paved.fill(slot, index);
        }

        let _ = self.trees.lock().remove_owned_by(index);

        Ok(Claim::Activated { slot })
    }

    /// Advances paving of a tile by `elapsed` seconds.
    ///
    /// Any tree on the tile sinks by the same amount. Returns `true` once the
    /// timer has run out, claiming the tile in the process.
    pub fn pave_tick(&self, index: TileIndex, elapsed: f32) -> Result<bool, FieldError> {
        let tile = self.tile(index)?;
        let remaining = tile.timer.add(-elapsed);
        self.trees.lock().sink(index, elapsed);

        if remaining <= 0.0 {
            let _ = self.claim(index)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Read-only snapshots of the field for renderers and diagnostics.
pub mod query {
    use colony_core::TileIndex;
    use glam::{Mat4, Vec2};

    use super::TileField;

    /// Point-in-time copy of every counter the field maintains.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct FieldStats {
        /// Total number of tiles in the grid.
        pub tile_count: usize,
        /// Tiles claimed this epoch.
        pub active_tiles: usize,
        /// Tiles still in the inactive pool.
        pub inactive_tiles: usize,
        /// Trees standing on the grid.
        pub active_trees: usize,
        /// Decorative trees outside the grid.
        pub inactive_trees: usize,
        /// Factories raised by claims this epoch.
        pub active_factories: usize,
        /// Coverage accumulated this epoch.
        pub coverage: f32,
    }

    /// Captures the field's counters.
    #[must_use]
    pub fn stats(field: &TileField) -> FieldStats {
        FieldStats {
            tile_count: field.tile_count(),
            active_tiles: field.active_tile_count(),
            inactive_tiles: field.inactive_tile_count(),
            active_trees: field.active_tree_count(),
            inactive_trees: field.inactive_tree_count(),
            active_factories: field.active_factory_count(),
            coverage: field.coverage(),
        }
    }

    /// Centres of every tile in raster order, for terrain geometry.
    #[must_use]
    pub fn tile_positions(field: &TileField) -> Vec<Vec2> {
        field.tiles.iter().map(|tile| tile.position).collect()
    }

    /// Copy of the tiles currently waiting in the inactive pool.
    #[must_use]
    pub fn inactive_tiles(field: &TileField) -> Vec<TileIndex> {
        field.inactive.lock().as_slice().to_vec()
    }

    /// Reports whether the tile is currently listed in the inactive pool.
    #[must_use]
    pub fn is_pooled(field: &TileField, index: TileIndex) -> bool {
        field.inactive.lock().contains(index)
    }

    /// Translations of paved, non-factory tiles in claim order.
    #[must_use]
    pub fn paved_tile_transforms(field: &TileField) -> Vec<Mat4> {
        field
            .paved
            .tiles(field.active_tile_count())
            .filter_map(|index| field.tiles.get(index.as_usize()))
            .map(|tile| Mat4::from_translation(tile.translation()))
            .collect()
    }

    /// Transforms of trees standing on the grid.
    #[must_use]
    pub fn active_tree_transforms(field: &TileField) -> Vec<Mat4> {
        field.trees.lock().transforms().to_vec()
    }

    /// Transforms of decorative trees outside the grid.
    #[must_use]
    pub fn inactive_tree_transforms(field: &TileField) -> &[Mat4] {
        &field.decorative_trees
    }

    /// Transforms of factories raised by claims this epoch.
    #[must_use]
    pub fn factory_transforms(field: &TileField) -> Vec<Mat4> {
        field.factories.lock().clone()
    }

    /// Tiles chosen by the last reset as factory sites, duplicates included.
    #[must_use]
    pub fn factory_sites(field: &TileField) -> &[TileIndex] {
        &field.factory_sites
    }
}
