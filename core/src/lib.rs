#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Colony simulation.
//!
//! This crate defines the vocabulary that connects the tile field, the
//! simulation loop, unit managers and adapters. The world crate owns the
//! mutable tile state and exposes it through [`TileIndex`] handles, failures
//! are reported with [`FieldError`], and the simulation loop narrates its
//! lifecycle by broadcasting [`Event`] values that adapters may log or react
//! to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Colony.";

/// Number of tiles along each edge of the square world grid.
pub const DEFAULT_GRID_SIZE: u32 = 128;
/// Side length of a single square tile expressed in world units.
pub const DEFAULT_TILE_SIZE: f32 = 1.0;
/// Upper bound on trees placed in each tree pool during generation.
pub const DEFAULT_TREE_COUNT: usize = 4_096;
/// Denominator of the 1-in-N chance that a grid cell receives a tree.
pub const DEFAULT_TREE_GRANULARITY: u32 = 8;
/// Number of factory placements performed on every reset.
pub const DEFAULT_MAX_FACTORIES: usize = 16;
/// Coverage above which the world is torn down and regenerated.
pub const DEFAULT_COVERAGE_THRESHOLD: f32 = 0.9;
/// Seconds of paving a tile requires before it becomes active.
pub const DEFAULT_TILE_TIME: f32 = 1.0;
/// Fraction of the grid size by which decorative scenery extends past each edge.
pub const OUT_OF_BOUNDS_MARGIN: f32 = 0.2;

/// Tunable parameters describing the world grid and its generation rules.
///
/// Every field falls back to the matching `DEFAULT_*` constant when omitted
/// from a deserialised document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Number of tiles along each edge of the square grid.
    pub grid_size: u32,
    /// Side length of a single tile in world units.
    pub tile_size: f32,
    /// Maximum number of trees held by each tree pool.
    pub tree_count: usize,
    /// A cell receives a tree with probability `1 / tree_granularity`.
    pub tree_granularity: u32,
    /// Coverage contributed by one claimed tile; `None` derives `1 / tile_count`.
    pub coverage_per_tile: Option<f32>,
    /// Number of factory placements performed per reset.
    pub max_factories: usize,
    /// Coverage that must be exceeded before the world resets.
    pub coverage_threshold: f32,
    /// Countdown every tile starts with after a reset.
    pub tile_time: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            tree_count: DEFAULT_TREE_COUNT,
            tree_granularity: DEFAULT_TREE_GRANULARITY,
            coverage_per_tile: None,
            max_factories: DEFAULT_MAX_FACTORIES,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            tile_time: DEFAULT_TILE_TIME,
        }
    }
}

impl WorldConfig {
    /// Creates a configuration for a square grid using defaults elsewhere.
    #[must_use]
    pub fn with_grid_size(grid_size: u32) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    /// Total number of tiles contained in the grid.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.grid_size as usize * self.grid_size as usize
    }

    /// Coverage added to the running total each time a tile is claimed.
    #[must_use]
    pub fn coverage_per_tile(&self) -> f32 {
        match self.coverage_per_tile {
            Some(value) => value,
            None if self.grid_size == 0 => 0.0,
            None => 1.0 / self.tile_count() as f32,
        }
    }

    /// Checks that the configuration describes a world that can be generated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if u32::try_from(self.tile_count()).is_err() {
            return Err(ConfigError::GridTooLarge {
                grid_size: self.grid_size,
            });
        }
        if self.tree_granularity == 0 {
            return Err(ConfigError::ZeroTreeGranularity);
        }
        if !(self.tile_size > 0.0) {
            return Err(ConfigError::NonPositiveTileSize {
                tile_size: self.tile_size,
            });
        }
        if !(self.tile_time > 0.0) {
            return Err(ConfigError::NonPositiveTileTime {
                tile_time: self.tile_time,
            });
        }
        if !(self.coverage_threshold > 0.0 && self.coverage_threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold: self.coverage_threshold,
            });
        }
        if let Some(per_tile) = self.coverage_per_tile {
            if !(per_tile > 0.0) {
                return Err(ConfigError::NonPositiveCoverage { per_tile });
            }
        }
        Ok(())
    }
}

/// Reasons a [`WorldConfig`] is rejected by [`WorldConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid must contain at least one tile.
    #[error("grid_size must be positive")]
    EmptyGrid,
    /// Tile indices must fit in 32 bits.
    #[error("grid_size {grid_size} produces more tiles than can be indexed")]
    GridTooLarge {
        /// Offending edge length.
        grid_size: u32,
    },
    /// Tree placement divides by the granularity.
    #[error("tree_granularity must be positive")]
    ZeroTreeGranularity,
    /// Tiles need a positive extent to be positioned.
    #[error("tile_size must be positive (received {tile_size})")]
    NonPositiveTileSize {
        /// Offending tile size.
        tile_size: f32,
    },
    /// Tiles need a positive countdown to be paved over time.
    #[error("tile_time must be positive (received {tile_time})")]
    NonPositiveTileTime {
        /// Offending timer duration.
        tile_time: f32,
    },
    /// The reset threshold must lie in `(0, 1]`.
    #[error("coverage_threshold must lie in (0, 1] (received {threshold})")]
    ThresholdOutOfRange {
        /// Offending threshold.
        threshold: f32,
    },
    /// Explicit per-tile coverage must be positive.
    #[error("coverage_per_tile must be positive (received {per_tile})")]
    NonPositiveCoverage {
        /// Offending coverage increment.
        per_tile: f32,
    },
}

/// Failures reported by tile field operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum FieldError {
    /// The tile index lies outside the grid.
    #[error("tile index {index} is outside the {tile_count}-tile grid")]
    InvalidTile {
        /// Index supplied by the caller.
        index: TileIndex,
        /// Number of tiles in the grid.
        tile_count: usize,
    },
    /// A draw was requested while every tile is already active.
    #[error("no inactive tiles remain to be claimed")]
    EmptyPool,
}

/// Position of a tile within the grid, laid out as `x * grid_size + y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates a new tile index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Composes the index of the tile at grid column `x` and row `y`.
    #[must_use]
    pub const fn from_coords(x: u32, y: u32, grid_size: u32) -> Self {
        Self(x * grid_size + y)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable for slice access.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle phases of the world between resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Workers are paving tiles and coverage accrues.
    #[default]
    Building,
    /// Coverage passed the threshold; a reset is due.
    CoverageExceeded,
    /// The field is being torn down and regenerated.
    Resetting,
}

/// Lifecycle notifications broadcast by the simulation loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// A freshly generated world accepted its first tick.
    EpochStarted {
        /// Zero-based count of resets preceding this epoch.
        epoch: u64,
    },
    /// Coverage crossed the reset threshold after a tick.
    CoverageExceeded {
        /// Coverage observed after the tick.
        coverage: f32,
        /// Threshold the coverage exceeded.
        threshold: f32,
    },
    /// The world was regenerated.
    WorldReset {
        /// Epoch that begins with the regenerated world.
        epoch: u64,
        /// Active trees scattered over the playable grid.
        active_trees: usize,
        /// Decorative trees scattered outside the grid.
        inactive_trees: usize,
        /// Distinct tiles flagged as factories.
        factory_tiles: usize,
    },
}
