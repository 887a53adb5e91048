//! World regeneration: timers, scenery and factory placement.

use std::f32::consts::TAU;

use colony_core::{TileIndex, OUT_OF_BOUNDS_MARGIN};
use glam::{Mat4, Quat, Vec2, Vec3};
use rand::Rng;

use crate::TileField;

/// Counts describing the world produced by [`TileField::reset`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Trees scattered over the playable grid.
    pub active_trees: usize,
    /// Decorative trees scattered around the grid.
    pub inactive_trees: usize,
    /// Factory placements performed, duplicates included.
    pub factory_placements: usize,
    /// Distinct tiles flagged as factories.
    pub factory_tiles: usize,
}

impl TileField {
    /// Tears the field down and regenerates it from `rng`.
    ///
    /// Every tile returns to the inactive pool with a full timer, trees are
    /// scattered over and around the grid, and factory sites are drawn with
    /// replacement, so two placements may land on the same tile. Factory
    /// sites ignore trees: a factory tile may also carry a tree, which its
    /// claim removes like any other.
    pub fn reset<R>(&mut self, rng: &mut R) -> GenerationSummary
    where
        R: Rng + ?Sized,
    {
        let grid_size = self.config.grid_size;
        let tile_size = self.config.tile_size;
        let granularity = self.config.tree_granularity;

        let inactive = self.inactive.get_mut();
        let trees = self.trees.get_mut();
        inactive.clear();
        trees.clear();
        self.factories.get_mut().clear();
        self.factory_sites.clear();
        self.decorative_trees.clear();
        self.paved.clear();
        *self.active_tiles.get_mut() = 0;
        self.coverage.set(0.0);

        for (raw, tile) in self.tiles.iter_mut().enumerate() {
            let index = TileIndex::new(raw as u32);
            *tile.active.get_mut() = false;
            tile.timer.set(self.config.tile_time);
            tile.factory = false;
            inactive.push(index);

            if rng.gen_range(0..granularity) == 0 && !trees.is_full() {
                let transform = tree_transform(rng, tile.position, tile_size);
                let _ = trees.plant(index, transform);
            }
        }

        let margin = (grid_size as f32 * OUT_OF_BOUNDS_MARGIN) as i64;
        let lower = -margin;
        let upper = i64::from(grid_size) + margin;
        let half_tile = tile_size / 2.0;
        for x in lower..upper {
            for y in lower..upper {
                if in_bounds(x, grid_size) && in_bounds(y, grid_size) {
                    continue;
                }
                if rng.gen_range(0..granularity) == 0
                    && self.decorative_trees.len() < self.config.tree_count
                {
                    let centre = Vec2::new(
                        x as f32 * tile_size + half_tile,
                        y as f32 * tile_size + half_tile,
                    );
                    self.decorative_trees
                        .push(tree_transform(rng, centre, tile_size));
                }
            }
        }

        for _ in 0..self.config.max_factories {
            let x = rng.gen_range(0..grid_size);
            let y = rng.gen_range(0..grid_size);
            let index = TileIndex::from_coords(x, y, grid_size);
            self.tiles[index.as_usize()].factory = true;
            self.factory_sites.push(index);
        }

        let summary = GenerationSummary {
            active_trees: trees.len(),
            inactive_trees: self.decorative_trees.len(),
            factory_placements: self.factory_sites.len(),
            factory_tiles: self.tiles.iter().filter(|tile| tile.factory).count(),
        };
        tracing::debug!(
            active_trees = summary.active_trees,
            inactive_trees = summary.inactive_trees,
            factory_tiles = summary.factory_tiles,
            "tile field regenerated"
        );
        summary
    }
}

fn in_bounds(coordinate: i64, grid_size: u32) -> bool {
    coordinate >= 0 && coordinate < i64::from(grid_size)
}

/// Uniform draw from `[-0.5, 0.5)`.
fn centred_unit<R>(rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    rng.gen::<f32>() - 0.5
}

/// Tree standing near `centre` with jittered scale, heading and placement.
fn tree_transform<R>(rng: &mut R, centre: Vec2, tile_size: f32) -> Mat4
where
    R: Rng + ?Sized,
{
    let scale = 1.0 + centred_unit(rng) * 0.2;
    let heading = centred_unit(rng) * TAU;
    let x = centre.x + centred_unit(rng) * tile_size;
    let z = centre.y + centred_unit(rng) * tile_size;
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_rotation_y(heading),
        Vec3::new(x, 0.0, z),
    )
}
