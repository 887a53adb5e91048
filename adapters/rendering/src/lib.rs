#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Colony adapters.
//!
//! Rendering backends never touch the tile field directly. Adapters capture a
//! [`Scene`] between simulation ticks and hand it to a [`RenderingBackend`],
//! which draws each [`InstanceBatch`] with the mesh it names.

use anyhow::Result as AnyResult;
use colony_world::{query, TileField};
use glam::{Mat4, Vec2};

/// Meshes instanced by the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mesh {
    /// Slab of cement covering a paved tile.
    PavedTile,
    /// Tree standing on or around the grid.
    Tree,
    /// Factory raised on a claimed factory tile.
    Factory,
}

/// Group of instances drawn with a single mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceBatch {
    /// Mesh drawn for every instance.
    pub mesh: Mesh,
    /// World transforms of the instances.
    pub transforms: Vec<Mat4>,
}

impl InstanceBatch {
    /// Creates a new instance batch.
    #[must_use]
    pub fn new(mesh: Mesh, transforms: Vec<Mat4>) -> Self {
        Self { mesh, transforms }
    }

    /// Number of instances in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Reports whether the batch draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Terrain geometry shared by every frame of an epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainPresentation {
    /// Tiles along each edge of the grid.
    pub grid_size: u32,
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Centres of every tile in raster order.
    pub tile_positions: Vec<Vec2>,
}

impl TerrainPresentation {
    /// Captures the terrain layout of `field`.
    #[must_use]
    pub fn from_field(field: &TileField) -> Self {
        let config = field.config();
        Self {
            grid_size: config.grid_size,
            tile_size: config.tile_size,
            tile_positions: query::tile_positions(field),
        }
    }

    /// Edge length of the grid in world units.
    #[must_use]
    pub fn extent(&self) -> f32 {
        self.grid_size as f32 * self.tile_size
    }
}

/// Instances to draw for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Paved, non-factory tiles.
    pub paved_tiles: InstanceBatch,
    /// Trees standing on the grid.
    pub active_trees: InstanceBatch,
    /// Decorative trees around the grid.
    pub inactive_trees: InstanceBatch,
    /// Factories raised this epoch.
    pub factories: InstanceBatch,
    /// Coverage at capture time.
    pub coverage: f32,
}

impl Scene {
    /// Captures the drawable state of `field`.
    ///
    /// With `render_trees` unset both tree batches are left empty.
    #[must_use]
    pub fn capture(field: &TileField, render_trees: bool) -> Self {
        let (active_trees, inactive_trees) = if render_trees {
            (
                query::active_tree_transforms(field),
                query::inactive_tree_transforms(field).to_vec(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            paved_tiles: InstanceBatch::new(Mesh::PavedTile, query::paved_tile_transforms(field)),
            active_trees: InstanceBatch::new(Mesh::Tree, active_trees),
            inactive_trees: InstanceBatch::new(Mesh::Tree, inactive_trees),
            factories: InstanceBatch::new(Mesh::Factory, query::factory_transforms(field)),
            coverage: field.coverage(),
        }
    }

    /// Batches in draw order: factories, trees, then terrain.
    pub fn batches(&self) -> impl Iterator<Item = &InstanceBatch> {
        [
            &self.factories,
            &self.active_trees,
            &self.inactive_trees,
            &self.paved_tiles,
        ]
        .into_iter()
    }

    /// Total number of instances across every batch.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.batches().map(InstanceBatch::len).sum()
    }
}

/// Rendering backend capable of presenting Colony scenes.
pub trait RenderingBackend {
    /// Prepares the backend for the terrain of a new epoch.
    fn load_terrain(&mut self, terrain: &TerrainPresentation) -> AnyResult<()>;

    /// Draws a single frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}
