//! Dense index pools backing the tile field.
//!
//! Every pool is a flat array paired with an implicit count. Removal swaps the
//! last element into the vacated slot, so ordering is never preserved and no
//! caller may depend on it.

use std::sync::atomic::{AtomicU32, Ordering};

use colony_core::TileIndex;
use glam::Mat4;

/// Unordered set of tile indices that have not been claimed yet.
#[derive(Debug, Default)]
pub(crate) struct InactivePool {
    indices: Vec<TileIndex>,
}

impl InactivePool {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.indices.clear();
    }

    pub(crate) fn push(&mut self, index: TileIndex) {
        self.indices.push(index);
    }

    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }

    pub(crate) fn get(&self, position: usize) -> Option<TileIndex> {
        self.indices.get(position).copied()
    }

    pub(crate) fn contains(&self, index: TileIndex) -> bool {
        self.indices.contains(&index)
    }

    pub(crate) fn as_slice(&self) -> &[TileIndex] {
        &self.indices
    }

    /// Scans for `index` and swaps the last entry into its place.
    pub(crate) fn remove(&mut self, index: TileIndex) -> bool {
        match self.indices.iter().position(|entry| *entry == index) {
            Some(position) => {
                let _ = self.indices.swap_remove(position);
                true
            }
            None => false,
        }
    }
}

/// Trees standing on the playable grid, each owned by exactly one tile.
#[derive(Debug)]
pub(crate) struct TreePool {
    transforms: Vec<Mat4>,
    owners: Vec<TileIndex>,
    by_tile: Vec<Option<usize>>,
    capacity: usize,
}

impl TreePool {
    pub(crate) fn new(tile_count: usize, capacity: usize) -> Self {
        Self {
            transforms: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
            by_tile: vec![None; tile_count],
            capacity,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.transforms.clear();
        self.owners.clear();
        self.by_tile.fill(None);
    }

    pub(crate) fn len(&self) -> usize {
        self.transforms.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.transforms.len() >= self.capacity
    }

    pub(crate) fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub(crate) fn slot_of(&self, tile: TileIndex) -> Option<usize> {
        self.by_tile.get(tile.as_usize()).copied().flatten()
    }

    /// Plants a tree on `tile`, returning its slot, or `None` once the budget is spent.
    pub(crate) fn plant(&mut self, tile: TileIndex, transform: Mat4) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.transforms.len();
        self.transforms.push(transform);
        self.owners.push(tile);
        self.by_tile[tile.as_usize()] = Some(slot);
        Some(slot)
    }

    /// Lowers the tree standing on `tile`, if any.
    pub(crate) fn sink(&mut self, tile: TileIndex, depth: f32) {
        if let Some(slot) = self.slot_of(tile) {
            self.transforms[slot].w_axis.y -= depth;
        }
    }

    /// Removes the tree standing on `tile` and re-points the tile whose tree
    /// was swapped into the vacated slot.
    pub(crate) fn remove_owned_by(&mut self, tile: TileIndex) -> bool {
        let Some(slot) = self
            .by_tile
            .get_mut(tile.as_usize())
            .and_then(Option::take)
        else {
            return false;
        };

        let _ = self.transforms.swap_remove(slot);
        let _ = self.owners.swap_remove(slot);
        if let Some(moved) = self.owners.get(slot).copied() {
            self.by_tile[moved.as_usize()] = Some(slot);
        }
        true
    }
}

const VACANT_SLOT: u32 = u32::MAX;

/// Claim-ordered record of paved tiles.
///
/// Each claimant writes only the slot handed out by the active-tile counter,
/// so writers never contend. Factory claims consume a slot without paving it
/// and leave it vacant.
#[derive(Debug)]
pub(crate) struct PavedSlots {
    slots: Vec<AtomicU32>,
}

impl PavedSlots {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| AtomicU32::new(VACANT_SLOT)).collect(),
        }
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot.get_mut() = VACANT_SLOT;
        }
    }

    pub(crate) fn fill(&self, slot: usize, tile: TileIndex) {
        if let Some(entry) = self.slots.get(slot) {
            entry.store(tile.get(), Ordering::Release);
        }
    }

    /// Tiles paved into the first `count` slots, skipping vacant ones.
    pub(crate) fn tiles(&self, count: usize) -> impl Iterator<Item = TileIndex> + '_ {
        self.slots
            .iter()
            .take(count)
            .map(|entry| entry.load(Ordering::Acquire))
            .filter(|bits| *bits != VACANT_SLOT)
            .map(TileIndex::new)
    }
}

/// `f32` accumulator supporting lock-free concurrent adds.
#[derive(Debug)]
pub(crate) struct AtomicScalar(AtomicU32);

impl AtomicScalar {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&mut self, value: f32) {
        *self.0.get_mut() = value.to_bits();
    }

    /// Adds `delta` and returns the updated value.
    pub(crate) fn add(&self, delta: f32) -> f32 {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f32::from_bits(bits) + delta).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f32::from_bits(previous) + delta
    }
}
