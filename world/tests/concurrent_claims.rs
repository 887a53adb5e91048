use std::sync::atomic::{AtomicUsize, Ordering};

use colony_core::{FieldError, TileIndex, WorldConfig};
use colony_world::{query, Claim, TileField};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const THREADS: u64 = 8;

fn generated_field(grid_size: u32, seed: u64) -> TileField {
    let config = WorldConfig {
        tree_granularity: 2,
        tree_count: 10_000,
        max_factories: 24,
        ..WorldConfig::with_grid_size(grid_size)
    };
    let mut field = TileField::new(config).expect("valid configuration");
    let _ = field.reset(&mut ChaCha8Rng::seed_from_u64(seed));
    field
}

fn assert_partition(field: &TileField) {
    let pooled = query::inactive_tiles(field);
    assert_eq!(pooled.len() + field.active_tile_count(), field.tile_count());
    for raw in 0..field.tile_count() as u32 {
        let index = TileIndex::new(raw);
        let active = field.is_active(index).expect("in range");
        assert_ne!(active, pooled.contains(&index), "tile {raw} misfiled");
    }
}

#[test]
fn racing_workers_drain_the_pool_exactly_once() {
    let field = generated_field(48, 0x5eed);
    let initial_trees = field.active_tree_count();
    let tree_tiles = (0..field.tile_count() as u32)
        .filter(|raw| {
            field
                .tree_of(TileIndex::new(*raw))
                .expect("in range")
                .is_some()
        })
        .count();
    assert_eq!(initial_trees, tree_tiles);

    let activations = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for worker in 0..THREADS {
            let field = &field;
            let activations = &activations;
            let _ = scope.spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(worker);
                loop {
                    let tile = match field.pick_inactive_tile(&mut rng) {
                        Ok(tile) => tile,
                        Err(FieldError::EmptyPool) => break,
                        Err(other) => panic!("unexpected error: {other}"),
                    };
                    if let Claim::Activated { .. } = field.claim(tile).expect("in range") {
                        let _ = activations.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    let stats = query::stats(&field);
    assert_eq!(activations.load(Ordering::Relaxed), field.tile_count());
    assert_eq!(stats.active_tiles, field.tile_count());
    assert_eq!(stats.inactive_tiles, 0);
    assert_eq!(stats.active_trees, 0);
    assert!((stats.coverage - 1.0).abs() < 1e-3, "coverage {}", stats.coverage);
    assert_eq!(
        query::paved_tile_transforms(&field).len() + stats.active_factories,
        field.tile_count()
    );
    assert_partition(&field);
}

#[test]
fn identical_claim_orders_activate_each_tile_once() {
    let field = generated_field(24, 0xfeed);
    let total = field.tile_count();
    let slots: Vec<AtomicUsize> = (0..total).map(|_| AtomicUsize::new(0)).collect();

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let field = &field;
            let slots = &slots;
            let _ = scope.spawn(move || {
                for raw in 0..total as u32 {
                    if let Claim::Activated { slot } =
                        field.claim(TileIndex::new(raw)).expect("in range")
                    {
                        let _ = slots[slot].fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert!(slots.iter().all(|slot| slot.load(Ordering::Relaxed) == 1));
    assert_eq!(field.active_tile_count(), total);
    assert_eq!(field.active_tree_count(), 0);
    assert_partition(&field);
}

#[test]
fn concurrent_paving_claims_each_tile_at_most_once() {
    let field = generated_field(16, 0xbeef);
    let completions = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let field = &field;
            let completions = &completions;
            let _ = scope.spawn(move || {
                for raw in 0..64 {
                    for _ in 0..4 {
                        if field.pave_tick(TileIndex::new(raw), 0.125).expect("in range") {
                            let _ = completions.fetch_add(1, Ordering::Relaxed);
                            break;
                        }
                    }
                }
            });
        }
    });

    // 8 threads x 4 ticks x 0.125 exhausts every timer in the first 64 tiles.
    assert_eq!(field.active_tile_count(), 64);
    assert!(completions.load(Ordering::Relaxed) >= 64);
    assert_eq!(field.inactive_tile_count(), field.tile_count() - 64);
    assert_partition(&field);
}
