use colony_core::{Event, Phase, TileIndex, WorldConfig};
use colony_system_simulation::{Simulation, UnitManager};
use colony_world::{query, TileField};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Call {
    Initialize { tiles: usize },
    Update { elapsed: f32 },
    StopWork,
    Reset { inactive: usize },
}

/// Records every call and paves a fixed list of tiles on each update.
#[derive(Debug, Default)]
struct ScriptedUnits {
    calls: Vec<Call>,
    paving: Vec<TileIndex>,
}

impl UnitManager for ScriptedUnits {
    fn initialize(&mut self, field: &TileField) {
        self.calls.push(Call::Initialize {
            tiles: field.tile_count(),
        });
    }

    fn update(&mut self, field: &TileField, elapsed: f32) {
        self.calls.push(Call::Update { elapsed });
        for tile in &self.paving {
            let _ = field.pave_tick(*tile, elapsed).expect("scripted tile in range");
        }
    }

    fn stop_work(&mut self) {
        self.calls.push(Call::StopWork);
    }

    fn reset(&mut self, field: &TileField) {
        self.calls.push(Call::Reset {
            inactive: field.inactive_tile_count(),
        });
    }
}

fn small_config() -> WorldConfig {
    WorldConfig {
        max_factories: 0,
        ..WorldConfig::with_grid_size(4)
    }
}

#[test]
fn construction_initialises_then_resets_units() {
    let simulation =
        Simulation::new(small_config(), 1, ScriptedUnits::default()).expect("valid config");

    assert_eq!(
        simulation.units().calls,
        vec![
            Call::Initialize { tiles: 16 },
            Call::StopWork,
            Call::Reset { inactive: 16 },
        ]
    );
    assert_eq!(simulation.epoch(), 0);
    assert_eq!(simulation.phase(), Phase::Building);
}

#[test]
fn update_records_the_clock_and_delegates() {
    let mut simulation =
        Simulation::new(small_config(), 1, ScriptedUnits::default()).expect("valid config");
    let mut events = Vec::new();

    simulation.update(3.0, 0.25, &mut events);

    assert_eq!(simulation.time(), 3.0);
    assert_eq!(simulation.elapsed(), 0.25);
    assert_eq!(
        simulation.units().calls.last(),
        Some(&Call::Update { elapsed: 0.25 })
    );
    assert_eq!(events, vec![Event::EpochStarted { epoch: 0 }]);

    events.clear();
    simulation.update(3.25, 0.25, &mut events);
    assert!(events.is_empty(), "epoch start is announced once");
}

#[test]
fn exceeding_the_threshold_resets_after_the_tick() {
    let mut simulation =
        Simulation::new(small_config(), 1, ScriptedUnits::default()).expect("valid config");
    for raw in 0..15 {
        let _ = simulation
            .field()
            .claim(TileIndex::new(raw))
            .expect("in range");
    }
    assert_eq!(simulation.field().coverage(), 0.9375);

    let mut events = Vec::new();
    simulation.update(1.0, 0.5, &mut events);

    assert_eq!(simulation.field().coverage(), 0.0);
    assert_eq!(simulation.field().inactive_tile_count(), 16);
    assert_eq!(simulation.epoch(), 1);
    assert_eq!(simulation.phase(), Phase::Building);
    assert!(matches!(
        events.as_slice(),
        [
            Event::EpochStarted { epoch: 0 },
            Event::CoverageExceeded { coverage, .. },
            Event::WorldReset { epoch: 1, .. },
        ] if *coverage == 0.9375
    ));

    let calls = &simulation.units().calls;
    assert_eq!(
        &calls[calls.len() - 3..],
        &[
            Call::Update { elapsed: 0.5 },
            Call::StopWork,
            Call::Reset { inactive: 16 },
        ]
    );
}

#[test]
fn coverage_below_the_threshold_keeps_building() {
    let mut simulation =
        Simulation::new(small_config(), 1, ScriptedUnits::default()).expect("valid config");
    for raw in 0..14 {
        let _ = simulation
            .field()
            .claim(TileIndex::new(raw))
            .expect("in range");
    }

    let mut events = Vec::new();
    simulation.update(1.0, 0.5, &mut events);

    assert_eq!(simulation.field().active_tile_count(), 14);
    assert_eq!(simulation.epoch(), 0);
    assert_eq!(events, vec![Event::EpochStarted { epoch: 0 }]);
}

#[test]
fn paving_workers_eventually_trigger_a_reset() {
    let units = ScriptedUnits {
        paving: (0..16).map(TileIndex::new).collect(),
        ..ScriptedUnits::default()
    };
    let mut simulation = Simulation::new(small_config(), 9, units).expect("valid config");
    let mut events = Vec::new();

    simulation.update(0.5, 0.5, &mut events);
    assert_eq!(simulation.field().active_tile_count(), 0);
    assert_eq!(query::stats(simulation.field()).inactive_tiles, 16);

    simulation.update(1.0, 0.5, &mut events);

    assert_eq!(simulation.epoch(), 1);
    assert_eq!(simulation.field().active_tile_count(), 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::WorldReset { epoch: 1, .. })));
}

#[test]
fn drained_pool_resets_even_below_the_threshold() {
    let config = WorldConfig {
        coverage_per_tile: Some(0.01),
        ..small_config()
    };
    let mut simulation =
        Simulation::new(config, 4, ScriptedUnits::default()).expect("valid config");
    for raw in 0..16 {
        let _ = simulation
            .field()
            .claim(TileIndex::new(raw))
            .expect("in range");
    }

    let mut events = Vec::new();
    simulation.update(1.0, 0.1, &mut events);

    assert_eq!(simulation.epoch(), 1);
    assert_eq!(simulation.field().inactive_tile_count(), 16);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::CoverageExceeded { .. })));
}

#[test]
fn explicit_reset_starts_a_new_epoch() {
    let mut simulation =
        Simulation::new(small_config(), 2, ScriptedUnits::default()).expect("valid config");
    let mut events = Vec::new();

    simulation.reset(&mut events);
    simulation.update(0.1, 0.1, &mut events);

    assert_eq!(simulation.epoch(), 1);
    assert!(matches!(
        events.as_slice(),
        [Event::WorldReset { epoch: 1, .. }, Event::EpochStarted { epoch: 1 }]
    ));
}

#[test]
fn same_seed_reproduces_generation() {
    let first = Simulation::new(WorldConfig::with_grid_size(16), 77, ScriptedUnits::default())
        .expect("valid config");
    let second = Simulation::new(WorldConfig::with_grid_size(16), 77, ScriptedUnits::default())
        .expect("valid config");

    assert_eq!(
        query::active_tree_transforms(first.field()),
        query::active_tree_transforms(second.field())
    );
    assert_eq!(
        query::factory_sites(first.field()),
        query::factory_sites(second.field())
    );
}
