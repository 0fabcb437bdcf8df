use levelgen::dungeon::path::find_path;
use levelgen::dungeon::rule_names as room_rules;
use levelgen::world::rule_names as world_rules;
use levelgen::{
    CancellationToken, GenerationConfig, GeneratedWorld, PipelineError, RoomRole, RunControl,
    WorldGenerator, generate_world,
};
use proptest::{
    arbitrary::any,
    test_runner::{Config as ProptestConfig, TestCaseError, TestRunner},
};

fn check_world(config: &GenerationConfig, world: &GeneratedWorld) -> Result<(), String> {
    if world.failed_count() != 0 {
        return Err(format!("{} nodes failed to generate", world.failed_count()));
    }
    let nodes: Vec<_> = world.nodes().collect();
    if nodes.len() != config.world.room_count {
        return Err(format!("expected {} nodes, got {}", config.world.room_count, nodes.len()));
    }
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.grid.chebyshev(b.grid) < 2 {
                return Err(format!("nodes {:?} and {:?} touch", a.grid, b.grid));
            }
        }
    }
    for room in world.rooms() {
        if room.graph.count_role(RoomRole::Start) != 1 || room.graph.count_role(RoomRole::End) != 1 {
            return Err(format!("room seed {} lacks a unique start or end", room.seed));
        }
        let doors = room.doors.ok_or_else(|| format!("room seed {} has no doors", room.seed))?;
        if !find_path(&room.layers.ground, doors.entrance, doors.exit, config.room.player_size) {
            return Err(format!("room seed {} has no traversable path", room.seed));
        }
        let cells = room.graph.cell_count();
        let adjacency = room.graph.adjacency();
        for i in 0..cells {
            for j in 0..cells {
                if adjacency[i * cells + j] != adjacency[j * cells + i] {
                    return Err(format!("room seed {} has asymmetric adjacency", room.seed));
                }
            }
        }
    }
    Ok(())
}

#[test]
fn generated_worlds_hold_spacing_and_traversal_invariants() {
    let mut config = GenerationConfig::default();
    config.room.boss_room = true;
    let mut runner = TestRunner::new(ProptestConfig { cases: 24, ..ProptestConfig::default() });
    runner
        .run(&any::<u64>(), |seed| {
            let world = generate_world(&config, seed)
                .map_err(|error| TestCaseError::fail(format!("seed {seed}: {error}")))?;
            check_world(&config, &world)
                .map_err(|message| TestCaseError::fail(format!("seed {seed}: {message}")))
        })
        .expect("world invariants hold");
}

#[test]
fn room_geometry_never_seals_the_exit() {
    let mut runner = TestRunner::new(ProptestConfig { cases: 32, ..ProptestConfig::default() });
    let geometry = (any::<u64>(), 12_i32..=32, 10_i32..=20, 1_i32..=3, any::<u8>());
    runner
        .run(&geometry, |(seed, room_width, room_height, player_size, wall_roll)| {
            let mut config = GenerationConfig::default();
            config.world.room_count = 2;
            config.room.columns = 3;
            config.room.rows = 2;
            config.room.room_width = room_width;
            config.room.room_height = room_height;
            config.room.player_size = player_size;
            let max_wall = (room_width.min(room_height) - player_size) / 2;
            config.room.wall_thickness = 1 + i32::from(wall_roll) % max_wall;

            let label = format!(
                "seed {seed} room {room_width}x{room_height} agent {player_size} wall {}",
                config.room.wall_thickness
            );
            let world = generate_world(&config, seed)
                .map_err(|error| TestCaseError::fail(format!("{label}: {error}")))?;
            check_world(&config, &world)
                .map_err(|message| TestCaseError::fail(format!("{label}: {message}")))
        })
        .expect("every room geometry stays traversable");
}

#[test]
fn tight_grids_still_fit_every_node() {
    let mut config = GenerationConfig::default();
    config.world.grid_size = 4;
    config.world.room_count = 4;
    config.room.columns = 2;
    config.room.rows = 2;
    for seed in 0..30 {
        let world = generate_world(&config, seed).expect("4 nodes fit a 4x4 grid");
        check_world(&config, &world).unwrap_or_else(|message| panic!("seed {seed}: {message}"));
    }
}

#[test]
fn cancelled_token_stops_before_placement() {
    let token = CancellationToken::new();
    token.cancel();
    let error = WorldGenerator::new(&GenerationConfig::default())
        .generate(1, &mut RunControl::new(token))
        .expect_err("cancelled");
    assert_eq!(error, PipelineError::Cancelled { rule: world_rules::PLACE_NODES.to_string() });
}

#[test]
fn zero_yield_interval_never_calls_the_host() {
    let mut config = GenerationConfig::default();
    config.world.yield_every_rooms = 0;
    let mut steps = Vec::new();
    let mut control = RunControl::default().with_checkpoint(|step: u64| steps.push(step));
    WorldGenerator::new(&config).generate(3, &mut control).expect("world");
    assert_eq!(control.yields(), 0);
    drop(control);
    assert!(steps.is_empty());
}

#[test]
fn every_second_room_yields_when_configured() {
    let mut config = GenerationConfig::default();
    config.world.room_count = 5;
    config.world.yield_every_rooms = 2;
    let mut control = RunControl::default();
    WorldGenerator::new(&config).generate(3, &mut control).expect("world");
    assert_eq!(control.yields(), 2);
}

#[test]
fn disabling_enemy_population_leaves_worlds_empty() {
    let mut config = GenerationConfig::default();
    config.room.disabled_rules = vec![room_rules::POPULATE.to_string()];
    let world = generate_world(&config, 8).expect("world");
    assert!(world.spawns.is_empty());
    assert_eq!(world.rooms().count(), config.world.room_count);
}
