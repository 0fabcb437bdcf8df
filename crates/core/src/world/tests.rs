//! Placement, dispatch retry policy and cancellation behaviour of the world pipeline.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::*;
use crate::config::{GenerationConfig, RetrySeeds};
use crate::control::{CancellationToken, RunControl};
use crate::dungeon::generate_room;
use crate::rules::{PipelineError, Rule, RuleError};
use crate::seed::mix_seed_stream;

fn small_config() -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.room.columns = 2;
    config.room.rows = 1;
    config.room.room_width = 12;
    config.room.room_height = 10;
    config
}

fn assert_spaced(nodes: &[Pos]) {
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(a.chebyshev(*b) >= 2, "{a:?} and {b:?} touch");
        }
    }
}

fn place(config: &GenerationConfig, seed: u64) -> Result<WorldContext, RuleError> {
    let mut context = WorldContext::new(&config.world, seed);
    PlaceWorldNodes::new(&config.world).execute(&mut context, &mut RunControl::default())?;
    Ok(context)
}

fn grids(context: &WorldContext) -> Vec<Pos> {
    context.ordered_nodes().map(|(_, node)| node.grid).collect()
}

#[test]
fn placed_nodes_never_touch() {
    let config = GenerationConfig::default();
    for seed in 0..100 {
        let context = place(&config, seed).expect("placement succeeds");
        let cells = grids(&context);
        assert_eq!(cells.len(), config.world.room_count, "seed={seed}");
        assert_spaced(&cells);
    }
}

#[test]
fn four_by_four_grid_fits_four_spaced_nodes() {
    let mut config = GenerationConfig::default();
    config.world.grid_size = 4;
    config.world.room_count = 4;
    config.world.spawn_threshold = 0.5;
    let context = place(&config, 42).expect("placement succeeds");
    let cells = grids(&context);
    assert_eq!(cells.len(), 4);
    assert_spaced(&cells);
    assert_eq!(context.occupied.iter().filter(|&&cell| cell).count(), 4);
}

#[test]
fn threshold_of_one_falls_back_to_raster_order() {
    let mut config = GenerationConfig::default();
    config.world.spawn_threshold = 1.0;
    let context = place(&config, 3).expect("raster fallback fills the target");
    assert_eq!(
        grids(&context),
        vec![Pos::new(0, 0), Pos::new(2, 0), Pos::new(4, 0), Pos::new(0, 2), Pos::new(2, 2)]
    );
}

#[test]
fn overfull_grid_reports_exhaustion() {
    let mut config = GenerationConfig::default();
    config.world.grid_size = 3;
    config.world.room_count = 5;
    let error = place(&config, 1).expect_err("at most four spaced nodes fit 3x3");
    assert!(matches!(error, RuleError::Failed(message) if message.contains("exhausted")));
}

#[test]
fn out_of_range_threshold_is_a_configuration_error() {
    let mut config = GenerationConfig::default();
    config.world.spawn_threshold = 1.5;
    let error = world_pipeline(&config).validate().expect_err("threshold above one");
    assert!(matches!(error, PipelineError::InvalidRule { ref rule, .. } if rule == rule_names::PLACE_NODES));
}

#[test]
fn room_config_errors_surface_before_placement() {
    let mut config = small_config();
    config.room.wall_thickness = 0;
    let error = generate_world(&config, 1).expect_err("room pipeline is misconfigured");
    assert!(matches!(error, PipelineError::InvalidRule { ref rule, .. } if rule == rule_names::DISPATCH_ROOMS));
}

#[test]
fn room_buffers_larger_than_a_node_are_rejected() {
    let mut config = small_config();
    config.room.columns = 12;
    let error = world_pipeline(&config).validate().expect_err("12 * 12 * 16 px exceeds 2048");
    assert!(matches!(error, PipelineError::InvalidRule { ref rule, ref message } if rule == rule_names::DISPATCH_ROOMS && message.contains("room_pixel_size")));

    config.world.room_pixel_size = Pos::new(12 * 12 * 16, 1_024);
    world_pipeline(&config).validate().expect("buffer fits exactly");
}

#[test]
fn same_seed_same_world() {
    let config = small_config();
    let a = generate_world(&config, 1234).expect("world a");
    let b = generate_world(&config, 1234).expect("world b");
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a, b);

    let c = generate_world(&config, 1235).expect("world c");
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn dispatched_nodes_carry_offsets_and_pixel_doors() {
    let config = small_config();
    let world = generate_world(&config, 99).expect("world");
    assert_eq!(world.failed_count(), 0);
    for placed in &world.placements {
        let node = &placed.node;
        assert_eq!(node.world_offset, node.grid * config.world.room_pixel_size);
        assert!(node.generated);
        assert_eq!(node.attempts, 1);
        let room = placed.room.as_ref().expect("room output kept");
        assert_eq!(room.world_offset, node.world_offset);
        assert_eq!(node.doors, room.door_pixels());
        assert!(node.has_entrance_exit());
    }
    let room_spawns: usize = world.rooms().map(|room| room.spawns.len()).sum();
    assert_eq!(world.spawns.len(), room_spawns);
}

#[test]
fn regenerate_matches_a_fresh_run() {
    let config = small_config();
    let generator = WorldGenerator::new(&config);
    let mut context = WorldContext::new(&config.world, 1);
    generator.regenerate(&mut context, 5, &mut RunControl::default()).expect("first");
    let reused = generator.regenerate(&mut context, 6, &mut RunControl::default()).expect("second");
    let fresh = generator.generate(6, &mut RunControl::default()).expect("fresh");
    assert_eq!(reused, fresh);
}

#[test]
fn yields_once_per_dispatched_room() {
    let config = small_config();
    let mut steps = Vec::new();
    let mut control = RunControl::default().with_checkpoint(|step: u64| steps.push(step));
    WorldGenerator::new(&config).generate(7, &mut control).expect("world");
    assert_eq!(control.yields(), config.world.room_count as u64);
    drop(control);
    assert_eq!(steps, (1..=config.world.room_count as u64).collect::<Vec<_>>());
}

#[test]
fn cancellation_at_a_yield_point_stops_dispatch() {
    let config = small_config();
    let token = CancellationToken::new();
    let canceller = token.clone();
    let mut control = RunControl::new(token).with_checkpoint(move |step: u64| {
        if step == 1 {
            canceller.cancel();
        }
    });
    let error = WorldGenerator::new(&config).generate(7, &mut control).expect_err("cancelled");
    assert_eq!(error, PipelineError::Cancelled { rule: rule_names::DISPATCH_ROOMS.to_string() });
}

/// Fails the first `failures` attempts for every node, then defers to the real pipeline.
struct FlakyRooms {
    config: GenerationConfig,
    failures: u32,
    attempts: Rc<RefCell<BTreeMap<Pos, Vec<u64>>>>,
}

impl RoomSource for FlakyRooms {
    fn generate_room(
        &mut self,
        seed: u64,
        level_index: u32,
        world_offset: Pos,
        control: &mut RunControl<'_>,
    ) -> Result<crate::dungeon::GeneratedRoom, PipelineError> {
        let mut attempts = self.attempts.borrow_mut();
        let seeds = attempts.entry(world_offset).or_default();
        seeds.push(seed);
        if seeds.len() as u32 <= self.failures {
            return Err(PipelineError::RuleFailed {
                rule: "validate-path".to_string(),
                message: "exit unreachable".to_string(),
            });
        }
        generate_room(&self.config, seed, level_index, world_offset, control)
    }
}

fn flaky_world(
    config: &GenerationConfig,
    failures: u32,
) -> (Result<GeneratedWorld, PipelineError>, BTreeMap<Pos, Vec<u64>>) {
    let attempts = Rc::new(RefCell::new(BTreeMap::new()));
    let source = FlakyRooms { config: config.clone(), failures, attempts: Rc::clone(&attempts) };
    let mut pipeline = world_pipeline_with_source(config, source);
    let mut context = WorldContext::new(&config.world, 2024);
    let result = generate_world_with(&mut pipeline, &mut context, &mut RunControl::default());
    drop(pipeline);
    let attempts = attempts.borrow().clone();
    (result, attempts)
}

#[test]
fn failed_rooms_retry_with_derived_seeds() {
    let mut config = small_config();
    config.world.max_retries = 3;
    let (result, attempts) = flaky_world(&config, 2);
    let world = result.expect("third attempt succeeds");

    for placed in &world.placements {
        let node = &placed.node;
        let seeds = &attempts[&node.world_offset];
        assert_eq!(seeds.len(), 3);
        assert_eq!(node.attempts, 3);
        assert_eq!(seeds[1], mix_seed_stream(seeds[0], 1));
        assert_eq!(seeds[2], mix_seed_stream(seeds[0], 2));
        assert_eq!(node.seed, seeds[2], "resolved seed is the one that succeeded");
        assert!(node.generated);
    }
}

#[test]
fn derived_retries_are_reproducible() {
    let mut config = small_config();
    config.world.max_retries = 2;
    let (first, _) = flaky_world(&config, 1);
    let (second, _) = flaky_world(&config, 1);
    assert_eq!(
        first.expect("first").fingerprint(),
        second.expect("second").fingerprint()
    );
}

#[test]
fn runtime_retry_seeds_differ_from_the_original() {
    let mut config = small_config();
    config.world.max_retries = 1;
    config.world.retry_seeds = RetrySeeds::Runtime;
    let (result, attempts) = flaky_world(&config, 1);
    let world = result.expect("second attempt succeeds");
    for node in world.nodes() {
        let seeds = &attempts[&node.world_offset];
        assert_ne!(seeds[0], seeds[1]);
        assert_eq!(node.seed, seeds[1]);
    }
}

#[test]
fn exhausted_nodes_fail_without_aborting_siblings() {
    let mut config = small_config();
    config.world.max_retries = 2;
    let (result, attempts) = flaky_world(&config, 10);
    let world = result.expect("failed nodes are tolerated");

    assert_eq!(world.failed_count(), config.world.room_count);
    assert!(world.rooms().next().is_none());
    assert!(world.spawns.is_empty());
    for node in world.nodes() {
        assert_eq!(node.attempts, 3);
        assert!(!node.has_entrance_exit());
        assert_eq!(attempts[&node.world_offset].len(), 3);
    }
}

#[test]
fn strict_worlds_fail_on_the_first_exhausted_node() {
    let mut config = small_config();
    config.world.max_retries = 1;
    config.world.require_all_rooms = true;
    let (result, attempts) = flaky_world(&config, 10);
    let error = result.expect_err("strict policy");
    assert!(matches!(error, PipelineError::RuleFailed { ref rule, .. } if rule == rule_names::DISPATCH_ROOMS));
    assert_eq!(attempts.len(), 1, "siblings are not attempted after the failure");
}

#[test]
fn reset_discards_nodes_and_rooms() {
    let config = small_config();
    let mut context = WorldContext::new(&config.world, 4);
    world_pipeline(&config).run(&mut context, &mut RunControl::default()).expect("world");
    assert!(!context.nodes.is_empty());

    context.reset(5);
    assert_eq!(context.seed, 5);
    assert!(context.nodes.is_empty());
    assert!(context.placement_order.is_empty());
    assert!(context.rooms.is_empty());
    assert!(context.spawns.is_empty());
    assert!(context.occupied.iter().all(|&cell| !cell));
    assert_eq!(context.grid_size, config.world.grid_size);
}
