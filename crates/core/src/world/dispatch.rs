//! Per-node room generation with retries and host yield points.

use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, RetrySeeds};
use crate::control::RunControl;
use crate::dungeon::{GeneratedRoom, generate_room, room_pipeline};
use crate::rules::{PipelineError, Rule, RuleError};
use crate::seed::{mix_seed_stream, runtime_seed};
use crate::types::Pos;

use super::{WorldContext, rule_names};

/// Produces the room for one world node.
pub trait RoomSource {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn generate_room(
        &mut self,
        seed: u64,
        level_index: u32,
        world_offset: Pos,
        control: &mut RunControl<'_>,
    ) -> Result<GeneratedRoom, PipelineError>;
}

/// The regular room pipeline.
pub struct PipelineRooms {
    config: GenerationConfig,
}

impl PipelineRooms {
    pub fn new(config: &GenerationConfig) -> Self {
        Self { config: config.clone() }
    }
}

impl RoomSource for PipelineRooms {
    fn validate(&self) -> Result<(), String> {
        room_pipeline(&self.config).validate().map_err(|error| error.to_string())
    }

    fn generate_room(
        &mut self,
        seed: u64,
        level_index: u32,
        world_offset: Pos,
        control: &mut RunControl<'_>,
    ) -> Result<GeneratedRoom, PipelineError> {
        generate_room(&self.config, seed, level_index, world_offset, control)
    }
}

pub struct DispatchRooms<S = PipelineRooms> {
    enabled: bool,
    source: S,
    max_retries: u32,
    retry_seeds: RetrySeeds,
    yield_every_rooms: u32,
    require_all_rooms: bool,
    room_pixel_size: Pos,
    /// Pixel extent of one room buffer.
    room_extent: Pos,
}

impl DispatchRooms<PipelineRooms> {
    pub fn new(config: &GenerationConfig) -> Self {
        Self::with_source(config, PipelineRooms::new(config))
    }
}

impl<S: RoomSource> DispatchRooms<S> {
    pub fn with_source(config: &GenerationConfig, source: S) -> Self {
        let world = &config.world;
        Self {
            enabled: world.is_rule_enabled(rule_names::DISPATCH_ROOMS),
            source,
            max_retries: world.max_retries,
            retry_seeds: world.retry_seeds,
            yield_every_rooms: world.yield_every_rooms,
            require_all_rooms: world.require_all_rooms,
            room_pixel_size: world.room_pixel_size,
            room_extent: Pos::new(
                (config.room.tile_width() as i32).saturating_mul(config.room.tile_pixel_size),
                (config.room.tile_height() as i32).saturating_mul(config.room.tile_pixel_size),
            ),
        }
    }

    fn retry_seed(&self, original_seed: u64, attempt: u32) -> u64 {
        match self.retry_seeds {
            RetrySeeds::Derived => mix_seed_stream(original_seed, u64::from(attempt)),
            RetrySeeds::Runtime => runtime_seed(),
        }
    }

    /// First successful room and the seed that produced it, plus attempts used.
    fn generate_with_retries(
        &mut self,
        original_seed: u64,
        level_index: u32,
        world_offset: Pos,
        control: &mut RunControl<'_>,
    ) -> Result<(Option<(u64, GeneratedRoom)>, u32), RuleError> {
        let mut seed = original_seed;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                seed = self.retry_seed(original_seed, attempt);
            }
            match self.source.generate_room(seed, level_index, world_offset, control) {
                Ok(room) => return Ok((Some((seed, room)), attempt + 1)),
                Err(error) if error.is_cancelled() => return Err(RuleError::Cancelled),
                Err(error) => {
                    warn!(seed, attempt, %error, "room generation failed");
                }
            }
        }
        Ok((None, self.max_retries + 1))
    }
}

impl<S: RoomSource> Rule<WorldContext> for DispatchRooms<S> {
    fn name(&self) -> &str {
        rule_names::DISPATCH_ROOMS
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        30
    }

    fn validate(&self) -> Result<(), String> {
        // Neighbouring nodes sit one room_pixel_size apart; larger buffers would overlap.
        if self.room_extent.x > self.room_pixel_size.x || self.room_extent.y > self.room_pixel_size.y {
            return Err(format!(
                "room buffer of {}x{} pixels exceeds room_pixel_size {}x{}",
                self.room_extent.x, self.room_extent.y, self.room_pixel_size.x, self.room_pixel_size.y
            ));
        }
        self.source.validate()
    }

    fn execute(
        &mut self,
        context: &mut WorldContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let order = context.placement_order.clone();
        let mut processed = 0_u32;
        for id in order {
            control.poll()?;
            let Some(node) = context.nodes.get(id) else {
                continue;
            };
            let (original_seed, grid, world_offset) = (node.seed, node.grid, node.world_offset);
            let (outcome, attempts) =
                self.generate_with_retries(original_seed, context.level_index, world_offset, control)?;

            let Some(node) = context.nodes.get_mut(id) else {
                continue;
            };
            node.attempts = attempts;
            match outcome {
                Some((seed, room)) => {
                    node.seed = seed;
                    node.generated = true;
                    node.doors = room.door_pixels();
                    if node.doors.is_none() {
                        warn!(grid = ?grid, "room has no entrance or exit");
                    }
                    let mut spawns = room.spawns.clone();
                    context.spawns.append(&mut spawns);
                    context.rooms.insert(id, room);
                    debug!(grid = ?grid, seed, attempts, "node generated");
                }
                None => {
                    node.generated = false;
                    node.doors = None;
                    context.failed_nodes.push(id);
                    warn!(grid = ?grid, attempts, "node failed after all retries");
                    if self.require_all_rooms {
                        return Err(RuleError::Failed(format!(
                            "node at {grid:?} failed after {attempts} attempts"
                        )));
                    }
                }
            }

            processed += 1;
            if self.yield_every_rooms > 0 && processed % self.yield_every_rooms == 0 {
                control.yield_point()?;
            }
        }
        info!(
            generated = context.rooms.len(),
            failed = context.failed_nodes.len(),
            "rooms dispatched"
        );
        Ok(())
    }
}
