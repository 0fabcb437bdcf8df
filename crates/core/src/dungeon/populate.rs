//! Enemy placement driven by the difficulty curves.

use serde_json::json;
use tracing::debug;

use crate::config::{DifficultyConfig, RoomConfig};
use crate::control::RunControl;
use crate::difficulty::{enemy_count, level_difficulty, room_difficulty};
use crate::rules::{Rule, RuleError};
use crate::spawn::SpawnRequest;
use crate::types::{Pos, RoomRole};

use super::DungeonContext;
use super::door::room_door_position;
use super::generator::rule_names;
use super::graph::RoomNode;

pub const ENTITY_STANDARD_ENEMY: &str = "enemy/standard";
pub const ENTITY_BOSS: &str = "enemy/boss";

pub struct PopulateEnemies {
    enabled: bool,
    difficulty: DifficultyConfig,
    spawn_delay_ms: u32,
    player_size: i32,
}

impl PopulateEnemies {
    pub fn new(room: &RoomConfig, difficulty: &DifficultyConfig) -> Self {
        Self {
            enabled: room.is_rule_enabled(rule_names::POPULATE),
            difficulty: difficulty.clone(),
            spawn_delay_ms: room.spawn_delay_ms,
            player_size: room.player_size,
        }
    }

    /// Empty tiles away from the doors, split into those standing on ground or
    /// a platform and those hanging in the air.
    fn candidates(
        &self,
        context: &DungeonContext,
        node: &RoomNode,
        doors: &[Pos],
    ) -> (Vec<Pos>, Vec<Pos>) {
        let ground = &context.layers.ground;
        let platform = &context.layers.platform;
        let keep_clear = i64::from(self.player_size + 1);
        let mut supported = Vec::new();
        let mut airborne = Vec::new();
        for y in node.bounds.y..node.bounds.bottom() {
            for x in node.bounds.x..node.bounds.right() {
                let tile = Pos::new(x, y);
                if ground.is_solid(tile) || platform.is_solid(tile) {
                    continue;
                }
                if doors.iter().any(|&door| door.distance_squared(tile) <= keep_clear * keep_clear) {
                    continue;
                }
                let below = Pos::new(x, y + 1);
                if ground.is_solid(below) || platform.is_solid(below) {
                    supported.push(tile);
                } else {
                    airborne.push(tile);
                }
            }
        }
        (supported, airborne)
    }
}

impl Rule<DungeonContext> for PopulateEnemies {
    fn name(&self) -> &str {
        rule_names::POPULATE
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        70
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.difficulty;
        if config.max_difficulty < 0.0 {
            return Err(format!("max_difficulty must not be negative, got {}", config.max_difficulty));
        }
        if config.max_enemies_per_room < 1 {
            return Err(format!(
                "max_enemies_per_room must be at least 1, got {}",
                config.max_enemies_per_room
            ));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let level = level_difficulty(&self.difficulty, context.level_index);
        let doors: Vec<Pos> = [context.graph.start(), context.graph.end()]
            .into_iter()
            .flatten()
            .map(room_door_position)
            .collect();
        let half_tile = context.tile_pixel_size / 2;

        let nodes = context.graph.nodes().to_vec();
        for node in &nodes {
            control.poll()?;
            let difficulty =
                room_difficulty(&self.difficulty, level, node.role, node.on_critical_path);
            let wanted = enemy_count(&self.difficulty, difficulty, node.role, node.on_critical_path);
            if wanted == 0 {
                continue;
            }

            // Floor tiles first; rooms open below may have none.
            let (mut tiles, mut airborne) = self.candidates(context, node, &doors);
            context.rng.shuffle(&mut tiles);
            context.rng.shuffle(&mut airborne);
            tiles.append(&mut airborne);
            tiles.truncate(wanted as usize);
            if tiles.len() < wanted as usize {
                debug!(room = ?node.grid, wanted, placed = tiles.len(), "room short on spawn tiles");
            }

            let entity = if node.role == RoomRole::Boss { ENTITY_BOSS } else { ENTITY_STANDARD_ENEMY };
            let payload =
                json!({ "room": node.grid, "role": node.role, "difficulty": difficulty }).to_string();
            for (index, tile) in tiles.into_iter().enumerate() {
                let position = context.tile_to_pixel(tile) + Pos::new(half_tile, half_tile);
                context.spawns.push(SpawnRequest {
                    position,
                    entity: entity.to_string(),
                    delay_ms: self.spawn_delay_ms.saturating_mul(index as u32),
                    payload: payload.clone(),
                });
            }
        }
        debug!(spawns = context.spawns.len(), "enemies queued");
        Ok(())
    }
}
