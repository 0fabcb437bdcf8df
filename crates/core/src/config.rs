//! Plain configuration values supplied by the host before a run starts.
//! Every struct deserializes with defaults so partial TOML/JSON files work.

use serde::{Deserialize, Serialize};

use crate::types::Pos;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub world: WorldConfig,
    pub room: RoomConfig,
    pub difficulty: DifficultyConfig,
}

/// How a failed room picks the seed for its next attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrySeeds {
    /// Sub-stream of the node seed; reruns reproduce the same world.
    #[default]
    Derived,
    /// Fresh process-unique seed per retry; not reproducible.
    Runtime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Cells per side of the square world grid.
    pub grid_size: usize,
    pub room_count: usize,
    /// Pixel extent of one world cell.
    pub room_pixel_size: Pos,
    /// Draws at or below this value skip a candidate.
    pub spawn_threshold: f32,
    pub max_rounds: usize,
    pub max_attempts_per_round: usize,
    pub max_retries: u32,
    pub retry_seeds: RetrySeeds,
    /// Rooms generated between host yield points; 0 disables yielding.
    pub yield_every_rooms: u32,
    /// Fail the whole world when any node exhausts its retries.
    pub require_all_rooms: bool,
    pub level_index: u32,
    pub disabled_rules: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            room_count: 5,
            room_pixel_size: Pos::new(2_048, 1_024),
            spawn_threshold: 0.5,
            max_rounds: 10,
            max_attempts_per_round: 64,
            max_retries: 3,
            retry_seeds: RetrySeeds::Derived,
            yield_every_rooms: 1,
            require_all_rooms: false,
            level_index: 0,
            disabled_rules: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Room grid inside one world node.
    pub columns: usize,
    pub rows: usize,
    /// Tiles per room.
    pub room_width: i32,
    pub room_height: i32,
    pub tile_pixel_size: i32,
    pub wall_thickness: i32,
    /// Agent footprint in tiles (square).
    pub player_size: i32,
    /// Extra tiles a repair passage gets beyond the agent footprint.
    pub passage_margin: i32,
    /// Probability that the critical path steps vertically instead of right.
    pub vertical_bias: f32,
    pub side_room_chance: f32,
    pub boss_room: bool,
    pub shop_room: bool,
    pub platforms_per_room: usize,
    pub min_platform_length: i32,
    pub max_platform_length: i32,
    pub spawn_delay_ms: u32,
    pub disabled_rules: Vec<String>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 3,
            room_width: 24,
            room_height: 14,
            tile_pixel_size: 16,
            wall_thickness: 1,
            player_size: 2,
            passage_margin: 2,
            vertical_bias: 0.35,
            side_room_chance: 0.4,
            boss_room: false,
            shop_room: true,
            platforms_per_room: 2,
            min_platform_length: 3,
            max_platform_length: 6,
            spawn_delay_ms: 250,
            disabled_rules: Vec::new(),
        }
    }
}

impl RoomConfig {
    pub fn tile_width(&self) -> usize {
        self.columns * self.room_width.max(0) as usize
    }

    pub fn tile_height(&self) -> usize {
        self.rows * self.room_height.max(0) as usize
    }

    pub fn passage_width(&self) -> i32 {
        self.player_size + self.passage_margin
    }

    pub fn is_rule_enabled(&self, name: &str) -> bool {
        !self.disabled_rules.iter().any(|disabled| disabled == name)
    }
}

impl WorldConfig {
    pub fn is_rule_enabled(&self, name: &str) -> bool {
        !self.disabled_rules.iter().any(|disabled| disabled == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base_difficulty: f32,
    pub difficulty_per_level: f32,
    pub max_difficulty: f32,
    pub critical_path_bonus: f32,
    pub side_room_penalty: f32,
    pub boss_difficulty: f32,
    pub base_enemy_count: i32,
    pub enemies_per_step: i32,
    pub critical_path_enemy_bonus: i32,
    pub side_room_enemy_reduction: i32,
    pub max_enemies_per_room: i32,
    pub boss_room_enemy_count: i32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_difficulty: 0.1,
            difficulty_per_level: 0.05,
            max_difficulty: 1.0,
            critical_path_bonus: 0.1,
            side_room_penalty: 0.1,
            boss_difficulty: 0.9,
            base_enemy_count: 2,
            enemies_per_step: 1,
            critical_path_enemy_bonus: 1,
            side_room_enemy_reduction: 1,
            max_enemies_per_room: 8,
            boss_room_enemy_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{ "world": { "room_count": 3 }, "room": { "rows": 2 } }"#)
                .expect("partial config parses");
        assert_eq!(config.world.room_count, 3);
        assert_eq!(config.world.grid_size, WorldConfig::default().grid_size);
        assert_eq!(config.room.rows, 2);
        assert_eq!(config.room.columns, RoomConfig::default().columns);
        assert_eq!(config.difficulty, DifficultyConfig::default());
    }

    #[test]
    fn retry_seed_policy_uses_snake_case_names() {
        let world: WorldConfig =
            serde_json::from_str(r#"{ "retry_seeds": "runtime" }"#).expect("policy parses");
        assert_eq!(world.retry_seeds, RetrySeeds::Runtime);
    }

    #[test]
    fn room_buffer_size_follows_the_room_grid() {
        let room = RoomConfig::default();
        assert_eq!(room.tile_width(), 4 * 24);
        assert_eq!(room.tile_height(), 3 * 14);
        assert_eq!(room.passage_width(), 4);
    }
}
