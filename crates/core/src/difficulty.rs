//! Level and room difficulty curves and the enemy counts derived from them.

use crate::config::DifficultyConfig;
use crate::types::RoomRole;

/// Width of one enemy-count step on the difficulty axis.
const DIFFICULTY_STEP: f32 = 0.1;
/// Keeps `0.3 / 0.1` from flooring to 2.
const STEP_EPSILON: f32 = 1e-4;

pub fn level_difficulty(config: &DifficultyConfig, level_index: u32) -> f32 {
    let raw = config.base_difficulty + level_index as f32 * config.difficulty_per_level;
    clamp_difficulty(config, raw)
}

pub fn room_difficulty(
    config: &DifficultyConfig,
    level_difficulty: f32,
    role: RoomRole,
    on_critical_path: bool,
) -> f32 {
    let raw = match role {
        RoomRole::Start | RoomRole::Shop => 0.0,
        RoomRole::Boss => config.boss_difficulty,
        RoomRole::Side => level_difficulty - config.side_room_penalty,
        RoomRole::Normal | RoomRole::End if on_critical_path => {
            level_difficulty + config.critical_path_bonus
        }
        RoomRole::Normal | RoomRole::End => level_difficulty,
    };
    clamp_difficulty(config, raw)
}

pub fn enemy_count(
    config: &DifficultyConfig,
    room_difficulty: f32,
    role: RoomRole,
    on_critical_path: bool,
) -> u32 {
    match role {
        RoomRole::Start | RoomRole::Shop => 0,
        RoomRole::Boss => config.boss_room_enemy_count.max(0) as u32,
        RoomRole::End => (config.base_enemy_count / 2).max(1) as u32,
        RoomRole::Normal | RoomRole::Side => {
            let steps = (room_difficulty / DIFFICULTY_STEP + STEP_EPSILON).floor() as i32;
            let mut count = config.base_enemy_count + steps * config.enemies_per_step;
            if on_critical_path {
                count += config.critical_path_enemy_bonus;
            }
            if role == RoomRole::Side {
                count -= config.side_room_enemy_reduction;
            }
            count.clamp(1, config.max_enemies_per_room.max(1)) as u32
        }
    }
}

fn clamp_difficulty(config: &DifficultyConfig, raw: f32) -> f32 {
    raw.clamp(0.0, config.max_difficulty.max(0.0))
}
