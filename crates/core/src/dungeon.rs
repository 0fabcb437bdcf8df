//! Room-level generation: one tile buffer per world node, built by an ordered
//! rule pipeline over a [`DungeonContext`].

pub mod door;
pub mod graph;
pub mod path;

mod carve;
mod generator;
mod layout;
mod populate;
mod validate;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::RoomConfig;
use crate::seed::GenRng;
use crate::spawn::SpawnQueue;
use crate::tiles::TileLayers;
use crate::types::{GridRect, Pos};

pub use carve::{CarveWalls, PlaceDoors, PlacePlatforms, SynthesizeTiles};
pub use door::{DoorConstraint, DoorOpening, calculate_door_position, room_door_position};
pub use generator::{GeneratedRoom, generate_room, room_pipeline, rule_names};
pub use graph::{RoomGraph, RoomNode};
pub use layout::LayoutRoomGraph;
pub use populate::{ENTITY_BOSS, ENTITY_STANDARD_ENEMY, PopulateEnemies};
pub use validate::ValidatePath;

/// Entrance and exit of a room, in tiles or pixels depending on the owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDoors {
    pub entrance: Pos,
    pub exit: Pos,
}

/// Blackboard for one room generation run.
#[derive(Clone, Debug)]
pub struct DungeonContext {
    pub seed: u64,
    pub rng: GenRng,
    pub level_index: u32,
    /// Room grid dimensions.
    pub columns: usize,
    pub rows: usize,
    /// Tiles per room as `(width, height)`.
    pub room_size: Pos,
    pub tile_pixel_size: i32,
    /// Pixel origin of this buffer in the world.
    pub world_offset: Pos,
    pub layers: TileLayers,
    pub graph: RoomGraph,
    pub critical_path: BTreeSet<Pos>,
    pub spawns: SpawnQueue,
}

impl DungeonContext {
    pub fn new(config: &RoomConfig, seed: u64, level_index: u32, world_offset: Pos) -> Self {
        Self {
            seed,
            rng: GenRng::from_seed(seed),
            level_index,
            columns: config.columns,
            rows: config.rows,
            room_size: Pos::new(config.room_width, config.room_height),
            tile_pixel_size: config.tile_pixel_size,
            world_offset,
            layers: TileLayers::new(config.tile_width(), config.tile_height()),
            graph: RoomGraph::new(config.columns, config.rows),
            critical_path: BTreeSet::new(),
            spawns: SpawnQueue::new(),
        }
    }

    /// Reseeds and clears everything a pipeline derives, keeping the grid setup.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = GenRng::from_seed(seed);
        self.layers.clear();
        self.graph.clear();
        self.critical_path.clear();
        self.spawns.clear();
    }

    pub fn room_bounds(&self, cell: Pos) -> GridRect {
        let origin = cell * self.room_size;
        GridRect::new(origin.x, origin.y, self.room_size.x, self.room_size.y)
    }

    pub fn tile_to_pixel(&self, tile: Pos) -> Pos {
        self.world_offset + tile * self.tile_pixel_size
    }

    /// Start and End door tiles, when the graph has both rooms.
    pub fn doors(&self) -> Option<RoomDoors> {
        let start = self.graph.start()?;
        let end = self.graph.end()?;
        Some(RoomDoors { entrance: room_door_position(start), exit: room_door_position(end) })
    }
}
