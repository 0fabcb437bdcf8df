//! World-level generation: spaced node placement on a coarse grid, pixel
//! coordinates per node, and one room pipeline run per node.

mod coordinates;
mod dispatch;
mod generator;
mod placement;
pub mod record;

use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::config::WorldConfig;
use crate::dungeon::{GeneratedRoom, RoomDoors};
use crate::seed::GenRng;
use crate::spawn::SpawnQueue;
use crate::types::Pos;

pub use coordinates::ResolveCoordinates;
pub use dispatch::{DispatchRooms, PipelineRooms, RoomSource};
pub use generator::{
    GeneratedWorld, PlacedRoom, WorldGenerator, generate_world, generate_world_with, world_pipeline,
    world_pipeline_with_source,
};
pub use placement::PlaceWorldNodes;
pub use record::{NodeRecord, RecordError, WorldRecord};

new_key_type! {
    pub struct WorldNodeId;
}

pub mod rule_names {
    pub const PLACE_NODES: &str = "place-world-nodes";
    pub const RESOLVE_COORDINATES: &str = "resolve-coordinates";
    pub const DISPATCH_ROOMS: &str = "dispatch-rooms";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldNode {
    pub grid: Pos,
    /// Pixel origin of the node's room buffer.
    pub world_offset: Pos,
    /// Placement seed until dispatch succeeds, then the seed that produced the room.
    pub seed: u64,
    pub generated: bool,
    /// Entrance and exit in world pixels.
    pub doors: Option<RoomDoors>,
    pub attempts: u32,
}

impl WorldNode {
    pub fn new(grid: Pos, seed: u64) -> Self {
        Self { grid, world_offset: Pos::default(), seed, generated: false, doors: None, attempts: 0 }
    }

    pub fn has_entrance_exit(&self) -> bool {
        self.doors.is_some()
    }
}

/// Blackboard for one world generation run.
#[derive(Clone, Debug)]
pub struct WorldContext {
    pub seed: u64,
    pub rng: GenRng,
    pub grid_size: usize,
    pub room_pixel_size: Pos,
    pub level_index: u32,
    pub nodes: SlotMap<WorldNodeId, WorldNode>,
    pub placement_order: Vec<WorldNodeId>,
    /// Row-major `grid_size * grid_size` occupancy.
    pub occupied: Vec<bool>,
    pub rooms: SecondaryMap<WorldNodeId, GeneratedRoom>,
    pub spawns: SpawnQueue,
    pub failed_nodes: Vec<WorldNodeId>,
}

impl WorldContext {
    pub fn new(config: &WorldConfig, seed: u64) -> Self {
        Self {
            seed,
            rng: GenRng::from_seed(seed),
            grid_size: config.grid_size,
            room_pixel_size: config.room_pixel_size,
            level_index: config.level_index,
            nodes: SlotMap::with_key(),
            placement_order: Vec::new(),
            occupied: vec![false; config.grid_size * config.grid_size],
            rooms: SecondaryMap::new(),
            spawns: SpawnQueue::new(),
            failed_nodes: Vec::new(),
        }
    }

    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = GenRng::from_seed(seed);
        self.nodes.clear();
        self.placement_order.clear();
        self.occupied.fill(false);
        self.rooms.clear();
        self.spawns.clear();
        self.failed_nodes.clear();
    }

    /// Nodes in the order they were placed.
    pub fn ordered_nodes(&self) -> impl Iterator<Item = (WorldNodeId, &WorldNode)> {
        self.placement_order.iter().filter_map(|&id| self.nodes.get(id).map(|node| (id, node)))
    }

    fn insert_node(&mut self, node: WorldNode) -> WorldNodeId {
        let index = (node.grid.y as usize) * self.grid_size + (node.grid.x as usize);
        self.occupied[index] = true;
        let id = self.nodes.insert(node);
        self.placement_order.push(id);
        id
    }
}

#[cfg(test)]
mod tests;
