//! Room pipeline assembly and the generated room snapshot handed to the world.

use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::GenerationConfig;
use crate::control::RunControl;
use crate::handoff::TileSink;
use crate::rules::{PipelineError, RuleEngine};
use crate::spawn::SpawnQueue;
use crate::tiles::{TileLayer, TileLayers};
use crate::types::{DoorMarker, Pos, RestrictedSide, RoomRole};

use super::carve::{CarveWalls, PlaceDoors, PlacePlatforms, SynthesizeTiles};
use super::graph::RoomGraph;
use super::layout::LayoutRoomGraph;
use super::populate::PopulateEnemies;
use super::validate::ValidatePath;
use super::{DungeonContext, RoomDoors};

pub mod rule_names {
    pub const LAYOUT: &str = "layout-room-graph";
    pub const SYNTHESIZE: &str = "synthesize-tiles";
    pub const CARVE_WALLS: &str = "carve-walls";
    pub const PLACE_PLATFORMS: &str = "place-platforms";
    pub const PLACE_DOORS: &str = "place-doors";
    pub const VALIDATE_PATH: &str = "validate-path";
    pub const POPULATE: &str = "populate-enemies";
}

pub fn room_pipeline(config: &GenerationConfig) -> RuleEngine<DungeonContext> {
    let room = &config.room;
    RuleEngine::new("room")
        .with(LayoutRoomGraph::new(room))
        .with(SynthesizeTiles::new(room))
        .with(CarveWalls::new(room))
        .with(PlacePlatforms::new(room))
        .with(PlaceDoors::new(room))
        .with(ValidatePath::new(room))
        .with(PopulateEnemies::new(room, &config.difficulty))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedRoom {
    pub seed: u64,
    pub level_index: u32,
    pub world_offset: Pos,
    pub tile_pixel_size: i32,
    pub layers: TileLayers,
    pub graph: RoomGraph,
    /// Critical path cells in ascending grid order.
    pub critical_path: Vec<Pos>,
    /// Entrance and exit tiles, local to this buffer.
    pub doors: Option<RoomDoors>,
    pub spawns: SpawnQueue,
}

impl GeneratedRoom {
    fn from_context(context: DungeonContext) -> Self {
        let doors = context.doors();
        Self {
            seed: context.seed,
            level_index: context.level_index,
            world_offset: context.world_offset,
            tile_pixel_size: context.tile_pixel_size,
            layers: context.layers,
            graph: context.graph,
            critical_path: context.critical_path.into_iter().collect(),
            doors,
            spawns: context.spawns,
        }
    }

    /// Entrance and exit in world pixels.
    pub fn door_pixels(&self) -> Option<RoomDoors> {
        let to_pixels = |tile: Pos| self.world_offset + tile * self.tile_pixel_size;
        self.doors.map(|doors| RoomDoors {
            entrance: to_pixels(doors.entrance),
            exit: to_pixels(doors.exit),
        })
    }

    pub fn render_into(&self, sink: &mut dyn TileSink, theme: &str) {
        for layer in TileLayer::ALL {
            let buffer = self.layers.layer(layer);
            sink.consume_layer(layer, buffer.width(), buffer.height(), buffer.values(), theme);
        }
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(self.seed.to_le_bytes());
        bytes.extend(self.level_index.to_le_bytes());
        bytes.extend(self.world_offset.x.to_le_bytes());
        bytes.extend(self.world_offset.y.to_le_bytes());
        bytes.extend((self.layers.width() as u32).to_le_bytes());
        bytes.extend((self.layers.height() as u32).to_le_bytes());
        for layer in TileLayer::ALL {
            bytes.extend(self.layers.layer(layer).values().iter().map(|&tile| tile as u8));
        }

        bytes.extend((self.graph.len() as u32).to_le_bytes());
        for node in self.graph.nodes() {
            bytes.extend(node.grid.x.to_le_bytes());
            bytes.extend(node.grid.y.to_le_bytes());
            bytes.push(match node.role {
                RoomRole::Start => 0,
                RoomRole::End => 1,
                RoomRole::Normal => 2,
                RoomRole::Side => 3,
                RoomRole::Boss => 4,
                RoomRole::Shop => 5,
            });
            bytes.push(match node.door {
                DoorMarker::None => 0,
                DoorMarker::Entrance => 1,
                DoorMarker::Exit => 2,
            });
            bytes.push(match node.restricted_side {
                RestrictedSide::Unrestricted => 0,
                RestrictedSide::Left => 1,
                RestrictedSide::Right => 2,
            });
        }
        bytes.extend(self.graph.adjacency());

        for cell in &self.critical_path {
            bytes.extend(cell.x.to_le_bytes());
            bytes.extend(cell.y.to_le_bytes());
        }

        bytes.extend((self.spawns.len() as u32).to_le_bytes());
        for request in self.spawns.iter() {
            bytes.extend(request.position.x.to_le_bytes());
            bytes.extend(request.position.y.to_le_bytes());
            bytes.extend(request.delay_ms.to_le_bytes());
            bytes.extend(request.entity.as_bytes());
            bytes.push(0);
            bytes.extend(request.payload.as_bytes());
            bytes.push(0);
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

/// Runs the full room pipeline for one world node.
pub fn generate_room(
    config: &GenerationConfig,
    seed: u64,
    level_index: u32,
    world_offset: Pos,
    control: &mut RunControl<'_>,
) -> Result<GeneratedRoom, PipelineError> {
    let mut context = DungeonContext::new(&config.room, seed, level_index, world_offset);
    let report = room_pipeline(config).run(&mut context, control)?;
    let room = GeneratedRoom::from_context(context);
    info!(
        seed,
        rooms = room.graph.len(),
        spawns = room.spawns.len(),
        rules = report.executed.len(),
        "room generated"
    );
    Ok(room)
}
