//! World pipeline assembly and the generated world snapshot.

use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::GenerationConfig;
use crate::control::RunControl;
use crate::dungeon::GeneratedRoom;
use crate::rules::{PipelineError, RuleEngine};
use crate::spawn::SpawnQueue;

use super::coordinates::ResolveCoordinates;
use super::dispatch::{DispatchRooms, RoomSource};
use super::placement::PlaceWorldNodes;
use super::{WorldContext, WorldNode};

pub fn world_pipeline(config: &GenerationConfig) -> RuleEngine<WorldContext> {
    RuleEngine::new("world")
        .with(PlaceWorldNodes::new(&config.world))
        .with(ResolveCoordinates::new(&config.world))
        .with(DispatchRooms::new(config))
}

/// Same pipeline with rooms produced by `source`.
pub fn world_pipeline_with_source(
    config: &GenerationConfig,
    source: impl RoomSource + 'static,
) -> RuleEngine<WorldContext> {
    RuleEngine::new("world")
        .with(PlaceWorldNodes::new(&config.world))
        .with(ResolveCoordinates::new(&config.world))
        .with(DispatchRooms::with_source(config, source))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedRoom {
    pub node: WorldNode,
    /// `None` when every attempt for the node failed.
    pub room: Option<GeneratedRoom>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedWorld {
    pub seed: u64,
    pub level_index: u32,
    pub grid_size: usize,
    /// Nodes in placement order.
    pub placements: Vec<PlacedRoom>,
    pub spawns: SpawnQueue,
}

impl GeneratedWorld {
    fn from_context(context: &WorldContext) -> Self {
        let placements = context
            .ordered_nodes()
            .map(|(id, node)| PlacedRoom { node: node.clone(), room: context.rooms.get(id).cloned() })
            .collect();
        Self {
            seed: context.seed,
            level_index: context.level_index,
            grid_size: context.grid_size,
            placements,
            spawns: context.spawns.clone(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WorldNode> {
        self.placements.iter().map(|placed| &placed.node)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &GeneratedRoom> {
        self.placements.iter().filter_map(|placed| placed.room.as_ref())
    }

    pub fn failed_count(&self) -> usize {
        self.placements.iter().filter(|placed| !placed.node.generated).count()
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(self.seed.to_le_bytes());
        bytes.extend(self.level_index.to_le_bytes());
        bytes.extend((self.grid_size as u32).to_le_bytes());
        bytes.extend((self.placements.len() as u32).to_le_bytes());
        for placed in &self.placements {
            let node = &placed.node;
            bytes.extend(node.grid.x.to_le_bytes());
            bytes.extend(node.grid.y.to_le_bytes());
            bytes.extend(node.world_offset.x.to_le_bytes());
            bytes.extend(node.world_offset.y.to_le_bytes());
            bytes.extend(node.seed.to_le_bytes());
            bytes.push(u8::from(node.generated));
            match node.doors {
                Some(doors) => {
                    bytes.push(1);
                    for pos in [doors.entrance, doors.exit] {
                        bytes.extend(pos.x.to_le_bytes());
                        bytes.extend(pos.y.to_le_bytes());
                    }
                }
                None => bytes.push(0),
            }
            match &placed.room {
                Some(room) => {
                    let room_bytes = room.canonical_bytes();
                    bytes.extend((room_bytes.len() as u32).to_le_bytes());
                    bytes.extend(room_bytes);
                }
                None => bytes.extend(0_u32.to_le_bytes()),
            }
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

pub struct WorldGenerator {
    config: GenerationConfig,
}

impl WorldGenerator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn generate(
        &self,
        seed: u64,
        control: &mut RunControl<'_>,
    ) -> Result<GeneratedWorld, PipelineError> {
        let mut context = WorldContext::new(&self.config.world, seed);
        self.run(&mut context, control)
    }

    /// Reuses `context` for another seed; everything derived from the last
    /// run is discarded first.
    pub fn regenerate(
        &self,
        context: &mut WorldContext,
        seed: u64,
        control: &mut RunControl<'_>,
    ) -> Result<GeneratedWorld, PipelineError> {
        context.reset(seed);
        self.run(context, control)
    }

    fn run(
        &self,
        context: &mut WorldContext,
        control: &mut RunControl<'_>,
    ) -> Result<GeneratedWorld, PipelineError> {
        world_pipeline(&self.config).run(context, control)?;
        let world = GeneratedWorld::from_context(context);
        info!(
            seed = world.seed,
            nodes = world.placements.len(),
            failed = world.failed_count(),
            spawns = world.spawns.len(),
            "world generated"
        );
        Ok(world)
    }
}

/// One-shot world generation without host checkpoints or cancellation.
pub fn generate_world(config: &GenerationConfig, seed: u64) -> Result<GeneratedWorld, PipelineError> {
    WorldGenerator::new(config).generate(seed, &mut RunControl::default())
}

/// Runs a world pipeline built with [`world_pipeline_with_source`] to completion.
pub fn generate_world_with(
    pipeline: &mut RuleEngine<WorldContext>,
    context: &mut WorldContext,
    control: &mut RunControl<'_>,
) -> Result<GeneratedWorld, PipelineError> {
    pipeline.run(context, control)?;
    Ok(GeneratedWorld::from_context(context))
}
