pub mod config;
pub mod control;
pub mod difficulty;
pub mod dungeon;
pub mod handoff;
pub mod rules;
pub mod seed;
pub mod spawn;
pub mod tiles;
pub mod types;
pub mod world;

pub use config::{DifficultyConfig, GenerationConfig, RetrySeeds, RoomConfig, WorldConfig};
pub use control::{CancellationToken, Cancelled, Checkpoint, RunControl};
pub use dungeon::{DungeonContext, GeneratedRoom, RoomDoors, generate_room};
pub use handoff::{SpawnSink, TileSink};
pub use rules::{PipelineError, PipelineReport, Rule, RuleEngine, RuleError};
pub use spawn::{SpawnQueue, SpawnRequest};
pub use tiles::{TileBuffer, TileLayer, TileLayers};
pub use types::*;
pub use world::{
    GeneratedWorld, WorldContext, WorldGenerator, WorldNode, WorldNodeId, WorldRecord,
    generate_world,
};
