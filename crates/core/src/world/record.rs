//! Persisted world record: enough to reproduce a world and check that a
//! regenerated one matches what was saved.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::Pos;

use super::generator::GeneratedWorld;

pub const RECORD_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("world record i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("world record is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported world record version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("world does not match its record: {0}")]
    Mismatch(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub grid: Pos,
    pub world_offset: Pos,
    pub seed: u64,
    pub generated: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorldRecord {
    pub format_version: u32,
    pub seed: u64,
    pub level_index: u32,
    pub grid_size: usize,
    pub nodes: Vec<NodeRecord>,
    pub content_sha256_hex: String,
}

fn content_sha256(world: &GeneratedWorld) -> String {
    let mut hasher = Sha256::new();
    hasher.update(world.canonical_bytes());
    let result = hasher.finalize();
    format!("{result:064x}")
}

impl WorldRecord {
    pub fn capture(world: &GeneratedWorld) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            seed: world.seed,
            level_index: world.level_index,
            grid_size: world.grid_size,
            nodes: world
                .nodes()
                .map(|node| NodeRecord {
                    grid: node.grid,
                    world_offset: node.world_offset,
                    seed: node.seed,
                    generated: node.generated,
                })
                .collect(),
            content_sha256_hex: content_sha256(world),
        }
    }

    pub fn write_atomic(&self, path: &Path) -> Result<(), RecordError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = fs::read_to_string(path)?;
        let record: Self = serde_json::from_str(&content)?;
        if record.format_version != RECORD_FORMAT_VERSION {
            return Err(RecordError::UnsupportedVersion { found: record.format_version });
        }
        Ok(record)
    }

    /// Checks node placement and seeds first so a mismatch names the node,
    /// then the digest of the full content.
    pub fn verify(&self, world: &GeneratedWorld) -> Result<(), RecordError> {
        if self.seed != world.seed || self.level_index != world.level_index {
            return Err(RecordError::Mismatch(format!(
                "recorded seed {} level {}, got seed {} level {}",
                self.seed, self.level_index, world.seed, world.level_index
            )));
        }
        let nodes: Vec<&_> = world.nodes().collect();
        if nodes.len() != self.nodes.len() {
            return Err(RecordError::Mismatch(format!(
                "recorded {} nodes, got {}",
                self.nodes.len(),
                nodes.len()
            )));
        }
        for (recorded, node) in self.nodes.iter().zip(nodes) {
            if recorded.grid != node.grid
                || recorded.world_offset != node.world_offset
                || recorded.seed != node.seed
                || recorded.generated != node.generated
            {
                return Err(RecordError::Mismatch(format!("node at {:?} differs", recorded.grid)));
            }
        }
        if content_sha256(world) != self.content_sha256_hex {
            return Err(RecordError::Mismatch("content digest differs".to_string()));
        }
        Ok(())
    }
}
