//! Pending entity spawns handed to the host after generation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::Pos;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// World position in pixels.
    pub position: Pos,
    /// Content key the host resolves to a prefab.
    pub entity: String,
    pub delay_ms: u32,
    /// Opaque to the generator.
    pub payload: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnQueue {
    pending: VecDeque<SpawnRequest>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: SpawnRequest) {
        self.pending.push_back(request);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.pending.iter()
    }

    pub fn append(&mut self, other: &mut SpawnQueue) {
        self.pending.append(&mut other.pending);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn drain(&mut self) -> impl Iterator<Item = SpawnRequest> + '_ {
        self.pending.drain(..)
    }
}
