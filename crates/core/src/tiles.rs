//! Flat per-layer tile buffers shared by every room rule.

use serde::{Deserialize, Serialize};

use crate::types::{GridRect, Pos};

pub const TILE_EMPTY: i8 = 0;
pub const TILE_SOLID: i8 = 1;
/// Returned for reads outside the buffer.
pub const TILE_OUT_OF_BOUNDS: i8 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileLayer {
    Background,
    Ground,
    Platform,
}

impl TileLayer {
    pub const ALL: [TileLayer; 3] = [TileLayer::Background, TileLayer::Ground, TileLayer::Platform];
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileBuffer {
    width: usize,
    height: usize,
    values: Vec<i8>,
}

impl TileBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, values: vec![TILE_EMPTY; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn get(&self, pos: Pos) -> i8 {
        if !self.in_bounds(pos) {
            return TILE_OUT_OF_BOUNDS;
        }
        self.values[self.index(pos)]
    }

    pub fn is_solid(&self, pos: Pos) -> bool {
        self.get(pos) == TILE_SOLID
    }

    pub fn set(&mut self, pos: Pos, value: i8) {
        if !self.in_bounds(pos) {
            return;
        }
        debug_assert!(value == TILE_EMPTY || value == TILE_SOLID);
        let index = self.index(pos);
        self.values[index] = value;
    }

    /// Writes `value` over the part of `rect` that lies inside the buffer.
    pub fn fill_rect(&mut self, rect: GridRect, value: i8) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.set(Pos::new(x, y), value);
            }
        }
    }

    pub fn fill(&mut self, value: i8) {
        self.values.fill(value);
    }

    pub fn count(&self, value: i8) -> usize {
        self.values.iter().filter(|&&tile| tile == value).count()
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

/// The three layers of one room buffer, always the same size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayers {
    pub background: TileBuffer,
    pub ground: TileBuffer,
    pub platform: TileBuffer,
}

impl TileLayers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            background: TileBuffer::new(width, height),
            ground: TileBuffer::new(width, height),
            platform: TileBuffer::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.ground.width()
    }

    pub fn height(&self) -> usize {
        self.ground.height()
    }

    pub fn layer(&self, layer: TileLayer) -> &TileBuffer {
        match layer {
            TileLayer::Background => &self.background,
            TileLayer::Ground => &self.ground,
            TileLayer::Platform => &self.platform,
        }
    }

    pub fn clear(&mut self) {
        self.background.fill(TILE_EMPTY);
        self.ground.fill(TILE_EMPTY);
        self.platform.fill(TILE_EMPTY);
    }
}
