//! Footprint-aware traversal checks and passage repair on the ground layer.

use std::collections::VecDeque;

use crate::tiles::{TILE_EMPTY, TileBuffer};
use crate::types::{Pos, Side};

use super::door::DoorConstraint;
use super::graph::RoomGraph;

/// True when the `size x size` block anchored at `anchor` has no solid tile.
/// Tiles of the block that fall outside the map are ignored; the anchor itself
/// must be inside.
pub fn is_standable(ground: &TileBuffer, anchor: Pos, size: i32) -> bool {
    if !ground.in_bounds(anchor) {
        return false;
    }
    for dy in 0..size {
        for dx in 0..size {
            let tile = anchor + Pos::new(dx, dy);
            if ground.in_bounds(tile) && ground.is_solid(tile) {
                return false;
            }
        }
    }
    true
}

/// Breadth-first search over standable anchors with 4-directional moves.
/// Arriving within `size + 1` tiles (Euclidean) of `target` counts as reaching it.
pub fn find_path(ground: &TileBuffer, start: Pos, target: Pos, size: i32) -> bool {
    if !is_standable(ground, start, size) {
        return false;
    }
    let tolerance = i64::from(size + 1);
    let tolerance_squared = tolerance * tolerance;
    let width = ground.width();
    let mut visited = vec![false; width * ground.height()];
    let index = |pos: Pos| (pos.y as usize) * width + (pos.x as usize);

    let mut open = VecDeque::from([start]);
    visited[index(start)] = true;
    while let Some(current) = open.pop_front() {
        if current.distance_squared(target) <= tolerance_squared {
            return true;
        }
        for side in Side::ALL {
            let next = current.step(side);
            if !ground.in_bounds(next) || visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            if is_standable(ground, next, size) {
                open.push_back(next);
            }
        }
    }
    false
}

/// Carves a passage centred on every edge shared by two grid-adjacent rooms.
/// The cut is `passage_width` tiles wide and reaches `wall_thickness + 1`
/// tiles into each room. Returns the number of passages carved.
pub fn repair_passages(
    ground: &mut TileBuffer,
    graph: &RoomGraph,
    passage_width: i32,
    wall_thickness: i32,
) -> usize {
    let depth = wall_thickness + 1;
    let mut carved = 0;
    for (room, _, side) in graph.grid_adjacent_pairs() {
        let Some(node) = graph.node_at(room) else {
            continue;
        };
        let constraint = DoorConstraint::between(side, passage_width);
        if let Some(rect) = constraint.opening_rect(node.bounds, side, depth) {
            ground.fill_rect(rect, TILE_EMPTY);
            carved += 1;
        }
    }
    carved
}
