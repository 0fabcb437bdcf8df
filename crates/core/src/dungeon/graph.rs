//! Room nodes and their symmetric connectivity on the room grid.

use crate::types::{DoorMarker, GridRect, Pos, RestrictedSide, RoomRole, Side};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomNode {
    pub grid: Pos,
    pub role: RoomRole,
    pub door: DoorMarker,
    pub restricted_side: RestrictedSide,
    pub on_critical_path: bool,
    /// Tile-space bounds inside the room buffer.
    pub bounds: GridRect,
    pub neighbors: Vec<Pos>,
}

impl RoomNode {
    pub fn new(grid: Pos, role: RoomRole, bounds: GridRect) -> Self {
        Self {
            grid,
            role,
            door: DoorMarker::None,
            restricted_side: RestrictedSide::Unrestricted,
            on_critical_path: false,
            bounds,
            neighbors: Vec::new(),
        }
    }

    pub fn add_neighbor(&mut self, neighbor: Pos) {
        if !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
    }

    pub fn has_neighbor_on(&self, side: Side) -> bool {
        self.neighbors.contains(&self.grid.step(side))
    }
}

/// Ordered room nodes plus a `cell_count x cell_count` adjacency matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomGraph {
    columns: usize,
    rows: usize,
    nodes: Vec<RoomNode>,
    cell_to_node: Vec<Option<usize>>,
    adjacency: Vec<u8>,
}

impl RoomGraph {
    pub fn new(columns: usize, rows: usize) -> Self {
        let cells = columns * rows;
        Self {
            columns,
            rows,
            nodes: Vec::new(),
            cell_to_node: vec![None; cells],
            adjacency: vec![0; cells * cells],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn nodes(&self) -> &[RoomNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn in_grid(&self, cell: Pos) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.columns && (cell.y as usize) < self.rows
    }

    pub fn cell_index(&self, cell: Pos) -> Option<usize> {
        self.in_grid(cell).then(|| (cell.y as usize) * self.columns + (cell.x as usize))
    }

    /// Adds a room; a cell that already holds one keeps the original.
    pub fn add_node(&mut self, node: RoomNode) -> bool {
        let Some(cell) = self.cell_index(node.grid) else {
            return false;
        };
        if self.cell_to_node[cell].is_some() {
            return false;
        }
        self.cell_to_node[cell] = Some(self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn node_at(&self, cell: Pos) -> Option<&RoomNode> {
        let index = self.cell_to_node[self.cell_index(cell)?]?;
        Some(&self.nodes[index])
    }

    pub fn node_at_mut(&mut self, cell: Pos) -> Option<&mut RoomNode> {
        let index = self.cell_to_node[self.cell_index(cell)?]?;
        Some(&mut self.nodes[index])
    }

    pub fn is_occupied(&self, cell: Pos) -> bool {
        self.node_at(cell).is_some()
    }

    /// Links two existing rooms in both directions.
    pub fn connect(&mut self, a: Pos, b: Pos) -> bool {
        let (Some(cell_a), Some(cell_b)) = (self.cell_index(a), self.cell_index(b)) else {
            return false;
        };
        if a == b || !self.is_occupied(a) || !self.is_occupied(b) {
            return false;
        }
        let cells = self.cell_count();
        self.adjacency[cell_a * cells + cell_b] = 1;
        self.adjacency[cell_b * cells + cell_a] = 1;
        if let Some(node) = self.node_at_mut(a) {
            node.add_neighbor(b);
        }
        if let Some(node) = self.node_at_mut(b) {
            node.add_neighbor(a);
        }
        true
    }

    pub fn is_connected(&self, a: Pos, b: Pos) -> bool {
        match (self.cell_index(a), self.cell_index(b)) {
            (Some(cell_a), Some(cell_b)) => {
                self.adjacency[cell_a * self.cell_count() + cell_b] == 1
            }
            _ => false,
        }
    }

    pub fn adjacency(&self) -> &[u8] {
        &self.adjacency
    }

    pub fn start(&self) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.role == RoomRole::Start)
    }

    pub fn end(&self) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.role == RoomRole::End)
    }

    pub fn count_role(&self, role: RoomRole) -> usize {
        self.nodes.iter().filter(|node| node.role == role).count()
    }

    /// Every pair of rooms sharing an edge on the grid, connected or not.
    /// Pairs are `(left, right)` or `(top, bottom)`.
    pub fn grid_adjacent_pairs(&self) -> Vec<(Pos, Pos, Side)> {
        let mut pairs = Vec::new();
        for node in &self.nodes {
            for side in [Side::Right, Side::Bottom] {
                let other = node.grid.step(side);
                if self.is_occupied(other) {
                    pairs.push((node.grid, other, side));
                }
            }
        }
        pairs
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.cell_to_node.fill(None);
        self.adjacency.fill(0);
    }
}
