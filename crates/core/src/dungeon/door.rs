//! Door placement shared by every rule that needs a room's doorway.
//! Wall carving, door clearing, path validation and world dispatch must all
//! resolve doors through [`calculate_door_position`]; a second formula would
//! let the validated path and the carved doorway drift apart.

use crate::types::{GridRect, Pos, RestrictedSide, Side};

use super::graph::RoomNode;

/// A restricted door sits 45% of the room width away from the centre.
const DOOR_SIDE_OFFSET_PERCENT: i32 = 45;

pub fn calculate_door_position(bounds: GridRect, side: RestrictedSide) -> Pos {
    let center = bounds.center();
    let offset = bounds.width.max(0) * DOOR_SIDE_OFFSET_PERCENT / 100;
    match side {
        RestrictedSide::Unrestricted => center,
        RestrictedSide::Left => Pos::new(center.x - offset, center.y),
        RestrictedSide::Right => Pos::new(center.x + offset, center.y),
    }
}

pub fn room_door_position(node: &RoomNode) -> Pos {
    calculate_door_position(node.bounds, node.restricted_side)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoorOpening {
    /// Start of the opening along the side, relative to the room origin.
    /// `None` centres the opening.
    pub offset: Option<i32>,
}

/// Required openings on a room's four sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorConstraint {
    openings: [Option<DoorOpening>; 4],
    /// Opening size along horizontal sides (top/bottom).
    pub width: i32,
    /// Opening size along vertical sides (left/right).
    pub height: i32,
}

impl DoorConstraint {
    pub fn new(width: i32, height: i32) -> Self {
        Self { openings: [None; 4], width, height }
    }

    /// One centred opening towards every connected neighbour.
    pub fn from_node(node: &RoomNode, width: i32, height: i32) -> Self {
        let mut constraint = Self::new(width, height);
        for side in Side::ALL {
            if node.has_neighbor_on(side) {
                constraint.require(side, DoorOpening::default());
            }
        }
        constraint
    }

    /// A single centred opening of `size` tiles on `side`.
    pub fn between(side: Side, size: i32) -> Self {
        let mut constraint = Self::new(size, size);
        constraint.require(side, DoorOpening::default());
        constraint
    }

    pub fn require(&mut self, side: Side, opening: DoorOpening) {
        self.openings[side.index()] = Some(opening);
    }

    pub fn opening(&self, side: Side) -> Option<DoorOpening> {
        self.openings[side.index()]
    }

    pub fn is_open(&self, side: Side) -> bool {
        self.opening(side).is_some()
    }

    /// Tiles to clear for the opening on `side`: `depth` tiles into the room
    /// and `depth` tiles past its edge, so the cut crosses both wall bands of
    /// a shared edge.
    pub fn opening_rect(&self, bounds: GridRect, side: Side, depth: i32) -> Option<GridRect> {
        let opening = self.opening(side)?;
        let span = if side.is_horizontal() { self.height } else { self.width };
        let extent = if side.is_horizontal() { bounds.height } else { bounds.width };
        let start = opening.offset.unwrap_or((extent - span) / 2);
        let rect = match side {
            Side::Left => GridRect::new(bounds.x - depth, bounds.y + start, depth * 2, span),
            Side::Right => GridRect::new(bounds.right() - depth, bounds.y + start, depth * 2, span),
            Side::Top => GridRect::new(bounds.x + start, bounds.y - depth, span, depth * 2),
            Side::Bottom => {
                GridRect::new(bounds.x + start, bounds.bottom() - depth, span, depth * 2)
            }
        };
        Some(rect)
    }
}
