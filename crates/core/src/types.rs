use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Integer coordinate used for grid cells, tiles and pixels alike.
/// Rows grow downwards: `y == 0` is the top row.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, side: Side) -> Self {
        self + side.offset()
    }

    /// Chebyshev distance, the metric behind the world spacing rule.
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    /// The eight cells around `self`, orthogonal first.
    pub fn ring(self) -> [Pos; 8] {
        [
            Pos::new(self.x, self.y - 1),
            Pos::new(self.x + 1, self.y),
            Pos::new(self.x, self.y + 1),
            Pos::new(self.x - 1, self.y),
            Pos::new(self.x - 1, self.y - 1),
            Pos::new(self.x + 1, self.y - 1),
            Pos::new(self.x + 1, self.y + 1),
            Pos::new(self.x - 1, self.y + 1),
        ]
    }
}

impl Add for Pos {
    type Output = Pos;

    fn add(self, rhs: Pos) -> Pos {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Pos;

    fn sub(self, rhs: Pos) -> Pos {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Component-wise product, e.g. grid cell times cell size.
impl Mul for Pos {
    type Output = Pos;

    fn mul(self, rhs: Pos) -> Pos {
        Pos::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Mul<i32> for Pos {
    type Output = Pos;

    fn mul(self, rhs: i32) -> Pos {
        Pos::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned integer rectangle. `right()` and `bottom()` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub fn center(self) -> Pos {
        Pos::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x < self.right() && pos.y >= self.y && pos.y < self.bottom()
    }

    /// Band of `thickness` tiles running along the inside of `side`.
    pub fn edge_band(self, side: Side, thickness: i32) -> GridRect {
        let thickness = thickness.clamp(0, self.width.min(self.height));
        match side {
            Side::Left => GridRect::new(self.x, self.y, thickness, self.height),
            Side::Right => {
                GridRect::new(self.right() - thickness, self.y, thickness, self.height)
            }
            Side::Top => GridRect::new(self.x, self.y, self.width, thickness),
            Side::Bottom => {
                GridRect::new(self.x, self.bottom() - thickness, self.width, thickness)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn offset(self) -> Pos {
        match self {
            Side::Left => Pos::new(-1, 0),
            Side::Right => Pos::new(1, 0),
            Side::Top => Pos::new(0, -1),
            Side::Bottom => Pos::new(0, 1),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Which wall a room's door is pushed towards.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RestrictedSide {
    #[default]
    Unrestricted,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomRole {
    Start,
    /// The exit room of a level.
    End,
    Normal,
    Side,
    Boss,
    Shop,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DoorMarker {
    #[default]
    None,
    Entrance,
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_center_uses_integer_halves() {
        assert_eq!(GridRect::new(0, 0, 20, 20).center(), Pos::new(10, 10));
        assert_eq!(GridRect::new(10, 4, 7, 5).center(), Pos::new(13, 6));
    }

    #[test]
    fn edge_bands_stay_inside_the_rect() {
        let rect = GridRect::new(10, 20, 8, 6);
        assert_eq!(rect.edge_band(Side::Left, 2), GridRect::new(10, 20, 2, 6));
        assert_eq!(rect.edge_band(Side::Right, 2), GridRect::new(16, 20, 2, 6));
        assert_eq!(rect.edge_band(Side::Top, 1), GridRect::new(10, 20, 8, 1));
        assert_eq!(rect.edge_band(Side::Bottom, 1), GridRect::new(10, 25, 8, 1));
    }

    #[test]
    fn ring_covers_all_chebyshev_neighbours() {
        let center = Pos::new(3, 3);
        let ring = center.ring();
        assert_eq!(ring.len(), 8);
        assert!(ring.iter().all(|pos| center.chebyshev(*pos) == 1));
    }
}
