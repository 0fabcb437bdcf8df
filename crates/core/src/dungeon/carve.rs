//! Tile-writing rules: base synthesis, walls, one-way platforms and doorways.

use tracing::debug;

use crate::config::RoomConfig;
use crate::control::RunControl;
use crate::rules::{Rule, RuleError};
use crate::tiles::{TILE_EMPTY, TILE_SOLID};
use crate::types::{GridRect, Pos, Side};

use super::DungeonContext;
use super::door::{DoorConstraint, room_door_position};
use super::generator::rule_names;

/// Ground is solid outside rooms and empty inside them; the background layer
/// marks room interiors.
pub struct SynthesizeTiles {
    enabled: bool,
}

impl SynthesizeTiles {
    pub fn new(config: &RoomConfig) -> Self {
        Self { enabled: config.is_rule_enabled(rule_names::SYNTHESIZE) }
    }
}

impl Rule<DungeonContext> for SynthesizeTiles {
    fn name(&self) -> &str {
        rule_names::SYNTHESIZE
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        20
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        _control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let layers = &mut context.layers;
        layers.ground.fill(TILE_SOLID);
        layers.background.fill(TILE_EMPTY);
        layers.platform.fill(TILE_EMPTY);
        for node in context.graph.nodes() {
            layers.ground.fill_rect(node.bounds, TILE_EMPTY);
            layers.background.fill_rect(node.bounds, TILE_SOLID);
        }
        Ok(())
    }
}

/// Room bounds minus a wall band of `wall_thickness` on every side.
fn interior(bounds: GridRect, wall_thickness: i32) -> GridRect {
    let inset = wall_thickness.max(0);
    GridRect::new(
        bounds.x + inset,
        bounds.y + inset,
        bounds.width - inset * 2,
        bounds.height - inset * 2,
    )
}

/// Closes every room side that has no connected neighbour.
pub struct CarveWalls {
    enabled: bool,
    wall_thickness: i32,
    passage_width: i32,
    player_size: i32,
    room_width: i32,
    room_height: i32,
}

impl CarveWalls {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::CARVE_WALLS),
            wall_thickness: config.wall_thickness,
            passage_width: config.passage_width(),
            player_size: config.player_size,
            room_width: config.room_width,
            room_height: config.room_height,
        }
    }
}

impl Rule<DungeonContext> for CarveWalls {
    fn name(&self) -> &str {
        rule_names::CARVE_WALLS
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        30
    }

    fn validate(&self) -> Result<(), String> {
        if self.wall_thickness < 1 {
            return Err(format!("wall_thickness must be positive, got {}", self.wall_thickness));
        }
        // Walls on opposite sides must leave room for the agent between them.
        let span = self.room_width.min(self.room_height);
        if self.wall_thickness * 2 + self.player_size > span {
            return Err(format!(
                "wall_thickness {} leaves no {}-tile interior in a {}x{} room",
                self.wall_thickness, self.player_size, self.room_width, self.room_height
            ));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let mut bands = 0_usize;
        for node in context.graph.nodes() {
            control.poll()?;
            let constraint = DoorConstraint::from_node(node, self.passage_width, self.passage_width);
            for side in Side::ALL {
                if constraint.is_open(side) {
                    continue;
                }
                let band = node.bounds.edge_band(side, self.wall_thickness);
                context.layers.ground.fill_rect(band, TILE_SOLID);
                bands += 1;
            }
        }
        debug!(bands, "walls carved");
        Ok(())
    }
}

/// Seeded horizontal platforms. They live on their own layer so they never
/// block ground traversal.
pub struct PlacePlatforms {
    enabled: bool,
    per_room: usize,
    min_length: i32,
    max_length: i32,
    wall_thickness: i32,
}

impl PlacePlatforms {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::PLACE_PLATFORMS),
            per_room: config.platforms_per_room,
            min_length: config.min_platform_length,
            max_length: config.max_platform_length,
            wall_thickness: config.wall_thickness,
        }
    }
}

impl Rule<DungeonContext> for PlacePlatforms {
    fn name(&self) -> &str {
        rule_names::PLACE_PLATFORMS
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        40
    }

    fn validate(&self) -> Result<(), String> {
        if self.min_length < 1 || self.min_length > self.max_length {
            return Err(format!(
                "platform length range {}..={} is empty",
                self.min_length, self.max_length
            ));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        _control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let rooms: Vec<GridRect> = context.graph.nodes().iter().map(|node| node.bounds).collect();
        let mut placed = 0_usize;
        for bounds in rooms {
            let interior = interior(bounds, self.wall_thickness);
            // Keep the top two and bottom two interior rows free.
            if interior.width < self.min_length || interior.height < 5 {
                continue;
            }
            let max_length = self.max_length.min(interior.width);
            for _ in 0..self.per_room {
                let length = context.rng.range_i32(self.min_length, max_length);
                let x = context.rng.range_i32(interior.x, interior.right() - length);
                let y = context.rng.range_i32(interior.y + 2, interior.bottom() - 3);
                context.layers.platform.fill_rect(GridRect::new(x, y, length, 1), TILE_SOLID);
                placed += 1;
            }
        }
        debug!(placed, "platforms placed");
        Ok(())
    }
}

/// Clears a channel from the entrance and exit into the room interior so both
/// doors are standable and connected even when they sit inside a wall band.
pub struct PlaceDoors {
    enabled: bool,
    player_size: i32,
    wall_thickness: i32,
}

impl PlaceDoors {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::PLACE_DOORS),
            player_size: config.player_size,
            wall_thickness: config.wall_thickness,
        }
    }

    /// Smallest rectangle holding the agent footprint at `door` and a footprint
    /// inside the interior, clipped to the room.
    fn channel(&self, bounds: GridRect, door: Pos) -> GridRect {
        let size = self.player_size;
        let inner = interior(bounds, self.wall_thickness);
        let anchor = Pos::new(
            door.x.min(inner.right() - size).max(inner.x),
            door.y.min(inner.bottom() - size).max(inner.y),
        );
        let left = door.x.min(anchor.x).max(bounds.x);
        let top = door.y.min(anchor.y).max(bounds.y);
        let right = (door.x.max(anchor.x) + size).min(bounds.right());
        let bottom = (door.y.max(anchor.y) + size).min(bounds.bottom());
        GridRect::new(left, top, right - left, bottom - top)
    }
}

impl Rule<DungeonContext> for PlaceDoors {
    fn name(&self) -> &str {
        rule_names::PLACE_DOORS
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        50
    }

    fn validate(&self) -> Result<(), String> {
        if self.player_size < 1 {
            return Err(format!("player_size must be positive, got {}", self.player_size));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        _control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let channels: Vec<GridRect> = [context.graph.start(), context.graph.end()]
            .into_iter()
            .flatten()
            .map(|node| self.channel(node.bounds, room_door_position(node)))
            .collect();
        for channel in channels {
            context.layers.ground.fill_rect(channel, TILE_EMPTY);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::graph::RoomNode;
    use crate::dungeon::path::find_path;
    use crate::types::{RestrictedSide, RoomRole};

    fn config() -> RoomConfig {
        RoomConfig { columns: 2, rows: 1, room_width: 10, room_height: 8, ..RoomConfig::default() }
    }

    fn two_rooms(connected: bool) -> DungeonContext {
        let config = config();
        let mut context = DungeonContext::new(&config, 7, 0, Pos::default());
        let left = Pos::new(0, 0);
        let right = Pos::new(1, 0);
        let mut start = RoomNode::new(left, RoomRole::Start, context.room_bounds(left));
        start.restricted_side = RestrictedSide::Left;
        let mut end = RoomNode::new(right, RoomRole::End, context.room_bounds(right));
        end.restricted_side = RestrictedSide::Right;
        context.graph.add_node(start);
        context.graph.add_node(end);
        if connected {
            context.graph.connect(left, right);
        }
        context
    }

    fn carve(context: &mut DungeonContext) {
        let config = config();
        let mut control = RunControl::default();
        SynthesizeTiles::new(&config).execute(context, &mut control).expect("synthesis");
        CarveWalls::new(&config).execute(context, &mut control).expect("walls");
    }

    #[test]
    fn connected_sides_stay_open() {
        let mut context = two_rooms(true);
        carve(&mut context);
        let ground = &context.layers.ground;
        assert!(ground.is_solid(Pos::new(0, 4)), "outer left wall");
        assert!(ground.is_solid(Pos::new(19, 4)), "outer right wall");
        assert!(!ground.is_solid(Pos::new(9, 4)), "shared edge open on the left room");
        assert!(!ground.is_solid(Pos::new(10, 4)), "shared edge open on the right room");
    }

    #[test]
    fn unconnected_neighbours_are_walled_off() {
        let mut context = two_rooms(false);
        carve(&mut context);
        for y in 0..8 {
            assert!(context.layers.ground.is_solid(Pos::new(9, y)));
            assert!(context.layers.ground.is_solid(Pos::new(10, y)));
        }
    }

    #[test]
    fn platforms_only_touch_the_platform_layer() {
        let config = RoomConfig { platforms_per_room: 4, ..config() };
        let mut context = two_rooms(true);
        carve(&mut context);
        let ground_before = context.layers.ground.clone();
        PlacePlatforms::new(&config)
            .execute(&mut context, &mut RunControl::default())
            .expect("platforms");
        assert_eq!(context.layers.ground, ground_before);
        assert!(context.layers.platform.count(TILE_SOLID) > 0);
    }

    #[test]
    fn doors_clear_the_agent_footprint() {
        let config = config();
        let mut context = two_rooms(true);
        carve(&mut context);
        PlaceDoors::new(&config).execute(&mut context, &mut RunControl::default()).expect("doors");

        // A 10-wide room on the right puts the exit at x = 15 + 4.
        let exit = Pos::new(19, 4);
        for dy in 0..2 {
            assert!(!context.layers.ground.is_solid(exit + Pos::new(0, dy)));
        }
    }

    #[test]
    fn thick_walls_keep_the_exit_connected_to_the_interior() {
        let config = RoomConfig { room_width: 24, room_height: 14, wall_thickness: 4, ..config() };
        let mut context = DungeonContext::new(&config, 7, 0, Pos::default());
        let cell = Pos::new(0, 0);
        let mut end = RoomNode::new(cell, RoomRole::End, context.room_bounds(cell));
        end.restricted_side = RestrictedSide::Right;
        context.graph.add_node(end);
        let mut control = RunControl::default();
        SynthesizeTiles::new(&config).execute(&mut context, &mut control).expect("synthesis");
        CarveWalls::new(&config).execute(&mut context, &mut control).expect("walls");
        PlaceDoors::new(&config).execute(&mut context, &mut control).expect("doors");

        // The exit at x = 22 sits in the right band (x >= 20); the channel
        // reaches back to an interior footprint at x = 18.
        let exit = Pos::new(22, 7);
        assert!(context.layers.ground.is_solid(Pos::new(20, 2)), "band elsewhere stays");
        for x in 18..24 {
            for y in 7..9 {
                assert!(!context.layers.ground.is_solid(Pos::new(x, y)), "({x},{y})");
            }
        }
        assert!(find_path(&context.layers.ground, Pos::new(10, 6), exit, 2));
    }

    #[test]
    fn channel_stays_inside_the_room() {
        let config = RoomConfig { wall_thickness: 2, ..config() };
        let bounds = GridRect::new(10, 0, 10, 8);
        let channel = PlaceDoors::new(&config).channel(bounds, Pos::new(19, 4));
        assert_eq!(channel, GridRect::new(16, 4, 4, 2));
        let entrance = PlaceDoors::new(&config).channel(GridRect::new(0, 0, 10, 8), Pos::new(1, 4));
        assert_eq!(entrance, GridRect::new(1, 4, 3, 2));
    }

    #[test]
    fn walls_that_swallow_the_interior_are_rejected() {
        let config = RoomConfig { wall_thickness: 4, ..config() };
        assert!(CarveWalls::new(&config).validate().is_err(), "8-tile room, 2-tile agent");
        let config = RoomConfig { wall_thickness: 3, ..self::config() };
        assert!(CarveWalls::new(&config).validate().is_ok());
    }

    #[test]
    fn inverted_platform_range_is_a_configuration_error() {
        let config = RoomConfig { min_platform_length: 5, max_platform_length: 2, ..config() };
        assert!(PlacePlatforms::new(&config).validate().is_err());
    }
}
