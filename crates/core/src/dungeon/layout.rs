//! Room graph layout: a left-to-right critical path plus side rooms.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::RoomConfig;
use crate::control::RunControl;
use crate::rules::{Rule, RuleError};
use crate::types::{DoorMarker, Pos, RestrictedSide, RoomRole, Side};

use super::DungeonContext;
use super::generator::rule_names;
use super::graph::RoomNode;

pub struct LayoutRoomGraph {
    enabled: bool,
    columns: usize,
    rows: usize,
    vertical_bias: f32,
    side_room_chance: f32,
    boss_room: bool,
    shop_room: bool,
}

impl LayoutRoomGraph {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::LAYOUT),
            columns: config.columns,
            rows: config.rows,
            vertical_bias: config.vertical_bias,
            side_room_chance: config.side_room_chance,
            boss_room: config.boss_room,
            shop_room: config.shop_room,
        }
    }

    /// Walks from a random row of the first column to the last column, never
    /// moving left and never revisiting a cell.
    fn walk_critical_path(&self, context: &mut DungeonContext) -> Vec<Pos> {
        let columns = self.columns as i32;
        let rows = self.rows as i32;
        let mut current = Pos::new(0, context.rng.range_i32(0, rows - 1));
        let mut path = vec![current];
        let mut visited = BTreeSet::from([current]);

        loop {
            let vertical: Vec<Pos> = [Side::Top, Side::Bottom]
                .into_iter()
                .map(|side| current.step(side))
                .filter(|cell| cell.y >= 0 && cell.y < rows && !visited.contains(cell))
                .collect();

            let next = if !vertical.is_empty() && context.rng.chance(self.vertical_bias) {
                vertical[context.rng.range_usize(0, vertical.len() - 1)]
            } else if current.x + 1 < columns {
                current.step(Side::Right)
            } else {
                break;
            };
            visited.insert(next);
            path.push(next);
            current = next;
        }
        path
    }

    fn critical_role(&self, index: usize, length: usize) -> RoomRole {
        if index == 0 {
            RoomRole::Start
        } else if index + 1 == length {
            RoomRole::End
        } else if self.boss_room && length >= 3 && index + 2 == length {
            RoomRole::Boss
        } else {
            RoomRole::Normal
        }
    }

    fn place_critical_path(&self, context: &mut DungeonContext, path: &[Pos]) {
        for (index, &cell) in path.iter().enumerate() {
            let mut node =
                RoomNode::new(cell, self.critical_role(index, path.len()), context.room_bounds(cell));
            node.on_critical_path = true;
            match node.role {
                RoomRole::Start => {
                    node.door = DoorMarker::Entrance;
                    node.restricted_side = RestrictedSide::Left;
                }
                RoomRole::End => {
                    node.door = DoorMarker::Exit;
                    node.restricted_side = RestrictedSide::Right;
                }
                _ => {}
            }
            context.graph.add_node(node);
            context.critical_path.insert(cell);
        }
        for pair in path.windows(2) {
            context.graph.connect(pair[0], pair[1]);
        }
    }

    /// Side rooms hang off the critical path only, one cell deep.
    fn place_side_rooms(&self, context: &mut DungeonContext) {
        let mut shop_placed = false;
        for y in 0..self.rows as i32 {
            for x in 0..self.columns as i32 {
                let cell = Pos::new(x, y);
                if context.graph.is_occupied(cell) {
                    continue;
                }
                let Some(anchor) = Side::ALL
                    .into_iter()
                    .map(|side| cell.step(side))
                    .find(|neighbor| context.critical_path.contains(neighbor))
                else {
                    continue;
                };
                if !context.rng.chance(self.side_room_chance) {
                    continue;
                }

                let role = if self.shop_room && !shop_placed {
                    shop_placed = true;
                    RoomRole::Shop
                } else {
                    RoomRole::Side
                };
                context.graph.add_node(RoomNode::new(cell, role, context.room_bounds(cell)));
                context.graph.connect(anchor, cell);
            }
        }
    }
}

impl Rule<DungeonContext> for LayoutRoomGraph {
    fn name(&self) -> &str {
        rule_names::LAYOUT
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        10
    }

    fn validate(&self) -> Result<(), String> {
        if self.columns < 2 || self.rows < 1 {
            return Err(format!(
                "room grid must be at least 2x1 to hold a start and an end, got {}x{}",
                self.columns, self.rows
            ));
        }
        for (label, value) in
            [("vertical_bias", self.vertical_bias), ("side_room_chance", self.side_room_chance)]
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{label} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        context.graph.clear();
        context.critical_path.clear();

        let path = self.walk_critical_path(context);
        self.place_critical_path(context, &path);
        control.poll()?;
        self.place_side_rooms(context);

        debug!(
            critical_path = path.len(),
            rooms = context.graph.len(),
            "room graph laid out"
        );
        Ok(())
    }
}
