//! Entrance-to-exit reachability check with a single repair pass.

use tracing::{debug, warn};

use crate::config::RoomConfig;
use crate::control::RunControl;
use crate::rules::{Rule, RuleError};

use super::DungeonContext;
use super::generator::rule_names;
use super::path::{find_path, repair_passages};

pub struct ValidatePath {
    enabled: bool,
    player_size: i32,
    passage_width: i32,
    wall_thickness: i32,
    room_width: i32,
    room_height: i32,
}

impl ValidatePath {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::VALIDATE_PATH),
            player_size: config.player_size,
            passage_width: config.passage_width(),
            wall_thickness: config.wall_thickness,
            room_width: config.room_width,
            room_height: config.room_height,
        }
    }
}

impl Rule<DungeonContext> for ValidatePath {
    fn name(&self) -> &str {
        rule_names::VALIDATE_PATH
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        60
    }

    fn validate(&self) -> Result<(), String> {
        if self.player_size < 1 {
            return Err(format!("player_size must be positive, got {}", self.player_size));
        }
        let room_span = self.room_width.min(self.room_height);
        if self.passage_width > room_span {
            return Err(format!(
                "passage width {} does not fit a {}x{} room",
                self.passage_width, self.room_width, self.room_height
            ));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut DungeonContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let Some(doors) = context.doors() else {
            debug!(seed = context.seed, "room has no entrance or exit, skipping path check");
            return Ok(());
        };
        if find_path(&context.layers.ground, doors.entrance, doors.exit, self.player_size) {
            return Ok(());
        }

        control.poll()?;
        let carved = repair_passages(
            &mut context.layers.ground,
            &context.graph,
            self.passage_width,
            self.wall_thickness,
        );
        warn!(seed = context.seed, carved, "no path from entrance to exit, carved passages");

        if find_path(&context.layers.ground, doors.entrance, doors.exit, self.player_size) {
            Ok(())
        } else {
            Err(RuleError::Failed(format!(
                "exit {:?} unreachable from entrance {:?} after repair",
                doors.exit, doors.entrance
            )))
        }
    }
}
