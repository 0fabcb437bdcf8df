use crate::config::WorldConfig;
use crate::control::RunControl;
use crate::rules::{Rule, RuleError};

use super::{WorldContext, rule_names};

/// `world_offset = grid * room_pixel_size` for every node. Rerunning it
/// yields the same offsets.
pub struct ResolveCoordinates {
    enabled: bool,
}

impl ResolveCoordinates {
    pub fn new(config: &WorldConfig) -> Self {
        Self { enabled: config.is_rule_enabled(rule_names::RESOLVE_COORDINATES) }
    }
}

impl Rule<WorldContext> for ResolveCoordinates {
    fn name(&self) -> &str {
        rule_names::RESOLVE_COORDINATES
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        20
    }

    fn execute(
        &mut self,
        context: &mut WorldContext,
        _control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        let room_pixel_size = context.room_pixel_size;
        for node in context.nodes.values_mut() {
            node.world_offset = node.grid * room_pixel_size;
        }
        Ok(())
    }
}
