//! Random constrained placement of world nodes with a raster fallback.

use tracing::{debug, warn};

use crate::config::WorldConfig;
use crate::control::RunControl;
use crate::rules::{Rule, RuleError};
use crate::seed::GenRng;
use crate::types::Pos;

use super::{WorldContext, WorldNode, rule_names};

pub struct PlaceWorldNodes {
    enabled: bool,
    room_count: usize,
    spawn_threshold: f32,
    max_rounds: usize,
    max_attempts_per_round: usize,
}

/// Cells chosen so far, each with the seed drawn when it was accepted.
struct Placement {
    grid_size: usize,
    occupied: Vec<bool>,
    cells: Vec<(Pos, u64)>,
}

impl Placement {
    fn new(grid_size: usize) -> Self {
        Self { grid_size, occupied: vec![false; grid_size * grid_size], cells: Vec::new() }
    }

    fn index(&self, cell: Pos) -> Option<usize> {
        let size = self.grid_size as i32;
        (cell.x >= 0 && cell.y >= 0 && cell.x < size && cell.y < size)
            .then(|| (cell.y as usize) * self.grid_size + (cell.x as usize))
    }

    fn is_occupied(&self, cell: Pos) -> bool {
        self.index(cell).is_some_and(|index| self.occupied[index])
    }

    /// No placed node within Chebyshev distance 1.
    fn has_clearance(&self, cell: Pos) -> bool {
        !self.is_occupied(cell) && cell.ring().into_iter().all(|neighbor| !self.is_occupied(neighbor))
    }

    fn place(&mut self, cell: Pos, seed: u64) {
        if let Some(index) = self.index(cell) {
            self.occupied[index] = true;
            self.cells.push((cell, seed));
        }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    /// Deterministic row-major sweep ignoring the spawn threshold.
    fn raster_fill(&mut self, target: usize, rng: &mut GenRng) {
        for y in 0..self.grid_size as i32 {
            for x in 0..self.grid_size as i32 {
                if self.len() >= target {
                    return;
                }
                let cell = Pos::new(x, y);
                if self.has_clearance(cell) {
                    let seed = rng.next_u64();
                    self.place(cell, seed);
                }
            }
        }
    }
}

impl PlaceWorldNodes {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            enabled: config.is_rule_enabled(rule_names::PLACE_NODES),
            room_count: config.room_count,
            spawn_threshold: config.spawn_threshold,
            max_rounds: config.max_rounds,
            max_attempts_per_round: config.max_attempts_per_round,
        }
    }

    fn random_rounds(
        &self,
        placement: &mut Placement,
        rng: &mut GenRng,
        control: &RunControl<'_>,
    ) -> Result<(), RuleError> {
        let size = placement.grid_size as i32;
        let mut candidates: Vec<Pos> =
            (0..size).flat_map(|y| (0..size).map(move |x| Pos::new(x, y))).collect();

        for round in 0..self.max_rounds {
            if placement.len() >= self.room_count {
                break;
            }
            control.poll()?;
            rng.shuffle(&mut candidates);

            let mut attempts = 0;
            let mut index = 0;
            while index < candidates.len()
                && attempts < self.max_attempts_per_round
                && placement.len() < self.room_count
            {
                control.poll()?;
                attempts += 1;
                let cell = candidates[index];
                if placement.is_occupied(cell) {
                    index += 1;
                    continue;
                }
                let draw = rng.next_f32();
                if draw <= self.spawn_threshold || !placement.has_clearance(cell) {
                    index += 1;
                    continue;
                }
                let seed = rng.next_u64();
                placement.place(cell, seed);
                candidates.remove(index);
            }
            debug!(round, attempts, placed = placement.len(), "placement round finished");
        }
        Ok(())
    }
}

impl Rule<WorldContext> for PlaceWorldNodes {
    fn name(&self) -> &str {
        rule_names::PLACE_NODES
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn order(&self) -> i32 {
        10
    }

    fn validate(&self) -> Result<(), String> {
        if self.room_count == 0 {
            return Err("room_count must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.spawn_threshold) {
            return Err(format!("spawn_threshold must be within [0, 1], got {}", self.spawn_threshold));
        }
        if self.max_rounds == 0 || self.max_attempts_per_round == 0 {
            return Err("max_rounds and max_attempts_per_round must be positive".to_string());
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut WorldContext,
        control: &mut RunControl<'_>,
    ) -> Result<(), RuleError> {
        if context.grid_size == 0 {
            return Err(RuleError::Failed("world grid has no cells".to_string()));
        }
        let mut placement = Placement::new(context.grid_size);
        self.random_rounds(&mut placement, &mut context.rng, control)?;

        if placement.len() < self.room_count {
            warn!(
                placed = placement.len(),
                target = self.room_count,
                "random placement fell short, filling in raster order"
            );
            placement.raster_fill(self.room_count, &mut context.rng);
        }
        if placement.len() < self.room_count {
            // Raster order from an empty grid is the densest spaced packing.
            let mut packed = Placement::new(context.grid_size);
            packed.raster_fill(self.room_count, &mut context.rng);
            if packed.len() > placement.len() {
                placement = packed;
            }
        }
        if placement.len() < self.room_count {
            return Err(RuleError::Failed(format!(
                "placement exhausted: {} of {} nodes fit a {}x{} grid",
                placement.len(),
                self.room_count,
                context.grid_size,
                context.grid_size
            )));
        }

        context.nodes.clear();
        context.placement_order.clear();
        context.occupied.fill(false);
        for (cell, seed) in placement.cells {
            context.insert_node(WorldNode::new(cell, seed));
        }
        debug!(nodes = context.nodes.len(), "world nodes placed");
        Ok(())
    }
}
