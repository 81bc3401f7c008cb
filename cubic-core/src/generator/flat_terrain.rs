use cubic_utils::coords::CUBE_SIZE;
use cubic_utils::{BlockStateId, CubePos, LocalPos};

use super::{CubeProcessor, PipelineError, ProcessOutcome};
use crate::block::{BlockRegistry, blocks};
use crate::config::WorldConfig;
use crate::world::World;

/// Fills cubes with horizontal layers of blocks.
#[derive(Debug, Clone)]
pub struct FlatTerrainProcessor {
    /// `(first_y, end_y, state)`, ascending and non-overlapping, `end_y` exclusive.
    layers: Vec<(i32, i32, BlockStateId)>,
    batch_size: usize,
}

impl FlatTerrainProcessor {
    /// Resolves the configured layers against the registry.
    pub fn new(config: &WorldConfig, registry: &BlockRegistry) -> Result<Self, PipelineError> {
        let limit = i64::from(cubic_utils::address::MAX_VERTICAL) * i64::from(CUBE_SIZE);
        let mut layers = Vec::with_capacity(config.flat_layers.len());
        let mut y = i64::from(config.flat_base_y);
        for layer in &config.flat_layers {
            let state = registry
                .by_name(&layer.block)
                .ok_or_else(|| PipelineError::UnknownBlock(layer.block.clone()))?;
            let end = y + i64::from(layer.height);
            if end > limit {
                return Err(PipelineError::LayerOverflow(layer.block.clone()));
            }
            if layer.height > 0 {
                layers.push((y as i32, end as i32, state));
            }
            y = end;
        }
        Ok(Self {
            layers,
            batch_size: config.batch_sizes.terrain,
        })
    }

    /// The block generated at height `y`.
    #[must_use]
    pub fn block_at(&self, y: i32) -> BlockStateId {
        self.layers
            .iter()
            .find(|(start, end, _)| (*start..*end).contains(&y))
            .map_or(blocks::AIR, |(_, _, state)| *state)
    }
}

impl CubeProcessor for FlatTerrainProcessor {
    fn name(&self) -> &'static str {
        "Terrain"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn process(&mut self, world: &mut World, pos: CubePos) -> ProcessOutcome {
        let min_y = pos.min_block().y();
        let max_y = pos.max_block().y();
        if !self
            .layers
            .iter()
            .any(|(start, end, _)| *start <= max_y && *end > min_y)
        {
            return ProcessOutcome::Done;
        }

        for local in LocalPos::all() {
            let state = self.block_at(min_y + local.y as i32);
            if state != blocks::AIR {
                world.set_block_state(pos.block_at(local), state);
            }
        }
        ProcessOutcome::Done
    }
}
