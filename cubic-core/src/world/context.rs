use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::Arc;

use cubic_utils::{AddressError, ColumnPos, CubePos};

use super::World;
use crate::block::BlockRegistry;
use crate::column::Column;
use crate::config::WorldConfig;
use crate::cube::{Cube, GeneratorStage};
use crate::generator::{
    CubeProcessor, GeneratorPipeline, PipelineError, ProcessOutcome, TickReport, default_pipeline,
};
use crate::lighting::{CubeCache, FirstLightProcessor};

/// A world together with the pipeline that generates it.
pub struct WorldContext {
    /// The loaded columns and cubes.
    pub world: World,
    /// Staged generation for cubes that are not live yet.
    pub pipeline: GeneratorPipeline,
    relight: FirstLightProcessor,
    relight_queue: VecDeque<CubePos>,
}

impl WorldContext {
    /// Creates an empty world with the default pipeline.
    pub fn new(config: WorldConfig, blocks: Arc<BlockRegistry>) -> Result<Self, PipelineError> {
        let pipeline = default_pipeline(&config, &blocks)?;
        let relight = FirstLightProcessor::new(config.batch_sizes.lighting);
        Ok(Self {
            world: World::new(config, blocks),
            pipeline,
            relight,
            relight_queue: VecDeque::new(),
        })
    }

    /// Loads the cube at `pos` if needed and queues it for generation.
    ///
    /// Returns whether the cube was newly queued.
    pub fn prepare_cube(&mut self, pos: CubePos) -> Result<bool, AddressError> {
        let cube = self.world.get_or_create_cube(pos)?;
        Ok(self.pipeline.generate(cube))
    }

    /// Prepares every cube within `radius` columns of `center` and in `cube_ys`.
    pub fn prepare_region(
        &mut self,
        center: ColumnPos,
        radius: i32,
        cube_ys: RangeInclusive<i32>,
    ) -> Result<usize, AddressError> {
        let mut queued = 0;
        for x in center.x() - radius..=center.x() + radius {
            for z in center.z() - radius..=center.z() + radius {
                for y in cube_ys.clone() {
                    if self.prepare_cube(CubePos::new(x, y, z))? {
                        queued += 1;
                    }
                }
            }
        }
        Ok(queued)
    }

    /// Adds a column read from storage.
    ///
    /// Cubes still being generated go back into the pipeline. Lit cubes whose
    /// stored opacity index no longer matches are queued for a fresh first light.
    /// Work queued for a column this one replaces is dropped first.
    pub fn insert_column(&mut self, column: Column) -> Result<(), AddressError> {
        let pos = column.pos();
        if let Some(old) = self.world.insert_column(column)? {
            for cube in old.all_cubes() {
                self.pipeline.remove(cube.pos());
            }
        }
        self.relight_queue.retain(|queued| queued.column() != pos);
        let Some(column) = self.world.column(pos) else {
            return Ok(());
        };
        for cube in column.all_cubes() {
            if cube.generator_stage() < GeneratorStage::Live {
                self.pipeline.generate(cube);
            }
            if cube.needs_relight() && cube.generator_stage() > GeneratorStage::Lighting {
                self.relight_queue.push_back(cube.pos());
            }
        }
        Ok(())
    }

    /// Unloads a cube and forgets any pending work for it.
    pub fn unload_cube(&mut self, pos: CubePos) -> Option<Cube> {
        self.pipeline.remove(pos);
        self.relight_queue.retain(|queued| *queued != pos);
        self.world.remove_cube(pos)
    }

    /// Unloads a column with all of its cubes.
    pub fn unload_column(&mut self, pos: ColumnPos) -> Option<Column> {
        let column = self.world.remove_column(pos)?;
        for cube in column.all_cubes() {
            self.pipeline.remove(cube.pos());
        }
        self.relight_queue.retain(|queued| queued.column() != pos);
        Some(column)
    }

    /// Cubes waiting for a fresh first light after loading.
    #[must_use]
    pub fn pending_relights(&self) -> usize {
        self.relight_queue.len()
    }

    /// Advances generation, relighting and the game clock by one tick.
    pub fn tick(&mut self) -> TickReport {
        let report = self.pipeline.tick(&mut self.world);

        let mut retry = Vec::new();
        for _ in 0..self.relight.batch_size().min(self.relight_queue.len()) {
            let Some(pos) = self.relight_queue.pop_front() else {
                break;
            };
            if self.world.cube(pos).is_none() {
                continue;
            }
            match self.relight.light_cube(&mut self.world, pos) {
                ProcessOutcome::Done => log::trace!("Relit {pos}"),
                ProcessOutcome::Retry => retry.push(pos),
            }
        }
        self.relight_queue.extend(retry);

        self.world.tick_relight_checks();
        self.world.advance_time();
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cubic_utils::BlockPos;

    use super::*;
    use crate::block::blocks;
    use crate::config::BatchSizes;
    use crate::cube::LightKind;

    fn context() -> WorldContext {
        let config = WorldConfig {
            batch_sizes: BatchSizes {
                terrain: 200,
                surface: 200,
                structures: 200,
                lighting: 200,
                features: 200,
            },
            ..WorldConfig::default()
        };
        WorldContext::new(config, Arc::new(BlockRegistry::vanilla())).expect("default pipeline")
    }

    #[test]
    fn prepared_region_reaches_live_and_is_lit() {
        let mut context = context();
        let queued = context
            .prepare_region(ColumnPos::new(0, 0), 2, 2..=5)
            .expect("in range");
        assert_eq!(queued, 5 * 5 * 4);

        for _ in 0..40 {
            context.tick();
        }
        let center = context.world.cube(CubePos::new(0, 3, 0)).expect("loaded");
        assert_eq!(center.generator_stage(), GeneratorStage::Live);

        assert_eq!(context.world.block_state(BlockPos::new(3, 63, 3)), blocks::GRASS_BLOCK);
        assert_eq!(context.world.block_state(BlockPos::new(3, 64, 3)), blocks::AIR);
        assert_eq!(context.world.light_at(LightKind::Sky, BlockPos::new(3, 64, 3)), 15);
        assert_eq!(context.world.light_at(LightKind::Sky, BlockPos::new(3, 62, 3)), 0);

        // Edge cubes never get all face neighbors.
        let edge = context.world.cube(CubePos::new(2, 5, 0)).expect("loaded");
        assert_eq!(edge.generator_stage(), GeneratorStage::Lighting);
    }

    #[test]
    fn live_edits_relight_immediately() {
        let mut context = context();
        context
            .prepare_region(ColumnPos::new(0, 0), 2, 2..=5)
            .expect("in range");
        for _ in 0..40 {
            context.tick();
        }
        let pos = BlockPos::new(8, 66, 8);
        context.world.set_block_state(pos, blocks::GLOWSTONE);
        assert_eq!(context.world.light_at(LightKind::Block, pos.offset(0, 0, 3)), 12);
        assert_eq!(context.world.light_at(LightKind::Sky, pos.offset(0, -1, 0)), 14);
    }

    #[test]
    fn unloading_forgets_pending_cubes() {
        let mut context = context();
        context.prepare_cube(CubePos::new(0, 0, 0)).expect("in range");
        assert_eq!(context.pipeline.pending(), 1);
        assert!(context.unload_cube(CubePos::new(0, 0, 0)).is_some());
        assert_eq!(context.pipeline.pending(), 0);
        assert!(context.world.cube(CubePos::new(0, 0, 0)).is_none());
    }

    #[test]
    fn loaded_columns_resume_generation() {
        let mut context = context();
        let mut column = Column::new(ColumnPos::new(4, 4));
        column.get_or_create_cube(1).set_generator_stage(GeneratorStage::Structures);
        let lit = column.get_or_create_cube(2);
        lit.set_generator_stage(GeneratorStage::Live);
        lit.set_needs_relight(true);

        context.insert_column(column).expect("in range");
        assert_eq!(context.pipeline.pending_at(GeneratorStage::Structures), 1);
        assert_eq!(context.pending_relights(), 1);

        context.unload_column(ColumnPos::new(4, 4));
        assert_eq!(context.pipeline.pending(), 0);
        assert_eq!(context.pending_relights(), 0);
    }

    #[test]
    fn reinserting_a_column_does_not_duplicate_work() {
        let mut context = context();
        let mut column = Column::new(ColumnPos::new(-2, 7));
        column.get_or_create_cube(0).set_generator_stage(GeneratorStage::Surface);
        for y in 1..=3 {
            let lit = column.get_or_create_cube(y);
            lit.set_generator_stage(GeneratorStage::Live);
            lit.set_needs_relight(true);
        }

        context.insert_column(column.clone()).expect("in range");
        context.insert_column(column).expect("in range");
        assert_eq!(context.pending_relights(), 3);
        assert_eq!(context.pipeline.pending(), 1);

        context.insert_column(Column::new(ColumnPos::new(-2, 7))).expect("in range");
        assert_eq!(context.pending_relights(), 0);
        assert_eq!(context.pipeline.pending(), 0);
    }
}
