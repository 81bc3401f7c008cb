use std::collections::VecDeque;

use cubic_utils::CubePos;
use rustc_hash::FxHashSet;

use super::{CubeProcessor, PipelineError, ProcessOutcome};
use crate::cube::{Cube, GeneratorStage};
use crate::lighting::CubeCache;
use crate::world::World;

struct StageQueue {
    stage: GeneratorStage,
    processor: Box<dyn CubeProcessor>,
    queue: VecDeque<CubePos>,
    queued: FxHashSet<CubePos>,
}

impl StageQueue {
    fn push(&mut self, pos: CubePos) -> bool {
        if !self.queued.insert(pos) {
            return false;
        }
        self.queue.push_back(pos);
        true
    }
}

/// Counters from one pipeline cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Cubes handed to a processor or found not ready.
    pub processed: usize,
    /// Cubes that finished their stage.
    pub advanced: usize,
    /// Cubes queued again at the same stage.
    pub retried: usize,
    /// Queue entries discarded because the cube was unloaded or had moved on.
    pub dropped: usize,
}

/// Moves cubes through the generation stages in order.
///
/// Each stage owns a FIFO of cube positions. A cycle takes up to the stage's
/// batch size from every queue, lowest stage first; finished cubes move to
/// the next queue and retries go to the back of their own.
#[derive(Default)]
pub struct GeneratorPipeline {
    stages: Vec<StageQueue>,
}

impl GeneratorPipeline {
    /// Creates a pipeline with no stages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a processor to a stage.
    pub fn add_stage(
        &mut self,
        stage: GeneratorStage,
        processor: Box<dyn CubeProcessor>,
    ) -> Result<(), PipelineError> {
        if stage.is_last_stage() {
            return Err(PipelineError::LiveStage);
        }
        let index = match self.stages.binary_search_by_key(&stage, |s| s.stage) {
            Ok(_) => return Err(PipelineError::DuplicateStage(stage)),
            Err(index) => index,
        };
        log::debug!(
            "Registered {} processor for the {stage} stage (batch size {})",
            processor.name(),
            processor.batch_size()
        );
        self.stages.insert(
            index,
            StageQueue {
                stage,
                processor,
                queue: VecDeque::new(),
                queued: FxHashSet::default(),
            },
        );
        Ok(())
    }

    /// Fails if a stage before [`GeneratorStage::Live`] has no processor.
    pub fn check_stages(&self) -> Result<(), PipelineError> {
        GeneratorStage::ALL
            .into_iter()
            .filter(|stage| !stage.is_last_stage())
            .find(|stage| self.stage_index(*stage).is_none())
            .map_or(Ok(()), |stage| Err(PipelineError::MissingProcessor(stage)))
    }

    fn stage_index(&self, stage: GeneratorStage) -> Option<usize> {
        self.stages.binary_search_by_key(&stage, |s| s.stage).ok()
    }

    /// Queues a cube at its current stage. Returns `false` if it is already
    /// queued, fully generated, or its stage has no processor.
    pub fn generate(&mut self, cube: &Cube) -> bool {
        self.enqueue(cube.pos(), cube.generator_stage())
    }

    fn enqueue(&mut self, pos: CubePos, stage: GeneratorStage) -> bool {
        match self.stage_index(stage) {
            Some(index) => self.stages[index].push(pos),
            None => false,
        }
    }

    /// Drops all pending work for a cube.
    pub fn remove(&mut self, pos: CubePos) {
        for stage in &mut self.stages {
            if stage.queued.remove(&pos) {
                stage.queue.retain(|queued| *queued != pos);
            }
        }
    }

    /// Cubes waiting at `stage`.
    #[must_use]
    pub fn pending_at(&self, stage: GeneratorStage) -> usize {
        self.stage_index(stage)
            .map_or(0, |index| self.stages[index].queue.len())
    }

    /// Cubes waiting at any stage.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.stages.iter().map(|s| s.queue.len()).sum()
    }

    /// Runs one cycle over every stage.
    pub fn tick(&mut self, world: &mut World) -> TickReport {
        let mut report = TickReport::default();
        for index in 0..self.stages.len() {
            let stage = self.stages[index].stage;
            let advanced = Self::run_stage(&mut self.stages[index], world, &mut report);
            if let Some(next) = stage.next() {
                for pos in advanced {
                    self.enqueue(pos, next);
                }
            }
        }
        if report.processed > 0 {
            log::debug!(
                "Pipeline cycle: {} processed, {} advanced, {} retried, {} dropped, {} pending",
                report.processed,
                report.advanced,
                report.retried,
                report.dropped,
                self.pending()
            );
        }
        report
    }

    fn run_stage(entry: &mut StageQueue, world: &mut World, report: &mut TickReport) -> Vec<CubePos> {
        let budget = entry.processor.batch_size().max(1);
        let mut advanced = Vec::new();
        let mut retry = Vec::new();
        let mut attempts = 0;

        while attempts < budget {
            let Some(pos) = entry.queue.pop_front() else {
                break;
            };
            entry.queued.remove(&pos);
            if world.cube(pos).map(Cube::generator_stage) != Some(entry.stage) {
                report.dropped += 1;
                continue;
            }
            attempts += 1;

            let ready = entry
                .stage
                .neighbor_requirement()
                .is_none_or(|required| world.cube_and_neighbors_at_least(pos, required));
            let outcome = if ready {
                entry.processor.process(world, pos)
            } else {
                ProcessOutcome::Retry
            };

            match (outcome, entry.stage.next(), world.cube_mut(pos)) {
                (ProcessOutcome::Done, Some(next), Some(cube)) => {
                    cube.set_generator_stage(next);
                    advanced.push(pos);
                }
                (ProcessOutcome::Done, _, _) => {}
                (ProcessOutcome::Retry, _, _) => retry.push(pos),
            }
        }

        report.processed += attempts;
        report.advanced += advanced.len();
        report.retried += retry.len();
        for pos in retry {
            entry.push(pos);
        }
        advanced
    }
}
