use cubic_utils::CubePos;

use crate::world::World;

/// What a processor made of a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The stage finished, the cube advances.
    Done,
    /// Not ready yet, the cube is queued again at the same stage.
    Retry,
}

/// Work done for one generation stage.
///
/// Processors only carry read-only configuration; everything they change
/// lives in the world.
pub trait CubeProcessor {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Cubes handled per pipeline cycle.
    fn batch_size(&self) -> usize;

    /// Runs the stage for the cube at `pos`, which is loaded and at this stage.
    fn process(&mut self, world: &mut World, pos: CubePos) -> ProcessOutcome;
}
