use cubic_utils::CubePos;

use super::{CubeProcessor, ProcessOutcome};
use crate::world::World;

/// A stage that completes immediately, for stages this world does not generate.
#[derive(Debug, Clone)]
pub struct PassThroughProcessor {
    name: &'static str,
    batch_size: usize,
}

impl PassThroughProcessor {
    /// Creates a named no-op stage.
    #[must_use]
    pub const fn new(name: &'static str, batch_size: usize) -> Self {
        Self { name, batch_size }
    }
}

impl CubeProcessor for PassThroughProcessor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn process(&mut self, _world: &mut World, _pos: CubePos) -> ProcessOutcome {
        ProcessOutcome::Done
    }
}
