//! First light for freshly generated cubes, and the world interface it runs against.
mod first_light_processor;

use cubic_utils::{BlockPos, ColumnPos, CubePos};

pub use first_light_processor::{FirstLightProcessor, SKY_DIFFUSE_DEPTH, sky_gradient_line};

use crate::block::BlockRegistry;
use crate::column::Column;
use crate::cube::{Cube, GeneratorStage, LightKind};
use crate::light_engine::Direction;

/// Read and write access to loaded cubes and columns.
pub trait CubeCache {
    /// The loaded cube at `pos`, with no side effects.
    fn cube(&self, pos: CubePos) -> Option<&Cube>;

    /// The loaded cube at `pos`, mutably.
    fn cube_mut(&mut self, pos: CubePos) -> Option<&mut Cube>;

    /// The loaded column at `pos`.
    fn column(&self, pos: ColumnPos) -> Option<&Column>;

    /// The loaded column at `pos`, mutably.
    fn column_mut(&mut self, pos: ColumnPos) -> Option<&mut Column>;

    /// The loaded cube, or the shared blank cube when there is none.
    fn cube_or_blank(&self, pos: CubePos) -> &Cube {
        self.cube(pos).unwrap_or(Cube::blank())
    }

    /// Whether the cube and its six face neighbors are loaded and have reached `stage`.
    fn cube_and_neighbors_at_least(&self, pos: CubePos, stage: GeneratorStage) -> bool {
        let reached = |pos| {
            self.cube(pos)
                .is_some_and(|cube| cube.generator_stage() >= stage)
        };
        reached(pos)
            && Direction::ALL
                .iter()
                .all(|dir| reached(dir.relative_cube(pos)))
    }
}

/// The world primitives lighting depends on.
pub trait LightingWorld: CubeCache {
    /// Block properties.
    fn blocks(&self) -> &BlockRegistry;

    /// Whether the dimension has a sky.
    fn has_sky(&self) -> bool;

    /// Sea level in blocks.
    fn sea_level(&self) -> i32;

    /// Light at a world position, using the sky default for missing cubes.
    fn light_at(&self, kind: LightKind, pos: BlockPos) -> u8;

    /// Recomputes light at `pos` and spreads the change.
    ///
    /// Returns `false` if the surrounding cubes are not loaded.
    fn update_lighting_at(&mut self, kind: LightKind, pos: BlockPos) -> bool;
}
