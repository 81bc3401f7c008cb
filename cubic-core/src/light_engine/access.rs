use cubic_utils::{BlockPos, CubePos};

use crate::cube::LightKind;

/// What the flood fill needs to read and write light around a position.
pub trait LightAccess {
    /// Whether the cube is loaded and may receive light.
    fn is_cube_loaded(&self, pos: CubePos) -> bool;

    /// Light level, only called for loaded positions.
    fn light(&self, kind: LightKind, pos: BlockPos) -> u8;

    /// Writes a light level, only called for loaded positions.
    fn set_light(&mut self, kind: LightKind, pos: BlockPos, level: u8);

    /// Opacity of the block (0-15).
    fn opacity(&self, pos: BlockPos) -> u8;

    /// Light emitted by the block (0-15).
    fn luminance(&self, pos: BlockPos) -> u8;

    /// Whether the block is above every opaque block of its line.
    fn can_see_sky(&self, pos: BlockPos) -> bool;

    /// Whether the block's cube is loaded.
    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.is_cube_loaded(pos.cube_pos())
    }
}
