//! Conversions between block, cube and cube-local coordinates.
//!
//! All conversions use arithmetic shifts so negative coordinates floor
//! towards negative infinity: block `-1` lives in cube `-1` at local `15`.

/// Edge length of a cube in blocks.
pub const CUBE_SIZE: i32 = 16;
/// log2 of [`CUBE_SIZE`].
pub const CUBE_SHIFT: u32 = 4;
/// Mask selecting the local part of a block coordinate.
pub const LOCAL_MASK: i32 = CUBE_SIZE - 1;
/// Number of voxels in a cube.
pub const CUBE_VOLUME: usize = 16 * 16 * 16;
/// Number of voxel columns in a cube footprint.
pub const CUBE_AREA: usize = 16 * 16;

/// Returns the cube coordinate containing the block coordinate.
#[inline]
#[must_use]
pub const fn block_to_cube(block: i32) -> i32 {
    block >> CUBE_SHIFT
}

/// Returns the local offset (0..16) of a block coordinate inside its cube.
#[inline]
#[must_use]
pub const fn block_to_local(block: i32) -> usize {
    (block & LOCAL_MASK) as usize
}

/// Lowest block coordinate inside the cube.
#[inline]
#[must_use]
pub const fn cube_to_min_block(cube: i32) -> i32 {
    cube << CUBE_SHIFT
}

/// Highest block coordinate inside the cube.
#[inline]
#[must_use]
pub const fn cube_to_max_block(cube: i32) -> i32 {
    cube_to_min_block(cube) + LOCAL_MASK
}

/// Block coordinate of a local offset inside the cube.
#[inline]
#[must_use]
pub const fn local_to_block(cube: i32, local: usize) -> i32 {
    cube_to_min_block(cube) + local as i32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_floor_into_lower_cube() {
        assert_eq!(block_to_cube(-1), -1);
        assert_eq!(block_to_local(-1), 15);
        assert_eq!(block_to_cube(-16), -1);
        assert_eq!(block_to_local(-16), 0);
        assert_eq!(block_to_cube(-17), -2);
    }

    #[test]
    fn cube_bounds() {
        assert_eq!(cube_to_min_block(4), 64);
        assert_eq!(cube_to_max_block(4), 79);
        assert_eq!(cube_to_min_block(-1), -16);
        assert_eq!(cube_to_max_block(-1), -1);
        assert_eq!(local_to_block(-2, 3), -29);
    }

    #[test]
    fn local_round_trip() {
        for block in -40..40 {
            let cube = block_to_cube(block);
            let local = block_to_local(block);
            assert_eq!(local_to_block(cube, local), block);
        }
    }
}
