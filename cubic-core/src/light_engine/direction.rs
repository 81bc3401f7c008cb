//! The six face directions.

use cubic_utils::{BlockPos, CubePos};

/// A face direction. The ordinal selects the flag bit in [`QueueEntry`](super::QueueEntry).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Y
    Down = 0,
    /// +Y
    Up = 1,
    /// -Z
    North = 2,
    /// +Z
    South = 3,
    /// -X
    West = 4,
    /// +X
    East = 5,
}

impl Direction {
    /// All six directions.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Unit step `(dx, dy, dz)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// The block one step away.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }

    /// The cube one step away.
    #[must_use]
    pub const fn relative_cube(self, pos: CubePos) -> CubePos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }

    /// Local coordinate of the layer of a cube facing this direction: 15 for
    /// positive directions, 0 for negative ones.
    #[must_use]
    pub const fn boundary_layer(self) -> usize {
        match self {
            Self::Up | Self::South | Self::East => 15,
            Self::Down | Self::North | Self::West => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_select_flag_bits() {
        let ordinals: Vec<u8> = Direction::ALL.iter().map(|d| *d as u8).collect();
        assert_eq!(ordinals, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn opposite_cancels_offset() {
        let pos = BlockPos::new(4, -7, 12);
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().relative(dir.relative(pos)), pos);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn boundary_layer_faces_direction() {
        assert_eq!(Direction::Up.boundary_layer(), 15);
        assert_eq!(Direction::West.boundary_layer(), 0);
        assert_eq!(Direction::Down.relative_cube(CubePos::new(0, 0, 0)), CubePos::new(0, -1, 0));
    }
}
