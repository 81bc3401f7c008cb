// Wrapper types making it harder to accidentally mix block, cube and column coordinates.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::coords::{
    block_to_cube, block_to_local, cube_to_max_block, cube_to_min_block, local_to_block,
};
use crate::math::{vector2::Vector2, vector3::Vector3};

// A raw block state id. Using the block registry this id resolves to a block and its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockStateId(pub u16);

// A block position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos(pub Vector3<i32>);

// A cube position, one unit per 16 blocks on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CubePos(pub Vector3<i32>);

// A column position, the horizontal part of a cube position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ColumnPos(pub Vector2<i32>);

/// A position inside a cube, each axis in `0..16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LocalPos {
    /// Local x.
    pub x: usize,
    /// Local y.
    pub y: usize,
    /// Local z.
    pub z: usize,
}

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// Returns this position moved by the given deltas.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The cube containing this block.
    #[must_use]
    pub const fn cube_pos(&self) -> CubePos {
        CubePos::new(
            block_to_cube(self.0.x),
            block_to_cube(self.0.y),
            block_to_cube(self.0.z),
        )
    }

    /// The column containing this block.
    #[must_use]
    pub const fn column_pos(&self) -> ColumnPos {
        ColumnPos::new(block_to_cube(self.0.x), block_to_cube(self.0.z))
    }

    /// The offset of this block inside its cube.
    #[must_use]
    pub const fn local(&self) -> LocalPos {
        LocalPos::new(
            block_to_local(self.0.x),
            block_to_local(self.0.y),
            block_to_local(self.0.z),
        )
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl CubePos {
    /// Creates a cube position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The cube x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The cube y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }

    /// The cube z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// The column this cube belongs to.
    #[must_use]
    pub const fn column(&self) -> ColumnPos {
        ColumnPos::new(self.0.x, self.0.z)
    }

    /// Returns the cube moved by the given deltas.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The lowest corner block of the cube.
    #[must_use]
    pub const fn min_block(&self) -> BlockPos {
        BlockPos::new(
            cube_to_min_block(self.0.x),
            cube_to_min_block(self.0.y),
            cube_to_min_block(self.0.z),
        )
    }

    /// The highest corner block of the cube.
    #[must_use]
    pub const fn max_block(&self) -> BlockPos {
        BlockPos::new(
            cube_to_max_block(self.0.x),
            cube_to_max_block(self.0.y),
            cube_to_max_block(self.0.z),
        )
    }

    /// World position of a local offset in this cube.
    #[must_use]
    pub const fn block_at(&self, local: LocalPos) -> BlockPos {
        BlockPos::new(
            local_to_block(self.0.x, local.x),
            local_to_block(self.0.y, local.y),
            local_to_block(self.0.z, local.z),
        )
    }

    /// Whether the block lies inside this cube.
    #[must_use]
    pub const fn contains(&self, pos: BlockPos) -> bool {
        block_to_cube(pos.0.x) == self.0.x
            && block_to_cube(pos.0.y) == self.0.y
            && block_to_cube(pos.0.z) == self.0.z
    }
}

impl Display for CubePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cube({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl ColumnPos {
    /// Creates a column position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The column x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The column z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.y
    }

    /// The cube at height `y` in this column.
    #[must_use]
    pub const fn cube(&self, y: i32) -> CubePos {
        CubePos::new(self.0.x, y, self.0.y)
    }

    /// World position of the block at a local horizontal offset and world height.
    #[must_use]
    pub const fn block_at(&self, local_x: usize, y: i32, local_z: usize) -> BlockPos {
        BlockPos::new(
            local_to_block(self.0.x, local_x),
            y,
            local_to_block(self.0.y, local_z),
        )
    }
}

impl Display for ColumnPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column({}, {})", self.0.x, self.0.y)
    }
}

impl LocalPos {
    /// Creates a local position. Each axis must be below 16.
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        debug_assert!(x < 16 && y < 16 && z < 16);
        Self { x, y, z }
    }

    /// Flat index in y, z, x order, the layout shared by block and light storage.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        (self.y << 8) | (self.z << 4) | self.x
    }

    /// Inverse of [`LocalPos::index`].
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::new(index & 15, (index >> 8) & 15, (index >> 4) & 15)
    }

    /// Iterates every local position of a cube in index order.
    pub fn all() -> impl Iterator<Item = LocalPos> {
        (0..crate::coords::CUBE_VOLUME).map(LocalPos::from_index)
    }
}
