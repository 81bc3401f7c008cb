//! A vertical stack of cubes sharing one opacity index.
pub mod opacity_index;
mod relight_checks;

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::RangeInclusive;

use cubic_utils::coords::{block_to_cube, CUBE_AREA};
use cubic_utils::{BlockPos, BlockStateId, ColumnPos, CubeRange};
use smallvec::SmallVec;

pub use opacity_index::{OpacityIndex, OpacityIndexError};
pub use relight_checks::{RelightCursor, RelightLine};

use crate::block::{blocks, BlockRegistry};
use crate::cube::{Cube, LightKind};
use crate::entity_container::EntityContainer;

/// Biome id of a line whose biome has not been decided.
pub const UNSET_BIOME: u8 = 0xFF;

/// Result of a block edit made through [`Column::set_block_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEdit {
    /// The state that was replaced.
    pub old_state: BlockStateId,
    /// Sky light Y of the edited line before the edit.
    pub old_skylight_y: Option<i32>,
    /// Sky light Y of the edited line after the edit.
    pub new_skylight_y: Option<i32>,
}

impl BlockEdit {
    /// Block Ys whose direct sky exposure changed, if any.
    ///
    /// When the line gained or lost its only opaque block the range reaches
    /// down to `floor`, the lowest block the caller has loaded.
    #[must_use]
    pub fn sky_exposure_change(&self, floor: i32) -> Option<RangeInclusive<i32>> {
        let (low, high) = match (self.old_skylight_y, self.new_skylight_y) {
            (Some(old), Some(new)) if old != new => (old.min(new), old.max(new)),
            (None, Some(sky)) | (Some(sky), None) => (floor.min(sky), sky),
            _ => return None,
        };
        Some(low..=high - 1)
    }
}

/// A column of cubes.
#[derive(Debug, Clone)]
pub struct Column {
    pos: ColumnPos,
    cubes: BTreeMap<i32, Cube>,
    opacity_index: OpacityIndex,
    biomes: Box<[u8; CUBE_AREA]>,
    entities: EntityContainer,
    relight: RelightCursor,
    modified: bool,
}

impl Column {
    /// Creates a column with no cubes.
    #[must_use]
    pub fn new(pos: ColumnPos) -> Self {
        Self {
            pos,
            cubes: BTreeMap::new(),
            opacity_index: OpacityIndex::new(),
            biomes: Box::new([UNSET_BIOME; CUBE_AREA]),
            entities: EntityContainer::new(),
            relight: RelightCursor::default(),
            modified: false,
        }
    }

    /// Position of the column.
    #[must_use]
    pub const fn pos(&self) -> ColumnPos {
        self.pos
    }

    /// The cube at `y`, with no side effects.
    #[must_use]
    pub fn cube(&self, y: i32) -> Option<&Cube> {
        self.cubes.get(&y)
    }

    /// The cube at `y`, mutably.
    pub fn cube_mut(&mut self, y: i32) -> Option<&mut Cube> {
        self.cubes.get_mut(&y)
    }

    /// The cube at `y`, created empty if missing.
    pub fn get_or_create_cube(&mut self, y: i32) -> &mut Cube {
        let pos = self.pos;
        self.cubes
            .entry(y)
            .or_insert_with(|| Cube::new(pos.cube(y)))
    }

    /// Inserts a cube, replacing any at the same height. The cube must belong to this column.
    pub fn insert_cube(&mut self, cube: Cube) -> Option<Cube> {
        debug_assert_eq!(cube.pos().column(), self.pos);
        self.cubes.insert(cube.pos().y(), cube)
    }

    /// Removes and returns the cube at `y`.
    pub fn remove_cube(&mut self, y: i32) -> Option<Cube> {
        self.cubes.remove(&y)
    }

    /// A cube together with the column's opacity index.
    pub fn cube_and_index_mut(&mut self, y: i32) -> Option<(&mut Cube, &OpacityIndex)> {
        let cube = self.cubes.get_mut(&y)?;
        Some((cube, &self.opacity_index))
    }

    /// Loaded cubes with `min_y <= y <= max_y`, lowest first.
    ///
    /// The iterator borrows the live map; call again to restart it.
    pub fn cubes(&self, min_y: i32, max_y: i32) -> btree_map::Range<'_, i32, Cube> {
        if min_y > max_y {
            return self.cubes.range(0..0);
        }
        self.cubes.range(min_y..=max_y)
    }

    /// Every loaded cube, lowest first.
    pub fn all_cubes(&self) -> impl Iterator<Item = &Cube> {
        self.cubes.values()
    }

    /// Every loaded cube, mutably.
    pub fn all_cubes_mut(&mut self) -> impl Iterator<Item = &mut Cube> {
        self.cubes.values_mut()
    }

    /// Ys of the loaded cubes, lowest first.
    pub fn cube_ys(&self) -> impl Iterator<Item = i32> + '_ {
        self.cubes.keys().copied()
    }

    /// Whether any cube is loaded.
    #[must_use]
    pub fn has_cubes(&self) -> bool {
        !self.cubes.is_empty()
    }

    /// Highest loaded cube Y.
    #[must_use]
    pub fn top_cube_y(&self) -> Option<i32> {
        self.cubes.keys().next_back().copied()
    }

    /// Lowest loaded cube Y.
    #[must_use]
    pub fn bottom_cube_y(&self) -> Option<i32> {
        self.cubes.keys().next().copied()
    }

    /// Y of the highest cube holding an opaque block, loaded or not.
    #[must_use]
    pub fn top_filled_cube_y(&self) -> Option<i32> {
        self.opacity_index.highest_top_block_y().map(block_to_cube)
    }

    /// Runs of consecutive loaded cube Ys.
    #[must_use]
    pub fn cube_y_ranges(&self) -> Vec<CubeRange> {
        CubeRange::from_sorted(self.cube_ys())
    }

    /// Whether every loaded cube overlapping the block Y range is empty.
    #[must_use]
    pub fn are_levels_empty(&self, min_block_y: i32, max_block_y: i32) -> bool {
        self.cubes(block_to_cube(min_block_y), block_to_cube(max_block_y))
            .all(|(_, cube)| cube.is_empty())
    }

    /// The shared opacity index.
    #[must_use]
    pub const fn opacity_index(&self) -> &OpacityIndex {
        &self.opacity_index
    }

    /// Replaces the opacity index, used when loading saved data.
    pub fn set_opacity_index(&mut self, index: OpacityIndex) {
        self.opacity_index = index;
    }

    /// Sky light Y of the line holding `pos`, see [`OpacityIndex::skylight_block_y`].
    #[must_use]
    pub fn skylight_block_y(&self, x: usize, z: usize) -> Option<i32> {
        self.opacity_index.skylight_block_y(x, z)
    }

    /// Whether the block receives direct sky light.
    #[must_use]
    pub fn can_see_sky(&self, pos: BlockPos) -> bool {
        let local = pos.local();
        self.opacity_index.can_see_sky(local.x, pos.y(), local.z)
    }

    /// The state at a world position, air where no cube is loaded.
    #[must_use]
    pub fn block_state(&self, pos: BlockPos) -> BlockStateId {
        self.cube(block_to_cube(pos.y()))
            .map_or(blocks::AIR, |cube| cube.block_state(pos.local()))
    }

    /// Writes a block, creating its cube if needed, and keeps the opacity index in step.
    ///
    /// Returns `None` when the state was already set.
    pub fn set_block_state(
        &mut self,
        pos: BlockPos,
        state: BlockStateId,
        registry: &BlockRegistry,
    ) -> Option<BlockEdit> {
        debug_assert_eq!(pos.column_pos(), self.pos);
        let local = pos.local();
        let old_state = self
            .get_or_create_cube(block_to_cube(pos.y()))
            .set_block_state(local, state)?;

        let old_skylight_y = self.opacity_index.skylight_block_y(local.x, local.z);
        self.opacity_index
            .set_opacity(local.x, pos.y(), local.z, registry.opacity(state));
        let new_skylight_y = self.opacity_index.skylight_block_y(local.x, local.z);

        self.modified = true;
        Some(BlockEdit {
            old_state,
            old_skylight_y,
            new_skylight_y,
        })
    }

    /// Light at a world position.
    ///
    /// Missing cubes read as 15 sky light where the sky is visible and 0 otherwise.
    #[must_use]
    pub fn light_at(&self, kind: LightKind, pos: BlockPos, has_sky: bool) -> u8 {
        match self.cube(block_to_cube(pos.y())) {
            Some(cube) => cube.light(kind, pos.local()),
            None if kind == LightKind::Sky && has_sky && self.can_see_sky(pos) => 15,
            None => 0,
        }
    }

    /// Biome of a line, `None` while unset.
    #[must_use]
    pub fn biome(&self, x: usize, z: usize) -> Option<u8> {
        let biome = self.biomes[(z << 4) | x];
        (biome != UNSET_BIOME).then_some(biome)
    }

    /// Sets the biome of a line.
    pub fn set_biome(&mut self, x: usize, z: usize, biome: u8) {
        self.biomes[(z << 4) | x] = biome;
        self.modified = true;
    }

    /// Raw biome bytes in `z * 16 + x` order.
    #[must_use]
    pub fn biomes(&self) -> &[u8; CUBE_AREA] {
        &self.biomes
    }

    /// Replaces all biome bytes.
    pub fn set_biomes(&mut self, biomes: [u8; CUBE_AREA]) {
        *self.biomes = biomes;
        self.modified = true;
    }

    /// Entities stored with the column.
    #[must_use]
    pub const fn entities(&self) -> &EntityContainer {
        &self.entities
    }

    /// Entities stored with the column, mutably.
    pub fn entities_mut(&mut self) -> &mut EntityContainer {
        &mut self.entities
    }

    /// Next lines for the relight sweep, at most `budget`.
    pub fn next_relight_lines(&mut self, budget: usize) -> SmallVec<[RelightLine; 4]> {
        let cubes = &self.cubes;
        self.relight
            .next_lines(budget, || cubes.keys().copied().collect::<Vec<_>>())
    }

    /// Restarts the relight sweep over the current cubes.
    pub fn reset_relight_checks(&mut self) {
        self.relight.reset(self.cubes.keys().copied());
    }

    /// Whether the column itself (not its cubes) changed since it was last saved.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified || self.entities.is_modified()
    }

    /// Clears the column's modified flags.
    pub fn mark_saved(&mut self) {
        self.modified = false;
        self.entities.mark_saved();
    }
}
