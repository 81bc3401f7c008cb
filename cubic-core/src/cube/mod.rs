//! A 16x16x16 section of the world with its block and light data.
mod block_storage;
mod generator_stage;
pub mod light_storage;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cubic_utils::{BlockPos, BlockStateId, CubePos, LocalPos};
use simdnbt::owned::NbtCompound;

pub use block_storage::BlockStorage;
pub use generator_stage::GeneratorStage;
pub use light_storage::{LightKind, LightStorage};

use crate::entity_container::EntityContainer;
use crate::ticks::{CubeTicks, ScheduledTick};

static BLANK: LazyLock<Cube> = LazyLock::new(|| {
    let mut cube = Cube::new(CubePos::default());
    cube.blank = true;
    cube
});

/// A cube of voxels.
#[derive(Debug, Clone)]
pub struct Cube {
    pos: CubePos,
    blocks: BlockStorage,
    sky_light: LightStorage,
    block_light: LightStorage,
    stage: GeneratorStage,
    needs_relight: bool,
    block_entities: BTreeMap<LocalPos, NbtCompound>,
    ticks: CubeTicks<BlockStateId>,
    entities: EntityContainer,
    modified: bool,
    blank: bool,
}

impl Cube {
    /// Creates an empty cube at the first generation stage.
    #[must_use]
    pub fn new(pos: CubePos) -> Self {
        Self {
            pos,
            blocks: BlockStorage::Empty,
            sky_light: LightStorage::new_empty(),
            block_light: LightStorage::new_empty(),
            stage: GeneratorStage::Terrain,
            needs_relight: false,
            block_entities: BTreeMap::new(),
            ticks: CubeTicks::new(),
            entities: EntityContainer::new(),
            modified: false,
            blank: false,
        }
    }

    /// The shared read-only stand-in for cubes that are not loaded.
    ///
    /// It is all air and never advances past the first stage, so stage checks
    /// against an unloaded neighbor always fail.
    #[must_use]
    pub fn blank() -> &'static Cube {
        &BLANK
    }

    /// Whether this is the [`Cube::blank`] sentinel.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.blank
    }

    /// Position of the cube.
    #[must_use]
    pub const fn pos(&self) -> CubePos {
        self.pos
    }

    /// Whether no block storage is allocated (every voxel is air).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The raw block storage.
    #[must_use]
    pub const fn block_storage(&self) -> &BlockStorage {
        &self.blocks
    }

    /// Replaces the block storage. The owning column's opacity index is not touched.
    pub(crate) fn set_block_storage(&mut self, blocks: BlockStorage) {
        self.blocks = blocks;
    }

    /// The state at a local position.
    #[must_use]
    #[inline]
    pub fn block_state(&self, pos: LocalPos) -> BlockStateId {
        self.blocks.get(pos)
    }

    /// Writes a state and returns the previous one, or `None` if nothing changed.
    ///
    /// Only the owning column may call this since it must keep its opacity
    /// index in step with every change.
    pub(crate) fn set_block_state(
        &mut self,
        pos: LocalPos,
        state: BlockStateId,
    ) -> Option<BlockStateId> {
        let old = self.blocks.set(pos, state)?;
        self.block_entities.remove(&pos);
        self.modified = true;
        Some(old)
    }

    /// Light level of one channel at a local position.
    #[must_use]
    #[inline]
    pub fn light(&self, kind: LightKind, pos: LocalPos) -> u8 {
        self.light_storage(kind).get(pos)
    }

    /// Writes a light level.
    #[inline]
    pub fn set_light(&mut self, kind: LightKind, pos: LocalPos, level: u8) {
        let changed = match kind {
            LightKind::Sky => self.sky_light.set(pos, level),
            LightKind::Block => self.block_light.set(pos, level),
        };
        self.modified |= changed;
    }

    /// Light storage of one channel.
    #[must_use]
    pub const fn light_storage(&self, kind: LightKind) -> &LightStorage {
        match kind {
            LightKind::Sky => &self.sky_light,
            LightKind::Block => &self.block_light,
        }
    }

    /// Replaces the light storage of one channel.
    pub fn set_light_storage(&mut self, kind: LightKind, storage: LightStorage) {
        match kind {
            LightKind::Sky => self.sky_light = storage,
            LightKind::Block => self.block_light = storage,
        }
        self.modified = true;
    }

    /// Current generation stage.
    #[must_use]
    pub const fn generator_stage(&self) -> GeneratorStage {
        self.stage
    }

    /// Moves the cube to `stage`.
    pub fn set_generator_stage(&mut self, stage: GeneratorStage) {
        if self.stage != stage {
            self.stage = stage;
            self.modified = true;
        }
    }

    /// Whether the cube must be lit again, e.g. after loading with a stale index.
    #[must_use]
    pub const fn needs_relight(&self) -> bool {
        self.needs_relight
    }

    /// Sets the relight flag.
    pub fn set_needs_relight(&mut self, needs_relight: bool) {
        self.needs_relight = needs_relight;
    }

    /// Block entity data at a local position.
    #[must_use]
    pub fn block_entity(&self, pos: LocalPos) -> Option<&NbtCompound> {
        self.block_entities.get(&pos)
    }

    /// Stores block entity data, replacing what was there.
    pub fn set_block_entity(&mut self, pos: LocalPos, data: NbtCompound) {
        self.block_entities.insert(pos, data);
        self.modified = true;
    }

    /// Removes block entity data.
    pub fn remove_block_entity(&mut self, pos: LocalPos) -> Option<NbtCompound> {
        let removed = self.block_entities.remove(&pos);
        self.modified |= removed.is_some();
        removed
    }

    /// All block entities in position order.
    pub fn block_entities(&self) -> impl Iterator<Item = (LocalPos, &NbtCompound)> {
        self.block_entities.iter().map(|(pos, data)| (*pos, data))
    }

    /// Schedules a block tick. The position must lie in this cube.
    pub fn schedule_tick(&mut self, tick: ScheduledTick<BlockStateId>) -> bool {
        debug_assert!(self.pos.contains(tick.pos));
        let scheduled = self.ticks.schedule(tick);
        self.modified |= scheduled;
        scheduled
    }

    /// Pending block ticks.
    #[must_use]
    pub const fn ticks(&self) -> &CubeTicks<BlockStateId> {
        &self.ticks
    }

    /// Pending block ticks, mutably.
    pub fn ticks_mut(&mut self) -> &mut CubeTicks<BlockStateId> {
        &mut self.ticks
    }

    /// Entities stored with this cube.
    #[must_use]
    pub const fn entities(&self) -> &EntityContainer {
        &self.entities
    }

    /// Entities stored with this cube, mutably.
    pub fn entities_mut(&mut self) -> &mut EntityContainer {
        &mut self.entities
    }

    /// Whether the block lies in this cube.
    #[must_use]
    pub const fn contains(&self, pos: BlockPos) -> bool {
        self.pos.contains(pos)
    }

    /// Whether the cube changed since it was last saved.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified || self.entities.is_modified()
    }

    /// Flags the cube as changed.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Clears the modified flags after a save.
    pub fn mark_saved(&mut self) {
        self.modified = false;
        self.entities.mark_saved();
    }
}
