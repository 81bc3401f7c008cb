//! The loaded part of a world and the light primitive built on it.
mod context;
mod light_access;

use std::collections::BTreeMap;
use std::sync::Arc;

use cubic_utils::coords::cube_to_min_block;
use cubic_utils::{
    AddressError, BlockPos, BlockStateId, ColumnAddress, ColumnPos, CubeAddress, CubePos, LocalPos,
};

pub use context::WorldContext;
use light_access::WorldLightAccess;

use crate::block::{BlockRegistry, blocks};
use crate::column::Column;
use crate::config::WorldConfig;
use crate::cube::{Cube, GeneratorStage, LightKind};
use crate::light_engine::{Direction, LightEngine};
use crate::lighting::{CubeCache, LightingWorld};

/// Columns of one world, keyed by packed address.
#[derive(Debug)]
pub struct World {
    columns: BTreeMap<ColumnAddress, Column>,
    blocks: Arc<BlockRegistry>,
    config: WorldConfig,
    light_engine: LightEngine,
    game_time: u64,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: WorldConfig, blocks: Arc<BlockRegistry>) -> Self {
        Self {
            columns: BTreeMap::new(),
            blocks,
            config,
            light_engine: LightEngine::new(),
            game_time: 0,
        }
    }

    /// World settings.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Shared handle to the block registry.
    #[must_use]
    pub fn registry(&self) -> Arc<BlockRegistry> {
        Arc::clone(&self.blocks)
    }

    /// Ticks since the world was created.
    #[must_use]
    pub const fn game_time(&self) -> u64 {
        self.game_time
    }

    /// Sets the game time, used when restoring a save.
    pub fn set_game_time(&mut self, game_time: u64) {
        self.game_time = game_time;
    }

    /// The column at `pos`, created empty if missing.
    pub fn get_or_create_column(&mut self, pos: ColumnPos) -> Result<&mut Column, AddressError> {
        let address = ColumnAddress::encode(pos)?;
        Ok(self
            .columns
            .entry(address)
            .or_insert_with(|| Column::new(pos)))
    }

    /// Inserts a loaded column, replacing any existing one.
    pub fn insert_column(&mut self, mut column: Column) -> Result<Option<Column>, AddressError> {
        let address = ColumnAddress::encode(column.pos())?;
        column.reset_relight_checks();
        Ok(self.columns.insert(address, column))
    }

    /// Removes a column and its cubes.
    pub fn remove_column(&mut self, pos: ColumnPos) -> Option<Column> {
        let address = ColumnAddress::encode(pos).ok()?;
        self.columns.remove(&address)
    }

    /// Loaded columns in address order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Loaded columns, mutably.
    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.values_mut()
    }

    /// Number of loaded columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The cube at `pos`, created empty (with its column) if missing.
    pub fn get_or_create_cube(&mut self, pos: CubePos) -> Result<&mut Cube, AddressError> {
        CubeAddress::encode(pos)?;
        Ok(self
            .get_or_create_column(pos.column())?
            .get_or_create_cube(pos.y()))
    }

    /// Removes a cube. Its column stays loaded.
    pub fn remove_cube(&mut self, pos: CubePos) -> Option<Cube> {
        self.column_mut(pos.column())?.remove_cube(pos.y())
    }

    /// The state at a world position, air where nothing is loaded.
    #[must_use]
    pub fn block_state(&self, pos: BlockPos) -> BlockStateId {
        self.column(pos.column_pos())
            .map_or(blocks::AIR, |column| column.block_state(pos))
    }

    /// Writes a block and returns the replaced state.
    ///
    /// Returns `None` when nothing changed or `pos` is outside the addressable
    /// world. Light is only updated once the cube has had its first light;
    /// earlier stages leave that to the lighting stage.
    pub fn set_block_state(&mut self, pos: BlockPos, state: BlockStateId) -> Option<BlockStateId> {
        CubeAddress::encode(pos.cube_pos()).ok()?;
        let column_address = ColumnAddress::encode(pos.column_pos()).ok()?;
        let column = self
            .columns
            .entry(column_address)
            .or_insert_with(|| Column::new(pos.column_pos()));
        let edit = column.set_block_state(pos, state, &self.blocks)?;

        let lit = column
            .cube(pos.cube_pos().y())
            .is_some_and(|cube| cube.generator_stage() > GeneratorStage::Lighting);
        if !lit {
            return Some(edit.old_state);
        }

        let floor = column.bottom_cube_y().map_or(pos.y(), cube_to_min_block);
        if let Some(range) = edit.sky_exposure_change(floor) {
            for y in range.rev() {
                self.update_lighting_at(LightKind::Sky, BlockPos::new(pos.x(), y, pos.z()));
            }
        }
        self.check_light(pos);
        Some(edit.old_state)
    }

    /// Light at a world position, using the sky default for missing cubes.
    #[must_use]
    pub fn light_at(&self, kind: LightKind, pos: BlockPos) -> u8 {
        let has_sky = self.config.has_sky;
        self.column(pos.column_pos()).map_or_else(
            || kind.default_level(has_sky),
            |column| column.light_at(kind, pos, has_sky),
        )
    }

    /// Runs the flood fill for one channel at `pos`.
    ///
    /// Sky light is a no-op in worlds without a sky.
    pub fn update_lighting_at(&mut self, kind: LightKind, pos: BlockPos) -> bool {
        if kind == LightKind::Sky && !self.config.has_sky {
            return true;
        }
        let mut access = WorldLightAccess {
            columns: &mut self.columns,
            blocks: &self.blocks,
        };
        self.light_engine.check_light(&mut access, kind, pos)
    }

    /// Updates both channels at `pos`.
    pub fn check_light(&mut self, pos: BlockPos) -> bool {
        let sky = self.update_lighting_at(LightKind::Sky, pos);
        let block = self.update_lighting_at(LightKind::Block, pos);
        sky && block
    }

    /// Advances every column's relight sweep by the configured number of lines.
    ///
    /// Air voxels of already lit cubes are rechecked, together with any
    /// light-emitting neighbor. Returns the number of lines visited.
    pub fn tick_relight_checks(&mut self) -> usize {
        let budget = self.config.relight_checks_per_tick;
        if budget == 0 {
            return 0;
        }
        let mut lines = Vec::new();
        for column in self.columns.values_mut() {
            let pos = column.pos();
            lines.extend(column.next_relight_lines(budget).into_iter().map(|l| (pos, l)));
        }

        for (column, line) in &lines {
            let cube_pos = column.cube(line.cube_y);
            let lit = self
                .cube(cube_pos)
                .is_some_and(|cube| cube.generator_stage() > GeneratorStage::Lighting);
            if !lit {
                continue;
            }
            for y in 0..16 {
                let pos = cube_pos.block_at(LocalPos::new(line.x, y, line.z));
                if self.block_state(pos) != blocks::AIR {
                    continue;
                }
                for dir in Direction::ALL {
                    let neighbor = dir.relative(pos);
                    if self.blocks.luminance(self.block_state(neighbor)) > 0 {
                        self.check_light(neighbor);
                    }
                }
                self.check_light(pos);
            }
        }
        lines.len()
    }

    /// Advances the game clock by one tick.
    pub fn advance_time(&mut self) {
        self.game_time += 1;
    }
}

impl CubeCache for World {
    fn cube(&self, pos: CubePos) -> Option<&Cube> {
        self.column(pos.column())?.cube(pos.y())
    }

    fn cube_mut(&mut self, pos: CubePos) -> Option<&mut Cube> {
        self.column_mut(pos.column())?.cube_mut(pos.y())
    }

    fn column(&self, pos: ColumnPos) -> Option<&Column> {
        let address = ColumnAddress::encode(pos).ok()?;
        self.columns.get(&address)
    }

    fn column_mut(&mut self, pos: ColumnPos) -> Option<&mut Column> {
        let address = ColumnAddress::encode(pos).ok()?;
        self.columns.get_mut(&address)
    }
}

impl LightingWorld for World {
    fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    fn has_sky(&self) -> bool {
        self.config.has_sky
    }

    fn sea_level(&self) -> i32 {
        self.config.sea_level
    }

    fn light_at(&self, kind: LightKind, pos: BlockPos) -> u8 {
        World::light_at(self, kind, pos)
    }

    fn update_lighting_at(&mut self, kind: LightKind, pos: BlockPos) -> bool {
        World::update_lighting_at(self, kind, pos)
    }
}
