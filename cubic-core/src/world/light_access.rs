use std::collections::BTreeMap;

use cubic_utils::{BlockPos, ColumnAddress, ColumnPos, CubePos};

use crate::block::BlockRegistry;
use crate::column::Column;
use crate::cube::LightKind;
use crate::light_engine::LightAccess;

/// Borrowed view of the world's columns handed to the light engine.
pub(super) struct WorldLightAccess<'a> {
    pub(super) columns: &'a mut BTreeMap<ColumnAddress, Column>,
    pub(super) blocks: &'a BlockRegistry,
}

impl WorldLightAccess<'_> {
    fn column(&self, pos: ColumnPos) -> Option<&Column> {
        ColumnAddress::encode(pos)
            .ok()
            .and_then(|address| self.columns.get(&address))
    }
}

impl LightAccess for WorldLightAccess<'_> {
    fn is_cube_loaded(&self, pos: CubePos) -> bool {
        self.column(pos.column())
            .is_some_and(|column| column.cube(pos.y()).is_some())
    }

    fn light(&self, kind: LightKind, pos: BlockPos) -> u8 {
        self.column(pos.column_pos())
            .and_then(|column| column.cube(pos.cube_pos().y()))
            .map_or(0, |cube| cube.light(kind, pos.local()))
    }

    fn set_light(&mut self, kind: LightKind, pos: BlockPos, level: u8) {
        let Ok(address) = ColumnAddress::encode(pos.column_pos()) else {
            return;
        };
        if let Some(cube) = self
            .columns
            .get_mut(&address)
            .and_then(|column| column.cube_mut(pos.cube_pos().y()))
        {
            cube.set_light(kind, pos.local(), level);
        }
    }

    fn opacity(&self, pos: BlockPos) -> u8 {
        let local = pos.local();
        self.column(pos.column_pos())
            .map_or(0, |column| column.opacity_index().opacity(local.x, pos.y(), local.z))
    }

    fn luminance(&self, pos: BlockPos) -> u8 {
        self.column(pos.column_pos())
            .map_or(0, |column| self.blocks.luminance(column.block_state(pos)))
    }

    fn can_see_sky(&self, pos: BlockPos) -> bool {
        self.column(pos.column_pos())
            .is_none_or(|column| column.can_see_sky(pos))
    }
}
