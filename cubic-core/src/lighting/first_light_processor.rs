//! Initial lighting of a cube.
//!
//! Three passes, in order:
//!
//! 1. A sky gradient per voxel line, bounded by the column's opacity index.
//!    Above the line's sky light Y everything is 15; from there light drops
//!    by each voxel's opacity, and by 1 per transparent voxel once it is
//!    below 15. This only depends on the index, so rerunning it is harmless.
//! 2. Diffusion inside the cube: transparent voxels still dark near the
//!    surface and every emitter get a full light update from the world.
//! 3. The same check over the layer of each face neighbor touching the cube,
//!    so light from the new cube reaches its already lit neighbors.
//!
//! A failure in pass 2 makes the whole cube retry; pass 3 failures are only
//! logged since the relight sweep catches them later.

use cubic_utils::{BlockPos, CubePos, LocalPos};

use super::LightingWorld;
use crate::column::OpacityIndex;
use crate::cube::light_storage::MAX_LIGHT;
use crate::cube::{Cube, GeneratorStage, LightKind};
use crate::generator::{CubeProcessor, ProcessOutcome};
use crate::light_engine::Direction;
use crate::world::World;

/// How far below sea level dark transparent voxels still get sky diffusion.
pub const SKY_DIFFUSE_DEPTH: i32 = 16;

/// Lights cubes entering the lighting stage.
#[derive(Debug, Clone)]
pub struct FirstLightProcessor {
    batch_size: usize,
}

impl FirstLightProcessor {
    /// Creates a processor handling up to `batch_size` cubes per cycle.
    #[must_use]
    pub const fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Lights one cube.
    ///
    /// Returns [`ProcessOutcome::Retry`] without changing anything if the cube
    /// or one of its face neighbors has not reached the lighting stage.
    pub fn light_cube<W: LightingWorld>(&self, world: &mut W, pos: CubePos) -> ProcessOutcome {
        if !world.cube_and_neighbors_at_least(pos, GeneratorStage::Lighting) {
            return ProcessOutcome::Retry;
        }

        if world.has_sky() {
            apply_sky_gradient(world, pos);
        }

        for local in LocalPos::all() {
            if !diffuse_voxel(world, pos.block_at(local)) {
                log::trace!("Diffusing light in {pos} deferred");
                return ProcessOutcome::Retry;
            }
        }

        diffuse_boundaries(world, pos);

        if let Some(cube) = world.cube_mut(pos) {
            cube.set_needs_relight(false);
        }
        ProcessOutcome::Done
    }
}

impl CubeProcessor for FirstLightProcessor {
    fn name(&self) -> &'static str {
        "Lighting"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn process(&mut self, world: &mut World, pos: CubePos) -> ProcessOutcome {
        self.light_cube(world, pos)
    }
}

fn apply_sky_gradient<W: LightingWorld>(world: &mut W, pos: CubePos) {
    let Some((cube, index)) = world
        .column_mut(pos.column())
        .and_then(|column| column.cube_and_index_mut(pos.y()))
    else {
        return;
    };
    for x in 0..16 {
        for z in 0..16 {
            sky_gradient_line(cube, index, x, z);
        }
    }
}

/// Writes the sky gradient of one voxel line into `cube`.
pub fn sky_gradient_line(cube: &mut Cube, index: &OpacityIndex, x: usize, z: usize) {
    let cube_min = cube.pos().min_block().y();
    let cube_max = cube.pos().max_block().y();

    let Some(gradient_max) = index.skylight_block_y(x, z) else {
        fill_line(cube, x, z, MAX_LIGHT);
        return;
    };
    let gradient_min = gradient_max - i32::from(MAX_LIGHT);

    if cube_min > gradient_max {
        fill_line(cube, x, z, MAX_LIGHT);
        return;
    }
    if cube_max < gradient_min {
        fill_line(cube, x, z, 0);
        return;
    }

    let mut light = MAX_LIGHT;
    for y in (cube_min..=gradient_max.max(cube_max)).rev() {
        let mut opacity = index.opacity(x, y, z);
        if opacity == 0 && light < MAX_LIGHT {
            opacity = 1;
        }
        light = light.saturating_sub(opacity);
        if y <= cube_max {
            cube.set_light(LightKind::Sky, LocalPos::new(x, (y - cube_min) as usize, z), light);
        }
    }
}

fn fill_line(cube: &mut Cube, x: usize, z: usize, light: u8) {
    for y in 0..16 {
        cube.set_light(LightKind::Sky, LocalPos::new(x, y, z), light);
    }
}

/// Runs the light updates `pos` needs, `false` if one could not run.
fn diffuse_voxel<W: LightingWorld>(world: &mut W, pos: BlockPos) -> bool {
    let Some(cube) = world.cube(pos.cube_pos()) else {
        return false;
    };
    let state = cube.block_state(pos.local());
    let opacity = world.blocks().opacity(state);
    let luminance = world.blocks().luminance(state);

    let needs_sky = world.has_sky()
        && opacity == 0
        && pos.y() >= world.sea_level() - SKY_DIFFUSE_DEPTH
        && world.light_at(LightKind::Sky, pos) == 0;
    if needs_sky && !world.update_lighting_at(LightKind::Sky, pos) {
        return false;
    }
    if luminance > 0 && !world.update_lighting_at(LightKind::Block, pos) {
        return false;
    }
    true
}

fn diffuse_boundaries<W: LightingWorld>(world: &mut W, pos: CubePos) {
    for dir in Direction::ALL {
        let neighbor = dir.relative_cube(pos);
        if world.cube_or_blank(neighbor).is_blank() {
            continue;
        }
        let layer = dir.opposite().boundary_layer();
        'face: for a in 0..16 {
            for b in 0..16 {
                let local = match dir {
                    Direction::Down | Direction::Up => LocalPos::new(a, layer, b),
                    Direction::North | Direction::South => LocalPos::new(a, b, layer),
                    Direction::West | Direction::East => LocalPos::new(layer, a, b),
                };
                if !diffuse_voxel(world, neighbor.block_at(local)) {
                    log::debug!("Light diffusion from {pos} into {neighbor} incomplete");
                    break 'face;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::{BlockRegistry, blocks};
    use crate::config::WorldConfig;
    use crate::cube::LightStorage;
    use crate::lighting::CubeCache;

    fn sky_line(cube: &Cube, x: usize, z: usize) -> Vec<u8> {
        (0..16)
            .rev()
            .map(|y| cube.light(LightKind::Sky, LocalPos::new(x, y, z)))
            .collect()
    }

    fn world_with_box(stage: GeneratorStage) -> World {
        world_with_sized_box(WorldConfig::default(), stage, 1)
    }

    fn world_with_sized_box(config: WorldConfig, stage: GeneratorStage, radius: i32) -> World {
        let mut world = World::new(config, Arc::new(BlockRegistry::vanilla()));
        for x in -radius..=radius {
            for y in -radius..=radius {
                for z in -radius..=radius {
                    world
                        .get_or_create_cube(CubePos::new(x, y, z))
                        .expect("in range")
                        .set_generator_stage(stage);
                }
            }
        }
        world
    }

    #[test]
    fn opaque_floor_darkens_the_cube_below() {
        let mut index = OpacityIndex::new();
        index.set_opacity(0, 64, 0, 15);
        let mut cube = Cube::new(CubePos::new(0, 3, 0));
        sky_gradient_line(&mut cube, &index, 0, 0);
        assert_eq!(sky_line(&cube, 0, 0), vec![0; 16]);

        let mut above = Cube::new(CubePos::new(0, 4, 0));
        sky_gradient_line(&mut above, &index, 0, 0);
        let mut expected = vec![15; 15];
        expected.push(0);
        assert_eq!(sky_line(&above, 0, 0), expected);
    }

    #[test]
    fn translucent_block_starts_a_gradient() {
        let mut index = OpacityIndex::new();
        index.set_opacity(3, 70, 5, 3);

        let mut upper = Cube::new(CubePos::new(0, 4, 0));
        sky_gradient_line(&mut upper, &index, 3, 5);
        // y = 79 down to 64
        assert_eq!(
            sky_line(&upper, 3, 5),
            vec![15, 15, 15, 15, 15, 15, 15, 15, 15, 12, 11, 10, 9, 8, 7, 6]
        );

        let mut lower = Cube::new(CubePos::new(0, 3, 0));
        sky_gradient_line(&mut lower, &index, 3, 5);
        // y = 63 down to 48
        assert_eq!(
            sky_line(&lower, 3, 5),
            vec![5, 4, 3, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn open_sky_is_full_light() {
        let index = OpacityIndex::new();
        let mut cube = Cube::new(CubePos::new(0, -20, 0));
        sky_gradient_line(&mut cube, &index, 9, 9);
        assert_eq!(sky_line(&cube, 9, 9), vec![15; 16]);
    }

    #[test]
    fn gradient_never_increases_downwards() {
        let mut index = OpacityIndex::new();
        let opacities = [0, 1, 3, 0, 0, 2, 15, 0, 1, 0, 4, 0, 0, 1, 0, 0];
        for (i, opacity) in opacities.into_iter().enumerate() {
            index.set_opacity(7, 40 + 3 * i as i32, 2, opacity);
        }
        for cube_y in 1..6 {
            let mut cube = Cube::new(CubePos::new(0, cube_y, 0));
            sky_gradient_line(&mut cube, &index, 7, 2);
            let line = sky_line(&cube, 7, 2);
            assert!(line.windows(2).all(|pair| pair[0] >= pair[1]), "{line:?}");
        }
    }

    #[test]
    fn missing_neighbors_defer_without_changes() {
        let mut world = World::new(WorldConfig::default(), Arc::new(BlockRegistry::vanilla()));
        let pos = CubePos::new(0, 0, 0);
        world
            .get_or_create_cube(pos)
            .expect("in range")
            .set_generator_stage(GeneratorStage::Lighting);

        let processor = FirstLightProcessor::new(5);
        assert_eq!(processor.light_cube(&mut world, pos), ProcessOutcome::Retry);
        let cube = world.cube(pos).expect("loaded");
        assert_eq!(cube.light_storage(LightKind::Sky), &LightStorage::new_empty());
    }

    #[test]
    fn neighbors_behind_in_generation_defer() {
        let mut world = world_with_box(GeneratorStage::Lighting);
        world
            .cube_mut(CubePos::new(0, 1, 0))
            .expect("loaded")
            .set_generator_stage(GeneratorStage::Structures);
        let processor = FirstLightProcessor::new(5);
        assert_eq!(
            processor.light_cube(&mut world, CubePos::new(0, 0, 0)),
            ProcessOutcome::Retry
        );
    }

    #[test]
    fn first_light_fills_open_sky_and_spreads_emitters() {
        let mut world = world_with_box(GeneratorStage::Lighting);
        let torch = BlockPos::new(8, 8, 8);
        world.set_block_state(torch, blocks::TORCH);
        let center = CubePos::new(0, 0, 0);
        world
            .cube_mut(center)
            .expect("loaded")
            .set_needs_relight(true);

        let processor = FirstLightProcessor::new(5);
        assert_eq!(processor.light_cube(&mut world, center), ProcessOutcome::Done);

        let cube = world.cube(center).expect("loaded");
        assert!(!cube.needs_relight());
        assert_eq!(cube.light_storage(LightKind::Sky), &LightStorage::new_filled(15));
        assert_eq!(world.light_at(LightKind::Block, torch), 14);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(0, -2, 0)), 12);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(-9, 0, 0)), 5);
    }

    #[test]
    fn relighting_a_lit_cube_changes_nothing() {
        let mut world = world_with_box(GeneratorStage::Lighting);
        for x in 0..16 {
            for z in 0..16 {
                world.set_block_state(BlockPos::new(x, 3, z), blocks::STONE);
            }
        }
        world.set_block_state(BlockPos::new(4, 9, 4), blocks::TORCH);
        let center = CubePos::new(0, 0, 0);
        let processor = FirstLightProcessor::new(5);
        assert_eq!(processor.light_cube(&mut world, center), ProcessOutcome::Done);

        let snapshot = world.cube(center).expect("loaded").clone();
        assert_eq!(processor.light_cube(&mut world, center), ProcessOutcome::Done);
        let cube = world.cube(center).expect("loaded");
        for kind in LightKind::ALL {
            assert_eq!(cube.light_storage(kind), snapshot.light_storage(kind));
        }
        assert_eq!(cube.light(LightKind::Sky, LocalPos::new(0, 2, 0)), 0);
        assert_eq!(cube.light(LightKind::Sky, LocalPos::new(0, 4, 0)), 15);
    }

    #[test]
    fn emitters_on_a_neighbor_face_are_lit() {
        let mut world = world_with_sized_box(WorldConfig::default(), GeneratorStage::Lighting, 2);
        // West face layer of cube (1, 0, 0)
        let torch = BlockPos::new(16, 8, 8);
        world.set_block_state(torch, blocks::TORCH);
        assert_eq!(world.light_at(LightKind::Block, torch), 0);

        let processor = FirstLightProcessor::new(5);
        assert_eq!(
            processor.light_cube(&mut world, CubePos::new(0, 0, 0)),
            ProcessOutcome::Done
        );
        assert_eq!(world.light_at(LightKind::Block, torch), 14);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(-1, 0, 0)), 13);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(4, 0, 0)), 10);
    }

    #[test]
    fn neighbor_face_without_loaded_surroundings_is_skipped() {
        let mut world = world_with_box(GeneratorStage::Lighting);
        // cube (1, 0, 0) sits on the edge of the loaded box
        let torch = BlockPos::new(16, 8, 8);
        world.set_block_state(torch, blocks::TORCH);

        let processor = FirstLightProcessor::new(5);
        assert_eq!(
            processor.light_cube(&mut world, CubePos::new(0, 0, 0)),
            ProcessOutcome::Done
        );
        assert_eq!(world.light_at(LightKind::Block, torch), 0);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(-1, 0, 0)), 0);
    }

    #[test]
    fn worlds_without_sky_only_get_block_light() {
        let config = WorldConfig {
            has_sky: false,
            ..WorldConfig::default()
        };
        let mut world = world_with_sized_box(config, GeneratorStage::Lighting, 1);
        let torch = BlockPos::new(3, 5, 12);
        world.set_block_state(torch, blocks::TORCH);
        let center = CubePos::new(0, 0, 0);

        let processor = FirstLightProcessor::new(5);
        assert_eq!(processor.light_cube(&mut world, center), ProcessOutcome::Done);

        let cube = world.cube(center).expect("loaded");
        assert_eq!(cube.light_storage(LightKind::Sky), &LightStorage::new_empty());
        assert_eq!(world.light_at(LightKind::Sky, BlockPos::new(0, 15, 0)), 0);
        assert_eq!(world.light_at(LightKind::Sky, BlockPos::new(0, 500, 0)), 0);
        assert_eq!(world.light_at(LightKind::Block, torch), 14);
        assert_eq!(world.light_at(LightKind::Block, torch.offset(0, 0, 3)), 11);
    }
}
