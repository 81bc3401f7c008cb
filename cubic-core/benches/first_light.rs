//! Benchmarks first light of a surface cube.
#![allow(missing_docs, clippy::unwrap_used)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use cubic_core::generator::{CubeProcessor, FlatTerrainProcessor};
use cubic_core::lighting::FirstLightProcessor;
use cubic_core::{BlockRegistry, GeneratorStage, World, WorldConfig};
use cubic_utils::CubePos;

/// A 3x3x3 block of cubes around the surface, terrain placed, ready for light.
fn surface_world() -> World {
    let blocks = Arc::new(BlockRegistry::vanilla());
    let config = WorldConfig::default();
    let mut terrain = FlatTerrainProcessor::new(&config, &blocks).expect("default layers");
    let mut world = World::new(config, blocks);
    for x in -1..=1 {
        for y in 2..=4 {
            for z in -1..=1 {
                let pos = CubePos::new(x, y, z);
                world.get_or_create_cube(pos).expect("in range");
                terrain.process(&mut world, pos);
                world
                    .get_or_create_cube(pos)
                    .expect("in range")
                    .set_generator_stage(GeneratorStage::Lighting);
            }
        }
    }
    world
}

fn bench_first_light(c: &mut Criterion) {
    let processor = FirstLightProcessor::new(1);
    c.bench_function("first_light_surface_cube", |b| {
        b.iter_batched(
            surface_world,
            |mut world| black_box(processor.light_cube(&mut world, CubePos::new(0, 3, 0))),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_first_light);
criterion_main!(benches);
