//! # Cubic Core
//!
//! A vertically unbounded voxel world built from 16x16x16 cubes stacked in
//! columns. Each column keeps an opacity index of its voxel lines, which
//! drives the sky light gradient cubes receive when they are first lit.
//! Cubes move through a staged generation pipeline; lighting is one of the
//! stages and defers until the neighborhood is ready.
pub mod block;
pub mod column;
pub mod config;
pub mod cube;
pub mod cube_io;
pub mod entity_container;
pub mod generator;
pub mod light_engine;
pub mod lighting;
pub mod ticks;
pub mod world;

pub use block::BlockRegistry;
pub use column::Column;
pub use config::WorldConfig;
pub use cube::{Cube, GeneratorStage, LightKind};
pub use world::{World, WorldContext};
