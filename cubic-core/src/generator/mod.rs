//! Staged cube generation.
mod cube_processor;
mod flat_terrain;
mod generator_pipeline;
mod pass_through;

use thiserror::Error;

pub use cube_processor::{CubeProcessor, ProcessOutcome};
pub use flat_terrain::FlatTerrainProcessor;
pub use generator_pipeline::{GeneratorPipeline, TickReport};
pub use pass_through::PassThroughProcessor;

use crate::block::BlockRegistry;
use crate::config::WorldConfig;
use crate::cube::GeneratorStage;
use crate::lighting::FirstLightProcessor;

/// Errors raised while assembling a pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A stage before [`GeneratorStage::Live`] has no processor.
    #[error("no processor registered for the {0} stage")]
    MissingProcessor(GeneratorStage),
    /// A stage was registered twice.
    #[error("a processor is already registered for the {0} stage")]
    DuplicateStage(GeneratorStage),
    /// Processors cannot be bound to the final stage.
    #[error("the live stage does not take a processor")]
    LiveStage,
    /// A flat layer names a block that is not registered.
    #[error("unknown block `{0}` in flat layers")]
    UnknownBlock(String),
    /// Flat layers stack past the addressable height.
    #[error("flat layer `{0}` ends above the addressable height")]
    LayerOverflow(String),
}

/// The standard pipeline: flat terrain, pass-through surface and structures,
/// first light, and pass-through features.
pub fn default_pipeline(
    config: &WorldConfig,
    blocks: &BlockRegistry,
) -> Result<GeneratorPipeline, PipelineError> {
    let sizes = config.batch_sizes;
    let mut pipeline = GeneratorPipeline::new();
    pipeline.add_stage(
        GeneratorStage::Terrain,
        Box::new(FlatTerrainProcessor::new(config, blocks)?),
    )?;
    pipeline.add_stage(
        GeneratorStage::Surface,
        Box::new(PassThroughProcessor::new("Surface", sizes.surface)),
    )?;
    pipeline.add_stage(
        GeneratorStage::Structures,
        Box::new(PassThroughProcessor::new("Structures", sizes.structures)),
    )?;
    pipeline.add_stage(
        GeneratorStage::Lighting,
        Box::new(FirstLightProcessor::new(sizes.lighting)),
    )?;
    pipeline.add_stage(
        GeneratorStage::Features,
        Box::new(PassThroughProcessor::new("Features", sizes.features)),
    )?;
    pipeline.check_stages()?;
    Ok(pipeline)
}
