//! World settings shared by the simulation and its generation stages.
use serde::{Deserialize, Serialize};

/// One layer of the flat terrain stage, stacked bottom up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLayer {
    /// Block registry name.
    pub block: String,
    /// Thickness in blocks.
    pub height: u32,
}

impl FlatLayer {
    fn new(block: &str, height: u32) -> Self {
        Self {
            block: block.to_owned(),
            height,
        }
    }
}

/// Cubes each stage may process per pipeline cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSizes {
    /// Terrain stage.
    pub terrain: usize,
    /// Surface stage.
    pub surface: usize,
    /// Structures stage.
    pub structures: usize,
    /// Lighting stage.
    pub lighting: usize,
    /// Features stage.
    pub features: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            terrain: 5,
            surface: 10,
            structures: 10,
            lighting: 5,
            features: 100,
        }
    }
}

impl BatchSizes {
    /// All sizes in stage order.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 5] {
        [
            self.terrain,
            self.surface,
            self.structures,
            self.lighting,
            self.features,
        ]
    }
}

/// Settings of one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Sea level in blocks. Sky light is only diffused at or above `sea_level - 16`.
    pub sea_level: i32,
    /// Whether the dimension has a sky.
    pub has_sky: bool,
    /// Voxel lines per column re-checked for light each tick.
    pub relight_checks_per_tick: usize,
    /// Y of the bottom of the first flat layer.
    pub flat_base_y: i32,
    /// Flat terrain layers, bottom first.
    pub flat_layers: Vec<FlatLayer>,
    /// Per-stage batch sizes.
    pub batch_sizes: BatchSizes,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            sea_level: 63,
            has_sky: true,
            relight_checks_per_tick: 2,
            flat_base_y: 0,
            flat_layers: vec![
                FlatLayer::new("bedrock", 1),
                FlatLayer::new("stone", 59),
                FlatLayer::new("dirt", 3),
                FlatLayer::new("grass_block", 1),
            ],
            batch_sizes: BatchSizes::default(),
        }
    }
}

impl WorldConfig {
    /// Checks values that would stall or break the world.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.batch_sizes.as_array().contains(&0) {
            return Err("Batch sizes must be at least 1");
        }
        let limit = cubic_utils::address::MAX_VERTICAL << 4;
        if !(-limit..=limit).contains(&self.sea_level) {
            return Err("Sea level must be inside the addressable height range");
        }
        if self.flat_layers.iter().any(|layer| layer.block.is_empty()) {
            return Err("Flat layers need a block name");
        }
        Ok(())
    }
}
