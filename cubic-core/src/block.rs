//! Block definitions and the light properties the engine reads from them.
use cubic_utils::BlockStateId;
use rustc_hash::FxHashMap;

/// Static properties of a block state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    /// Registry name, e.g. `stone`.
    pub name: &'static str,
    /// Light absorbed when passing through (0-15, 15 blocks fully).
    pub opacity: u8,
    /// Light emitted (0-15).
    pub luminance: u8,
}

/// Ids of the blocks registered by [`BlockRegistry::vanilla`].
pub mod blocks {
    use cubic_utils::BlockStateId;

    /// Air, always id 0.
    pub const AIR: BlockStateId = BlockStateId(0);
    /// Stone.
    pub const STONE: BlockStateId = BlockStateId(1);
    /// Dirt.
    pub const DIRT: BlockStateId = BlockStateId(2);
    /// Grass block.
    pub const GRASS_BLOCK: BlockStateId = BlockStateId(3);
    /// Bedrock.
    pub const BEDROCK: BlockStateId = BlockStateId(4);
    /// Glass, transparent to light.
    pub const GLASS: BlockStateId = BlockStateId(5);
    /// Water.
    pub const WATER: BlockStateId = BlockStateId(6);
    /// Leaves.
    pub const LEAVES: BlockStateId = BlockStateId(7);
    /// Torch, emits 14.
    pub const TORCH: BlockStateId = BlockStateId(8);
    /// Glowstone, opaque and emits 15.
    pub const GLOWSTONE: BlockStateId = BlockStateId(9);
}

/// Maps block state ids to their definitions.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
    by_name: FxHashMap<&'static str, BlockStateId>,
}

impl BlockRegistry {
    /// Creates a registry containing only air.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            definitions: Vec::new(),
            by_name: FxHashMap::default(),
        };
        registry.register("air", 0, 0);
        registry
    }

    /// The built-in block set, ids matching [`blocks`].
    #[must_use]
    pub fn vanilla() -> Self {
        let mut registry = Self::new();
        registry.register("stone", 15, 0);
        registry.register("dirt", 15, 0);
        registry.register("grass_block", 15, 0);
        registry.register("bedrock", 15, 0);
        registry.register("glass", 0, 0);
        registry.register("water", 3, 0);
        registry.register("leaves", 1, 0);
        registry.register("torch", 0, 14);
        registry.register("glowstone", 15, 15);
        registry
    }

    /// Registers a block and returns its id. Opacity and luminance are clamped to 15.
    pub fn register(&mut self, name: &'static str, opacity: u8, luminance: u8) -> BlockStateId {
        let id = BlockStateId(self.definitions.len() as u16);
        self.definitions.push(BlockDefinition {
            name,
            opacity: opacity.min(15),
            luminance: luminance.min(15),
        });
        self.by_name.insert(name, id);
        id
    }

    /// Looks up a definition.
    #[must_use]
    pub fn get(&self, id: BlockStateId) -> Option<&BlockDefinition> {
        self.definitions.get(usize::from(id.0))
    }

    /// Looks up a block id by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<BlockStateId> {
        self.by_name.get(name).copied()
    }

    /// Opacity of a state, unknown states are treated as air.
    #[must_use]
    #[inline]
    pub fn opacity(&self, id: BlockStateId) -> u8 {
        self.get(id).map_or(0, |def| def.opacity)
    }

    /// Luminance of a state, unknown states emit nothing.
    #[must_use]
    #[inline]
    pub fn luminance(&self, id: BlockStateId) -> u8 {
        self.get(id).map_or(0, |def| def.luminance)
    }

    /// Number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always false, air is registered on creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::vanilla()
    }
}
