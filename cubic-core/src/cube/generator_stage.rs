use std::fmt::{self, Display};

/// Generation phases, in the only order a cube may pass through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum GeneratorStage {
    /// Waiting for base terrain.
    #[default]
    Terrain,
    /// Waiting for surface replacement.
    Surface,
    /// Waiting for structures.
    Structures,
    /// Waiting for first light.
    Lighting,
    /// Waiting for features (population).
    Features,
    /// Fully generated.
    Live,
}

impl GeneratorStage {
    /// All stages in order.
    pub const ALL: [GeneratorStage; 6] = [
        GeneratorStage::Terrain,
        GeneratorStage::Surface,
        GeneratorStage::Structures,
        GeneratorStage::Lighting,
        GeneratorStage::Features,
        GeneratorStage::Live,
    ];

    /// The stage following this one, `None` for [`GeneratorStage::Live`].
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Terrain => Some(Self::Surface),
            Self::Surface => Some(Self::Structures),
            Self::Structures => Some(Self::Lighting),
            Self::Lighting => Some(Self::Features),
            Self::Features => Some(Self::Live),
            Self::Live => None,
        }
    }

    /// Whether the cube is fully generated.
    #[must_use]
    pub const fn is_last_stage(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Stage the six face-adjacent cubes must have reached before this one runs.
    #[must_use]
    pub const fn neighbor_requirement(self) -> Option<Self> {
        match self {
            Self::Lighting | Self::Features => Some(Self::Lighting),
            _ => None,
        }
    }

    /// Persisted ordinal.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Inverse of [`GeneratorStage::ordinal`].
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Terrain),
            1 => Some(Self::Surface),
            2 => Some(Self::Structures),
            3 => Some(Self::Lighting),
            4 => Some(Self::Features),
            5 => Some(Self::Live),
            _ => None,
        }
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Surface => "surface",
            Self::Structures => "structures",
            Self::Lighting => "lighting",
            Self::Features => "features",
            Self::Live => "live",
        }
    }
}

impl Display for GeneratorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
