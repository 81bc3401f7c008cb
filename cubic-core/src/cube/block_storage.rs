use cubic_utils::{BlockStateId, LocalPos, coords::CUBE_VOLUME};

use crate::block::blocks;

/// Block states of a cube.
///
/// Equality compares states, so populated storage holding only air equals
/// [`BlockStorage::Empty`].
#[derive(Debug, Clone, Default)]
pub enum BlockStorage {
    /// No storage allocated, every voxel is air.
    #[default]
    Empty,
    /// One state per voxel in y, z, x order.
    Populated(Box<[BlockStateId; CUBE_VOLUME]>),
}

impl BlockStorage {
    /// The state at `pos`.
    #[must_use]
    #[inline]
    pub fn get(&self, pos: LocalPos) -> BlockStateId {
        match self {
            Self::Empty => blocks::AIR,
            Self::Populated(states) => states[pos.index()],
        }
    }

    /// Writes a state, returning the previous one if it changed.
    ///
    /// Writing air into empty storage leaves it unallocated.
    pub fn set(&mut self, pos: LocalPos, state: BlockStateId) -> Option<BlockStateId> {
        if let Self::Empty = self {
            if state == blocks::AIR {
                return None;
            }
            *self = Self::Populated(Box::new([blocks::AIR; CUBE_VOLUME]));
        }
        let Self::Populated(states) = self else {
            return None;
        };
        let slot = &mut states[pos.index()];
        if *slot == state {
            return None;
        }
        Some(std::mem::replace(slot, state))
    }

    /// Whether no storage is allocated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Big endian u16 per voxel, empty for unallocated storage.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Empty => Vec::new(),
            Self::Populated(states) => states.iter().flat_map(|s| s.0.to_be_bytes()).collect(),
        }
    }

    /// Inverse of [`BlockStorage::to_bytes`], `None` on a bad length.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return Some(Self::Empty);
        }
        if bytes.len() != CUBE_VOLUME * 2 {
            return None;
        }
        let mut states = Box::new([blocks::AIR; CUBE_VOLUME]);
        for (state, pair) in states.iter_mut().zip(bytes.chunks_exact(2)) {
            *state = BlockStateId(u16::from_be_bytes([pair[0], pair[1]]));
        }
        Some(Self::Populated(states))
    }
}

impl PartialEq for BlockStorage {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Populated(a), Self::Populated(b)) => a == b,
            (Self::Empty, Self::Populated(states)) | (Self::Populated(states), Self::Empty) => {
                states.iter().all(|s| *s == blocks::AIR)
            }
        }
    }
}

impl Eq for BlockStorage {}
