//! Light storage for cubes.
//!
//! Light values are 4-bit (0-15), packed two per byte. A 16x16x16 cube
//! therefore needs 2048 bytes once its values stop being uniform.

use std::fmt::Debug;

use cubic_utils::LocalPos;

/// The number of bytes needed to store light data for a 16x16x16 cube.
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// Highest light level.
pub const MAX_LIGHT: u8 = 15;

/// The two independent light channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Light coming from the sky.
    Sky,
    /// Light emitted by blocks.
    Block,
}

impl LightKind {
    /// Both channels, sky first.
    pub const ALL: [LightKind; 2] = [LightKind::Sky, LightKind::Block];

    /// The level reported where no data exists (unloaded cubes or blank cubes).
    ///
    /// Sky light defaults to full only in worlds with a sky.
    #[must_use]
    pub const fn default_level(self, has_sky: bool) -> u8 {
        match self {
            LightKind::Sky if has_sky => MAX_LIGHT,
            _ => 0,
        }
    }
}

/// Light data for one channel of a cube.
///
/// Equality compares light levels, so a heterogeneous store holding one
/// level everywhere equals the homogeneous store of that level.
#[derive(Debug, Clone)]
pub enum LightStorage {
    /// Every voxel has the same level.
    Homogeneous(u8),
    /// Voxels differ, stored as packed nibbles in y, z, x order.
    Heterogeneous(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

#[inline]
fn nibble_slot(pos: LocalPos) -> (usize, bool) {
    let index = pos.index();
    (index >> 1, (index & 1) == 1)
}

#[inline]
const fn pack_pair(level: u8) -> u8 {
    (level & 0x0F) | ((level & 0x0F) << 4)
}

impl LightStorage {
    /// Creates storage with every voxel at `light_level`.
    #[must_use]
    pub fn new_filled(light_level: u8) -> Self {
        debug_assert!(light_level <= MAX_LIGHT, "Light level must be 0-15");
        Self::Homogeneous(light_level)
    }

    /// Creates dark storage.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::Homogeneous(0)
    }

    /// Gets the light level at the given position.
    #[must_use]
    #[inline]
    pub fn get(&self, pos: LocalPos) -> u8 {
        match self {
            Self::Homogeneous(level) => *level,
            Self::Heterogeneous(data) => {
                let (byte, upper) = nibble_slot(pos);
                if upper {
                    (data[byte] >> 4) & 0x0F
                } else {
                    data[byte] & 0x0F
                }
            }
        }
    }

    /// Sets the light level at the given position, returning whether it changed.
    ///
    /// Homogeneous storage is upgraded the first time a differing value is written.
    #[inline]
    pub fn set(&mut self, pos: LocalPos, light_level: u8) -> bool {
        debug_assert!(light_level <= MAX_LIGHT, "Light level must be 0-15");

        if let Self::Homogeneous(current) = *self {
            if current == light_level {
                return false;
            }
            *self = Self::Heterogeneous(Box::new([pack_pair(current); LIGHT_ARRAY_SIZE]));
        }

        let Self::Heterogeneous(data) = self else {
            return false;
        };
        let (byte, upper) = nibble_slot(pos);
        let old = data[byte];
        data[byte] = if upper {
            (old & 0x0F) | ((light_level & 0x0F) << 4)
        } else {
            (old & 0xF0) | (light_level & 0x0F)
        };
        old != data[byte]
    }

    /// Overwrites every voxel with `light_level`.
    pub fn fill(&mut self, light_level: u8) {
        *self = Self::new_filled(light_level);
    }

    /// Whether every voxel holds `light_level`.
    #[must_use]
    pub fn is_uniform(&self, light_level: u8) -> bool {
        match self {
            Self::Homogeneous(level) => *level == light_level,
            Self::Heterogeneous(data) => data.iter().all(|b| *b == pack_pair(light_level)),
        }
    }

    /// Returns the packed nibble array.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Homogeneous(level) => vec![pack_pair(*level); LIGHT_ARRAY_SIZE],
            Self::Heterogeneous(data) => data.to_vec(),
        }
    }

    /// Rebuilds storage from a packed nibble array, `None` if the length is wrong.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let data: [u8; LIGHT_ARRAY_SIZE] = bytes.try_into().ok()?;
        let first = data[0];
        if (first & 0x0F) == (first >> 4) && data.iter().all(|b| *b == first) {
            return Some(Self::Homogeneous(first & 0x0F));
        }
        Some(Self::Heterogeneous(Box::new(data)))
    }
}

impl PartialEq for LightStorage {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Homogeneous(a), Self::Homogeneous(b)) => a == b,
            (Self::Heterogeneous(a), Self::Heterogeneous(b)) => a == b,
            (Self::Homogeneous(level), mixed @ Self::Heterogeneous(_))
            | (mixed @ Self::Heterogeneous(_), Self::Homogeneous(level)) => mixed.is_uniform(*level),
        }
    }
}

impl Eq for LightStorage {}

impl Default for LightStorage {
    fn default() -> Self {
        Self::new_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_get() {
        let storage = LightStorage::new_filled(15);
        assert_eq!(storage.get(LocalPos::new(0, 0, 0)), 15);
        assert_eq!(storage.get(LocalPos::new(15, 15, 15)), 15);
    }

    #[test]
    fn set_upgrades_and_keeps_neighbors() {
        let mut storage = LightStorage::new_filled(7);
        assert!(storage.set(LocalPos::new(1, 0, 0), 3));
        assert!(matches!(storage, LightStorage::Heterogeneous(_)));
        assert_eq!(storage.get(LocalPos::new(0, 0, 0)), 7);
        assert_eq!(storage.get(LocalPos::new(1, 0, 0)), 3);
        assert_eq!(storage.get(LocalPos::new(2, 0, 0)), 7);
        assert!(!storage.set(LocalPos::new(1, 0, 0), 3));
    }

    #[test]
    fn same_value_stays_homogeneous() {
        let mut storage = LightStorage::new_empty();
        assert!(!storage.set(LocalPos::new(4, 4, 4), 0));
        assert!(matches!(storage, LightStorage::Homogeneous(0)));
    }

    #[test]
    fn bytes_round_trip_collapses_uniform_data() {
        let mut storage = LightStorage::new_empty();
        storage.set(LocalPos::new(3, 9, 12), 11);
        let restored = LightStorage::from_bytes(&storage.to_bytes()).expect("valid length");
        assert_eq!(restored.get(LocalPos::new(3, 9, 12)), 11);
        assert_eq!(restored.get(LocalPos::new(3, 9, 13)), 0);

        let uniform = LightStorage::from_bytes(&[0xFF; LIGHT_ARRAY_SIZE]).expect("valid length");
        assert_eq!(uniform, LightStorage::Homogeneous(15));
        assert!(LightStorage::from_bytes(&[0; 10]).is_none());
    }

    #[test]
    fn equality_ignores_representation() {
        let pos = LocalPos::new(8, 2, 8);
        let mut storage = LightStorage::new_empty();
        storage.set(pos, 5);
        storage.set(pos, 0);
        assert!(matches!(storage, LightStorage::Heterogeneous(_)));
        assert_eq!(storage, LightStorage::new_empty());
        assert_eq!(LightStorage::new_empty(), storage);

        let bright = LightStorage::Heterogeneous(Box::new([0xFF; LIGHT_ARRAY_SIZE]));
        assert_eq!(bright, LightStorage::new_filled(15));
        assert_ne!(bright, LightStorage::new_filled(14));

        storage.set(pos, 9);
        assert_ne!(storage, LightStorage::new_empty());
    }

    #[test]
    fn sky_defaults_depend_on_dimension() {
        assert_eq!(LightKind::Sky.default_level(true), 15);
        assert_eq!(LightKind::Sky.default_level(false), 0);
        assert_eq!(LightKind::Block.default_level(true), 0);
    }
}
