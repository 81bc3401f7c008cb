//! Propagation metadata packed into a word.
//!
//! ```text
//! bit:  63 ........ 10  9  8  7  6  5  4  3  2  1  0
//!       |   unused    | E  W  S  N  U  D | level     |
//! ```
//!
//! Bits 0-3 hold the light level, bits 4-9 one flag per [`Direction`]
//! ordinal saying whether the entry still spreads that way.

use super::direction::Direction;

/// A packed propagation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry(u64);

impl QueueEntry {
    const LEVEL_MASK: u64 = 0x0F;
    const DIRECTIONS_MASK: u64 = 0x3F0;

    #[inline]
    const fn direction_bit(dir: Direction) -> u64 {
        1 << (dir as u8 + 4)
    }

    /// Light level carried by the entry.
    #[must_use]
    #[inline]
    pub const fn level(self) -> u8 {
        (self.0 & Self::LEVEL_MASK) as u8
    }

    /// Whether the entry spreads towards `dir`.
    #[must_use]
    #[inline]
    pub const fn should_propagate(self, dir: Direction) -> bool {
        self.0 & Self::direction_bit(dir) != 0
    }

    /// Spreads `level` in every direction.
    #[must_use]
    pub fn all_directions(level: u8) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self(Self::DIRECTIONS_MASK | (u64::from(level) & Self::LEVEL_MASK))
    }

    /// Spreads `level` everywhere except back towards `skip`.
    #[must_use]
    pub fn skip_one_direction(level: u8, skip: Direction) -> Self {
        Self(Self::all_directions(level).0 & !Self::direction_bit(skip))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_directions_sets_every_flag() {
        let entry = QueueEntry::all_directions(12);
        assert_eq!(entry.level(), 12);
        assert!(Direction::ALL.iter().all(|d| entry.should_propagate(*d)));
    }

    #[test]
    fn skip_clears_only_one_flag() {
        let entry = QueueEntry::skip_one_direction(3, Direction::North);
        assert_eq!(entry.level(), 3);
        assert!(!entry.should_propagate(Direction::North));
        for dir in Direction::ALL.into_iter().filter(|d| *d != Direction::North) {
            assert!(entry.should_propagate(dir));
        }
    }
}
