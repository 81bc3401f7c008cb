//! Per-column opacity profile.
//!
//! Each of the 256 vertical lines stores its opacity as runs: `(start_y,
//! opacity)` pairs sorted by `start_y`, each covering blocks up to the next
//! start. Everything below the first run and above the last start is
//! transparent. Lines are kept normalized: neighboring runs never share an
//! opacity, the first run is never transparent and the last one always is.
//! The top opaque block of a line is therefore one below its last start,
//! read in constant time with no scan.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use thiserror::Error;

use cubic_utils::coords::CUBE_AREA;

/// Errors produced when reading serialized index data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpacityIndexError {
    /// The buffer ended in the middle of a line.
    #[error("opacity index data truncated at byte {0}")]
    Truncated(usize),
    /// A line is not sorted or not normalized.
    #[error("opacity index line {line} is malformed")]
    MalformedLine {
        /// Index of the line, `z * 16 + x`.
        line: usize,
    },
    /// Bytes remain after the last line.
    #[error("{0} trailing bytes after opacity index data")]
    TrailingBytes(usize),
    /// A line has more runs than its `u16` count can express.
    #[error("opacity index line {line} has {runs} runs")]
    TooManyRuns {
        /// Index of the line, `z * 16 + x`.
        line: usize,
        /// Number of runs in the line.
        runs: usize,
    },
}

type Runs = SmallVec<[(i32, u8); 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OpacityLine {
    runs: Runs,
}

impl OpacityLine {
    fn opacity(&self, y: i32) -> u8 {
        match self.runs.partition_point(|&(start, _)| start <= y) {
            0 => 0,
            i => self.runs[i - 1].1,
        }
    }

    fn top_block_y(&self) -> Option<i32> {
        self.runs.last().map(|&(start, _)| start - 1)
    }

    fn set_boundary(&mut self, start: i32, opacity: u8) {
        let i = self.runs.partition_point(|&(s, _)| s < start);
        match self.runs.get_mut(i) {
            Some(run) if run.0 == start => run.1 = opacity,
            _ => self.runs.insert(i, (start, opacity)),
        }
    }

    fn set_opacity(&mut self, y: i32, opacity: u8) -> bool {
        // a run ending at i32::MAX has no start above it
        let Some(next) = y.checked_add(1) else {
            return false;
        };
        if self.opacity(y) == opacity {
            return false;
        }
        let above = self.opacity(next);
        self.set_boundary(next, above);
        self.set_boundary(y, opacity);

        let mut previous = 0;
        self.runs.retain(|run| {
            let keep = run.1 != previous;
            if keep {
                previous = run.1;
            }
            keep
        });
        true
    }

    fn is_normalized(&self) -> bool {
        let sorted = self.runs.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 != w[1].1);
        let ends = match (self.runs.first(), self.runs.last()) {
            (Some(first), Some(last)) => first.1 != 0 && last.1 == 0,
            _ => true,
        };
        sorted && ends && self.runs.iter().all(|&(_, o)| o <= 15)
    }
}

/// Opacity and top-height data for the 16x16 lines of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityIndex {
    lines: Box<[OpacityLine; CUBE_AREA]>,
}

#[inline]
const fn line_index(x: usize, z: usize) -> usize {
    debug_assert!(x < 16 && z < 16);
    (z << 4) | x
}

impl OpacityIndex {
    /// Creates an index with every line transparent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Box::new(std::array::from_fn(|_| OpacityLine::default())),
        }
    }

    /// Opacity of the block at local `x`, `z` and world `y`.
    #[must_use]
    pub fn opacity(&self, x: usize, y: i32, z: usize) -> u8 {
        self.lines[line_index(x, z)].opacity(y)
    }

    /// Records a block's opacity. Returns whether the line changed.
    ///
    /// Values above 15 are clamped. `y == i32::MAX` cannot be represented and
    /// is ignored.
    pub fn set_opacity(&mut self, x: usize, y: i32, z: usize, opacity: u8) -> bool {
        self.lines[line_index(x, z)].set_opacity(y, opacity.min(15))
    }

    /// Y of the topmost block with nonzero opacity in the line.
    #[must_use]
    pub fn top_block_y(&self, x: usize, z: usize) -> Option<i32> {
        self.lines[line_index(x, z)].top_block_y()
    }

    /// Y of the lowest block that receives direct sky light, one above the top block.
    #[must_use]
    pub fn skylight_block_y(&self, x: usize, z: usize) -> Option<i32> {
        self.top_block_y(x, z).map(|y| y + 1)
    }

    /// Whether the block at `y` is above every opaque block of its line.
    #[must_use]
    pub fn can_see_sky(&self, x: usize, y: i32, z: usize) -> bool {
        self.skylight_block_y(x, z).is_none_or(|sky| y >= sky)
    }

    /// Highest opaque block over the whole column.
    #[must_use]
    pub fn highest_top_block_y(&self) -> Option<i32> {
        self.lines.iter().filter_map(OpacityLine::top_block_y).max()
    }

    /// Content hash, equal for equal indexes.
    ///
    /// Only fixed-width values are fed to the hasher.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for line in self.lines.iter() {
            hasher.write_u32(line.runs.len() as u32);
            for &(start, opacity) in &line.runs {
                hasher.write_i32(start);
                hasher.write_u8(opacity);
            }
        }
        hasher.finish()
    }

    /// Serializes the index: per line a big endian `u16` run count followed by
    /// `(i32 start, u8 opacity)` runs.
    pub fn data(&self) -> Result<Vec<u8>, OpacityIndexError> {
        let runs: usize = self.lines.iter().map(|l| l.runs.len()).sum();
        let mut out = Vec::with_capacity(CUBE_AREA * 2 + runs * 5);
        for (index, line) in self.lines.iter().enumerate() {
            let count = u16::try_from(line.runs.len()).map_err(|_| OpacityIndexError::TooManyRuns {
                line: index,
                runs: line.runs.len(),
            })?;
            out.extend_from_slice(&count.to_be_bytes());
            for &(start, opacity) in &line.runs {
                out.extend_from_slice(&start.to_be_bytes());
                out.push(opacity);
            }
        }
        Ok(out)
    }

    /// Replaces the contents with data produced by [`OpacityIndex::data`].
    ///
    /// The index is left untouched on error.
    pub fn read_data(&mut self, data: &[u8]) -> Result<(), OpacityIndexError> {
        let mut lines: Box<[OpacityLine; CUBE_AREA]> =
            Box::new(std::array::from_fn(|_| OpacityLine::default()));
        let mut cursor = 0;
        for (index, line) in lines.iter_mut().enumerate() {
            let count = take(data, &mut cursor, 2)?;
            let count = u16::from_be_bytes([count[0], count[1]]);
            for _ in 0..count {
                let run = take(data, &mut cursor, 5)?;
                let start = i32::from_be_bytes([run[0], run[1], run[2], run[3]]);
                line.runs.push((start, run[4]));
            }
            if !line.is_normalized() {
                return Err(OpacityIndexError::MalformedLine { line: index });
            }
        }
        if cursor != data.len() {
            return Err(OpacityIndexError::TrailingBytes(data.len() - cursor));
        }
        self.lines = lines;
        Ok(())
    }
}

fn take<'a>(data: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], OpacityIndexError> {
    let bytes = data
        .get(*cursor..*cursor + len)
        .ok_or(OpacityIndexError::Truncated(*cursor))?;
    *cursor += len;
    Ok(bytes)
}

impl Default for OpacityIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_has_no_top() {
        let index = OpacityIndex::new();
        assert_eq!(index.top_block_y(3, 4), None);
        assert_eq!(index.skylight_block_y(3, 4), None);
        assert!(index.can_see_sky(3, -1000, 4));
        assert_eq!(index.opacity(3, 10, 4), 0);
    }

    #[test]
    fn single_opaque_voxel_sets_top() {
        let mut index = OpacityIndex::new();
        assert!(index.set_opacity(0, 70, 0, 3));
        assert_eq!(index.top_block_y(0, 0), Some(70));
        assert_eq!(index.skylight_block_y(0, 0), Some(71));
        assert_eq!(index.opacity(0, 70, 0), 3);
        assert_eq!(index.opacity(0, 69, 0), 0);
        assert_eq!(index.opacity(0, 71, 0), 0);
        assert!(!index.can_see_sky(0, 70, 0));
        assert!(index.can_see_sky(0, 71, 0));
    }

    #[test]
    fn removing_top_falls_back_to_next_opaque() {
        let mut index = OpacityIndex::new();
        index.set_opacity(5, 10, 5, 15);
        index.set_opacity(5, 40, 5, 15);
        assert_eq!(index.top_block_y(5, 5), Some(40));
        assert!(index.set_opacity(5, 40, 5, 0));
        assert_eq!(index.top_block_y(5, 5), Some(10));
        assert!(index.set_opacity(5, 10, 5, 0));
        assert_eq!(index.top_block_y(5, 5), None);
        assert!(!index.set_opacity(5, 10, 5, 0));
    }

    #[test]
    fn edits_inside_a_run_split_and_merge() {
        let mut index = OpacityIndex::new();
        for y in 0..10 {
            index.set_opacity(1, y, 2, 15);
        }
        assert_eq!(index.lines[line_index(1, 2)].runs.as_slice(), &[(0, 15), (10, 0)]);

        index.set_opacity(1, 5, 2, 1);
        assert_eq!(index.opacity(1, 4, 2), 15);
        assert_eq!(index.opacity(1, 5, 2), 1);
        assert_eq!(index.opacity(1, 6, 2), 15);
        assert_eq!(index.top_block_y(1, 2), Some(9));

        index.set_opacity(1, 5, 2, 15);
        assert_eq!(index.lines[line_index(1, 2)].runs.as_slice(), &[(0, 15), (10, 0)]);
    }

    #[test]
    fn top_matches_brute_force_after_random_edits() {
        let mut index = OpacityIndex::new();
        let mut truth = [0u8; 64];
        let mut seed = 0x2545_f491_u32;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let y = (seed % 64) as usize;
            let opacity = [0, 0, 1, 3, 15][(seed >> 8) as usize % 5];
            truth[y] = opacity;
            index.set_opacity(7, y as i32 - 20, 7, opacity);

            let expected = truth.iter().rposition(|o| *o > 0).map(|y| y as i32 - 20);
            assert_eq!(index.top_block_y(7, 7), expected);
        }
        for (y, opacity) in truth.iter().enumerate() {
            assert_eq!(index.opacity(7, y as i32 - 20, 7), *opacity);
        }
    }

    #[test]
    fn data_round_trip_preserves_hash() {
        let mut index = OpacityIndex::new();
        index.set_opacity(0, 64, 0, 15);
        index.set_opacity(15, -3, 15, 2);
        let mut restored = OpacityIndex::new();
        restored.read_data(&index.data().expect("encodable")).expect("valid data");
        assert_eq!(restored, index);
        assert_eq!(restored.content_hash(), index.content_hash());

        index.set_opacity(0, 65, 0, 15);
        assert_ne!(restored.content_hash(), index.content_hash());
    }

    #[test]
    fn bad_data_is_rejected() {
        let mut index = OpacityIndex::new();
        assert_eq!(index.read_data(&[0, 1]), Err(OpacityIndexError::Truncated(2)));

        let mut data = OpacityIndex::new().data().expect("encodable");
        data[0..2].copy_from_slice(&1u16.to_be_bytes());
        data.splice(2..2, [0, 0, 0, 5, 0]);
        assert_eq!(
            index.read_data(&data),
            Err(OpacityIndexError::MalformedLine { line: 0 })
        );

        let mut data = OpacityIndex::new().data().expect("encodable");
        data.push(9);
        assert_eq!(index.read_data(&data), Err(OpacityIndexError::TrailingBytes(1)));
    }

    #[test]
    fn hash_depends_only_on_contents() {
        let mut forwards = OpacityIndex::new();
        let mut backwards = OpacityIndex::new();
        for y in [3, 9, 10, 11, 40] {
            forwards.set_opacity(4, y, 6, 15);
        }
        for y in [40, 11, 10, 9, 3] {
            backwards.set_opacity(4, y, 6, 15);
        }
        assert_eq!(forwards.content_hash(), backwards.content_hash());

        // same runs in another line
        let mut moved = OpacityIndex::new();
        for y in [3, 9, 10, 11, 40] {
            moved.set_opacity(6, y, 4, 15);
        }
        assert_ne!(moved.content_hash(), forwards.content_hash());
        assert_ne!(OpacityIndex::new().content_hash(), forwards.content_hash());
    }

    #[test]
    fn lines_with_too_many_runs_cannot_be_written() {
        let mut index = OpacityIndex::new();
        // every other block opaque, two runs each
        index.lines[line_index(9, 3)].runs = (0..65_536)
            .map(|y| (y, if y % 2 == 0 { 15 } else { 0 }))
            .collect();
        assert!(index.lines[line_index(9, 3)].is_normalized());
        assert_eq!(
            index.data(),
            Err(OpacityIndexError::TooManyRuns {
                line: line_index(9, 3),
                runs: 65_536,
            })
        );

        assert!(index.set_opacity(9, 65_534, 3, 0));
        assert_eq!(index.lines[line_index(9, 3)].runs.len(), 65_534);
        let mut restored = OpacityIndex::new();
        restored.read_data(&index.data().expect("encodable")).expect("valid data");
        assert_eq!(restored, index);
    }

    #[test]
    fn topmost_representable_y_is_ignored() {
        let mut index = OpacityIndex::new();
        assert!(!index.set_opacity(2, i32::MAX, 2, 15));
        assert_eq!(index.top_block_y(2, 2), None);
        assert!(index.set_opacity(2, i32::MAX - 1, 2, 15));
        assert_eq!(index.top_block_y(2, 2), Some(i32::MAX - 1));
        assert_eq!(index.skylight_block_y(2, 2), Some(i32::MAX));
    }
}
