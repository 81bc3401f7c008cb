use std::fmt::{self, Display};

/// An inclusive run of consecutive cube Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeRange {
    /// First cube Y in the run.
    pub start: i32,
    /// Last cube Y in the run.
    pub end: i32,
}

impl CubeRange {
    /// Collapses ascending cube Ys into runs of consecutive values.
    pub fn from_sorted(ys: impl IntoIterator<Item = i32>) -> Vec<CubeRange> {
        let mut ranges: Vec<CubeRange> = Vec::new();
        for y in ys {
            match ranges.last_mut() {
                Some(last) if last.end + 1 == y => last.end = y,
                _ => ranges.push(CubeRange { start: y, end: y }),
            }
        }
        ranges
    }
}

impl Display for CubeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}
