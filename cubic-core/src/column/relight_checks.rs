use smallvec::SmallVec;

/// One voxel line of one cube, picked for a relight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelightLine {
    /// Cube Y holding the line.
    pub cube_y: i32,
    /// Local x.
    pub x: usize,
    /// Local z.
    pub z: usize,
}

/// Round-robin cursor over the voxel lines of a column's cubes.
///
/// The pointer packs `cube_index << 8 | x << 4 | z` into a snapshot of the
/// cube Ys taken when the previous sweep finished.
#[derive(Debug, Clone, Default)]
pub struct RelightCursor {
    pointer: usize,
    cube_ys: Vec<i32>,
}

impl RelightCursor {
    /// Restarts the sweep over the given cube Ys.
    pub fn reset(&mut self, cube_ys: impl IntoIterator<Item = i32>) {
        self.cube_ys.clear();
        self.cube_ys.extend(cube_ys);
        self.pointer = 0;
    }

    /// Whether the current sweep has visited every line.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pointer >= self.cube_ys.len() << 8
    }

    /// Returns up to `budget` lines, starting a new sweep over `loaded` when
    /// the current one is done.
    pub fn next_lines<I>(&mut self, budget: usize, loaded: impl FnOnce() -> I) -> SmallVec<[RelightLine; 4]>
    where
        I: IntoIterator<Item = i32>,
    {
        if self.is_exhausted() {
            self.reset(loaded());
        }
        let mut lines = SmallVec::new();
        while lines.len() < budget && !self.is_exhausted() {
            let pointer = self.pointer;
            lines.push(RelightLine {
                cube_y: self.cube_ys[pointer >> 8],
                x: (pointer >> 4) & 15,
                z: pointer & 15,
            });
            self.pointer += 1;
        }
        lines
    }
}
