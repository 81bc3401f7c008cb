//! Flood-fill light propagation.
//!
//! Updates run in two phases. Decreases first: light that was fed by a
//! darkened voxel is cleared outwards, while brighter neighbors found on the
//! way are queued to refill the gap. Increases second: every queued level
//! spreads to its neighbors, losing the neighbor's opacity (at least 1) per
//! step. Sky light enters at 15 wherever a voxel can see the sky.

use std::cmp::Ordering;

use cubic_utils::BlockPos;

use super::{Direction, LightAccess, LightQueue, QueueEntry};
use crate::cube::LightKind;
use crate::cube::light_storage::MAX_LIGHT;

/// Reusable flood-fill state.
#[derive(Debug, Default)]
pub struct LightEngine {
    increase_queue: LightQueue,
    decrease_queue: LightQueue,
}

impl LightEngine {
    /// Creates an engine with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes one channel at `pos` and spreads the change.
    ///
    /// Returns `false` without touching anything when the cube holding `pos`
    /// or one of its six face neighbors is not loaded.
    pub fn check_light<A: LightAccess>(&mut self, access: &mut A, kind: LightKind, pos: BlockPos) -> bool {
        let cube = pos.cube_pos();
        if !access.is_cube_loaded(cube)
            || !Direction::ALL
                .iter()
                .all(|dir| access.is_cube_loaded(dir.relative_cube(cube)))
        {
            return false;
        }

        let current = access.light(kind, pos);
        let expected = Self::expected_level(access, kind, pos);
        match expected.cmp(&current) {
            Ordering::Equal => return true,
            Ordering::Greater => {
                access.set_light(kind, pos, expected);
                self.increase_queue
                    .enqueue(pos, QueueEntry::all_directions(expected));
            }
            Ordering::Less => {
                access.set_light(kind, pos, 0);
                self.decrease_queue
                    .enqueue(pos, QueueEntry::all_directions(current));
            }
        }
        self.run_light_updates(access, kind);
        true
    }

    /// Drains both queues, decreases first.
    fn run_light_updates<A: LightAccess>(&mut self, access: &mut A, kind: LightKind) {
        self.propagate_decreases(access, kind);
        self.propagate_increases(access, kind);
    }

    fn source_level<A: LightAccess>(access: &A, kind: LightKind, pos: BlockPos) -> u8 {
        match kind {
            LightKind::Sky if access.can_see_sky(pos) => MAX_LIGHT,
            LightKind::Sky => 0,
            LightKind::Block => access.luminance(pos),
        }
    }

    /// The level `pos` should have given its own emission and its neighbors.
    fn expected_level<A: LightAccess>(access: &A, kind: LightKind, pos: BlockPos) -> u8 {
        let source = Self::source_level(access, kind, pos);
        let opacity = access.opacity(pos).max(1);
        if source == MAX_LIGHT || opacity >= MAX_LIGHT {
            return source;
        }
        Direction::ALL
            .iter()
            .map(|dir| dir.relative(pos))
            .filter(|neighbor| access.is_loaded(*neighbor))
            .map(|neighbor| access.light(kind, neighbor).saturating_sub(opacity))
            .fold(source, u8::max)
    }

    fn propagate_decreases<A: LightAccess>(&mut self, access: &mut A, kind: LightKind) {
        while let Some((pos, entry)) = self.decrease_queue.dequeue() {
            let level = entry.level();
            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbor = dir.relative(pos);
                if !access.is_loaded(neighbor) {
                    continue;
                }
                let neighbor_level = access.light(kind, neighbor);
                if neighbor_level == 0 {
                    continue;
                }
                // Full sky light falls straight down through transparent voxels.
                let sky_column = kind == LightKind::Sky
                    && dir == Direction::Down
                    && level == MAX_LIGHT
                    && neighbor_level == MAX_LIGHT
                    && !access.can_see_sky(neighbor);
                if neighbor_level < level || sky_column {
                    access.set_light(kind, neighbor, 0);
                    self.decrease_queue.enqueue(
                        neighbor,
                        QueueEntry::skip_one_direction(neighbor_level, dir.opposite()),
                    );
                } else {
                    self.increase_queue
                        .enqueue(neighbor, QueueEntry::all_directions(neighbor_level));
                }
            }

            let source = Self::source_level(access, kind, pos);
            if source > 0 {
                access.set_light(kind, pos, source);
                self.increase_queue
                    .enqueue(pos, QueueEntry::all_directions(source));
            }
        }
    }

    fn propagate_increases<A: LightAccess>(&mut self, access: &mut A, kind: LightKind) {
        while let Some((pos, entry)) = self.increase_queue.dequeue() {
            let level = entry.level();
            if level == 0 || access.light(kind, pos) != level {
                continue;
            }
            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbor = dir.relative(pos);
                if !access.is_loaded(neighbor) {
                    continue;
                }
                let target = if kind == LightKind::Sky && access.can_see_sky(neighbor) {
                    MAX_LIGHT
                } else {
                    level.saturating_sub(access.opacity(neighbor).max(1))
                };
                if target > access.light(kind, neighbor) {
                    access.set_light(kind, neighbor, target);
                    self.increase_queue
                        .enqueue(neighbor, QueueEntry::skip_one_direction(target, dir.opposite()));
                }
            }
        }
    }

    /// Whether updates are still queued. Always false between calls.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.increase_queue.is_empty() || !self.decrease_queue.is_empty()
    }
}
