use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::FxHashSet;
use cubic_utils::BlockPos;

use super::{ScheduledTick, TickKey};

/// Scheduled ticks of one cube.
///
/// A position and type can only be scheduled once; later requests keep the
/// timing of the first one.
#[derive(Debug, Clone)]
pub struct CubeTicks<T: Copy + Eq + Hash> {
    queue: BinaryHeap<ScheduledTick<T>>,
    scheduled: FxHashSet<TickKey<T>>,
}

impl<T: Copy + Eq + Hash> CubeTicks<T> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            scheduled: FxHashSet::default(),
        }
    }

    /// Schedules a tick. Returns `false` if one already exists for the position and type.
    pub fn schedule(&mut self, tick: ScheduledTick<T>) -> bool {
        if !self.scheduled.insert(TickKey::from(&tick)) {
            return false;
        }
        self.queue.push(tick);
        true
    }

    /// Removes and returns every tick due at or before `game_time`, in firing order.
    pub fn drain_due(&mut self, game_time: u64) -> Vec<ScheduledTick<T>> {
        let mut due = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|tick| tick.trigger_tick <= game_time)
        {
            if let Some(tick) = self.queue.pop() {
                self.scheduled.remove(&TickKey::from(&tick));
                due.push(tick);
            }
        }
        due
    }

    /// Whether a tick is pending for the position and type.
    #[must_use]
    pub fn has_scheduled_tick(&self, pos: BlockPos, tick_type: T) -> bool {
        self.scheduled.contains(&TickKey { pos, tick_type })
    }

    /// Number of pending ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending ticks in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTick<T>> {
        self.queue.iter()
    }
}

impl<T: Copy + Eq + Hash> Default for CubeTicks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ticks::TickPriority;

    #[test]
    fn duplicates_keep_first_timing() {
        let mut ticks: CubeTicks<u16> = CubeTicks::new();
        let pos = BlockPos::new(1, 64, 2);
        assert!(ticks.schedule(ScheduledTick::new(1, pos, 100, 0)));
        assert!(!ticks.schedule(ScheduledTick::new(1, pos, 50, 1)));
        assert!(ticks.has_scheduled_tick(pos, 1));
        assert_eq!(ticks.len(), 1);
    }

    #[test]
    fn drain_due_respects_order_and_time() {
        let mut ticks: CubeTicks<u16> = CubeTicks::new();
        ticks.schedule(ScheduledTick::new(1, BlockPos::new(0, 0, 0), 20, 0));
        ticks.schedule(ScheduledTick::with_priority(
            2,
            BlockPos::new(1, 0, 0),
            10,
            TickPriority::Low,
            1,
        ));
        ticks.schedule(ScheduledTick::with_priority(
            3,
            BlockPos::new(2, 0, 0),
            10,
            TickPriority::High,
            2,
        ));

        let due: Vec<u16> = ticks.drain_due(15).iter().map(|t| t.tick_type).collect();
        assert_eq!(due, [3, 2]);
        assert_eq!(ticks.len(), 1);
        assert!(!ticks.has_scheduled_tick(BlockPos::new(2, 0, 0), 3));
    }
}
