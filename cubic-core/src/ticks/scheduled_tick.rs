use std::cmp::Ordering;

use cubic_utils::BlockPos;

/// Priority of ticks firing on the same game tick. Lower values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum TickPriority {
    /// -3
    ExtremelyHigh = -3,
    /// -2
    VeryHigh = -2,
    /// -1
    High = -1,
    /// 0
    #[default]
    Normal = 0,
    /// 1
    Low = 1,
    /// 2
    VeryLow = 2,
    /// 3
    ExtremelyLow = 3,
}

impl TickPriority {
    /// The stored numeric value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Parses a stored value, clamping anything outside -3..=3.
    #[must_use]
    pub const fn from_value(value: i32) -> Self {
        match value {
            i32::MIN..=-3 => Self::ExtremelyHigh,
            -2 => Self::VeryHigh,
            -1 => Self::High,
            0 => Self::Normal,
            1 => Self::Low,
            2 => Self::VeryLow,
            _ => Self::ExtremelyLow,
        }
    }
}

impl PartialOrd for TickPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TickPriority {
    // Reversed so the max-heap pops High before Normal before Low.
    fn cmp(&self, other: &Self) -> Ordering {
        other.value().cmp(&self.value())
    }
}

/// A pending update for the block at `pos`.
#[derive(Debug, Clone)]
pub struct ScheduledTick<T> {
    /// The block state being ticked.
    pub tick_type: T,
    /// World position of the block.
    pub pos: BlockPos,
    /// Absolute game tick at which the tick fires.
    pub trigger_tick: u64,
    /// Ordering among ticks firing together.
    pub priority: TickPriority,
    /// Tie breaker, lower runs first.
    pub sub_tick_order: u64,
}

impl<T> ScheduledTick<T> {
    /// Creates a tick with normal priority.
    pub fn new(tick_type: T, pos: BlockPos, trigger_tick: u64, sub_tick_order: u64) -> Self {
        Self::with_priority(tick_type, pos, trigger_tick, TickPriority::Normal, sub_tick_order)
    }

    /// Creates a tick with an explicit priority.
    pub fn with_priority(
        tick_type: T,
        pos: BlockPos,
        trigger_tick: u64,
        priority: TickPriority,
        sub_tick_order: u64,
    ) -> Self {
        Self {
            tick_type,
            pos,
            trigger_tick,
            priority,
            sub_tick_order,
        }
    }

    /// Ticks left until this fires, negative once overdue.
    #[must_use]
    pub fn delay_from(&self, game_time: u64) -> i64 {
        self.trigger_tick as i64 - game_time as i64
    }
}

impl<T: PartialEq> PartialEq for ScheduledTick<T> {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick
            && self.priority == other.priority
            && self.sub_tick_order == other.sub_tick_order
    }
}

impl<T: Eq> Eq for ScheduledTick<T> {}

impl<T: Eq> PartialOrd for ScheduledTick<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Eq> Ord for ScheduledTick<T> {
    // Max-heap order: earliest trigger, then priority, then lowest sub tick.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .trigger_tick
            .cmp(&self.trigger_tick)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| other.sub_tick_order.cmp(&self.sub_tick_order))
    }
}

/// Deduplication key, one pending tick per position and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickKey<T> {
    /// Block position.
    pub pos: BlockPos,
    /// Ticked type.
    pub tick_type: T,
}

impl<T: Copy> From<&ScheduledTick<T>> for TickKey<T> {
    fn from(tick: &ScheduledTick<T>) -> Self {
        Self {
            pos: tick.pos,
            tick_type: tick.tick_type,
        }
    }
}
