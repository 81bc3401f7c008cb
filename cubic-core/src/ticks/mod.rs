//! Scheduled block ticks stored per cube.
mod cube_ticks;
mod scheduled_tick;

pub use cube_ticks::CubeTicks;
pub use scheduled_tick::{ScheduledTick, TickKey, TickPriority};
