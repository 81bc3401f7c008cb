//! Queue-based flood-fill light propagation over loaded cubes.
mod access;
pub mod direction;
mod flood_fill;
pub mod light_queue;
pub mod queue_entry;

pub use access::LightAccess;
pub use direction::Direction;
pub use flood_fill::LightEngine;
pub use light_queue::LightQueue;
pub use queue_entry::QueueEntry;
