//! FIFO of pending propagation steps.

use std::collections::VecDeque;

use cubic_utils::BlockPos;

use super::queue_entry::QueueEntry;

/// A FIFO of `(position, entry)` pairs.
///
/// The buffer is kept between updates so steady-state propagation does not allocate.
#[derive(Debug)]
pub struct LightQueue {
    buffer: VecDeque<(BlockPos, QueueEntry)>,
}

impl LightQueue {
    /// Creates a queue with room for 4096 entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Creates a queue with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends an entry.
    #[inline]
    pub fn enqueue(&mut self, pos: BlockPos, entry: QueueEntry) {
        self.buffer.push_back((pos, entry));
    }

    /// Removes the oldest entry.
    #[inline]
    pub fn dequeue(&mut self) -> Option<(BlockPos, QueueEntry)> {
        self.buffer.pop_front()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drops every pending entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
