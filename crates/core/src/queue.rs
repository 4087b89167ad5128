//! Holds turns submitted while no connection is usable.

use std::collections::VecDeque;

/// Unbounded FIFO of outbound message text.
///
/// Growth while offline is not bounded: the producer is a human typing into a
/// chat window.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<String>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` to the tail.
    pub fn enqueue(&mut self, text: impl Into<String>) {
        self.pending.push_back(text.into());
    }

    /// Removes and returns every pending entry, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }

    /// Drops everything still pending. Only used on client shutdown.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
