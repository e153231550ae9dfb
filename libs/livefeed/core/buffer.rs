//! Bounded, newest-first event buffer

use crate::normalize::CanonicalEvent;
use std::collections::VecDeque;

/// Fixed-capacity event buffer, newest first
///
/// Owned exclusively by the feed client; readers only ever see owned
/// snapshots, never a live reference into the storage. Capacity is fixed at
/// construction. Insertion is O(1) amortized; overflow evicts from the back
/// (the oldest events).
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<CanonicalEvent>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front, evicting from the back past capacity
    pub fn push(&mut self, event: CanonicalEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// Owned, point-in-time copy, newest first
    pub fn snapshot(&self) -> Vec<CanonicalEvent> {
        self.events.iter().cloned().collect()
    }

    /// Most recently pushed event, if any
    pub fn front(&self) -> Option<&CanonicalEvent> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
