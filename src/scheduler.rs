use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    time::Instant,
};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Instant,
    /// insertion counter, keeps ties in scheduling order
    seq: u64,
    pitch: &'static str,
}

/// Deferred note triggers, polled from the UI thread.
///
/// Nothing here is cancellable: once scheduled, an entry stays until it is popped.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    entries: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, pitch: &'static str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Reverse(Entry { due, seq, pitch }));
    }

    /// The instant of the earliest pending entry.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.peek().map(|Reverse(entry)| entry.due)
    }

    /// Removes and returns every pitch due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<&'static str> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.entries.peek() {
            if entry.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.entries.pop() {
                due.push(entry.pitch);
            }
        }
        due
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
