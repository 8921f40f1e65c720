//! Event queue with deterministic ordering.

use std::{cmp::Ordering, collections::BTreeMap};

use super::Event;
use crate::types::Timestamp;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. End timestamp (earlier first)
/// 2. Sequence number (FIFO for the same timestamp)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EventKey {
    time: Timestamp,
    sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-priority queue of events keyed by their end timestamp.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: BTreeMap<EventKey, Event>,
    sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` to fire at its end timestamp.
    pub fn schedule(&mut self, event: Event) {
        self.sequence += 1;

        let key = EventKey {
            time: event.end,
            sequence: self.sequence,
        };

        self.events.insert(key, event);
    }

    /// Removes and returns the earliest event, the first scheduled one on ties.
    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.events.pop_first().map(|(_, event)| event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn pops_by_end_timestamp() {
        let mut queue = EventQueue::new();
        queue.schedule(Event::new(EventKind::WorkerSend(0), 0, 30));
        queue.schedule(Event::new(EventKind::WorkerSend(1), 0, 10));
        queue.schedule(Event::new(EventKind::WorkerSend(2), 5, 20));

        let ends: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|event| event.end)
            .collect();

        assert_eq!(ends, [10, 20, 30]);
        assert!(queue.is_empty());
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.schedule(Event::new(EventKind::AggregatorSend(2), 0, 7));
        queue.schedule(Event::new(EventKind::AggregatorSend(0), 0, 7));
        queue.schedule(Event::new(EventKind::AggregatorPrepare, 0, 7));
        assert_eq!(queue.len(), 3);

        let kinds: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|event| event.kind)
            .collect();

        assert_eq!(
            kinds,
            [
                EventKind::AggregatorSend(2),
                EventKind::AggregatorSend(0),
                EventKind::AggregatorPrepare,
            ]
        );
    }

    #[test]
    fn empty_queue_pops_nothing() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.pop_earliest(), None);
    }
}
