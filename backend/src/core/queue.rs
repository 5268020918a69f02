//! Pending event queue
//!
//! Min-ordered on `(time, sequence_id)`. Sequence ids are allocated here, so
//! two events scheduled for the same time always pop in scheduling order.

use crate::core::time::SimTime;
use crate::events::types::{EventKind, ScheduledEvent};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `kind` at `time`, returning the allocated sequence id
    pub fn push(&mut self, time: SimTime, kind: EventKind) -> u64 {
        let sequence_id = self.next_sequence_id();
        self.heap
            .push(Reverse(ScheduledEvent::new(time, sequence_id, kind)));
        sequence_id
    }

    /// Allocate a sequence id without enqueueing (used for triggered events)
    pub fn next_sequence_id(&mut self) -> u64 {
        let sequence_id = self.next_seq;
        self.next_seq += 1;
        sequence_id
    }

    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.heap.peek().map(|Reverse(event)| event)
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.peek().map(|event| event.time)
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending events in dispatch order
    pub fn snapshot(&self) -> Vec<&ScheduledEvent> {
        let mut events: Vec<&ScheduledEvent> = self.heap.iter().map(|Reverse(e)| e).collect();
        events.sort();
        events
    }
}
