use std::{
    cmp,
    collections::{BinaryHeap, VecDeque},
};

use crate::net::{Event, LinkId, Side};
use crate::time::SimTime;

/// An event handled by the runtime of a rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RuntimeEvent {
    /// Hands an event to the component attached to side `to` of a link.
    Deliver {
        link: LinkId,
        to: Side,
        event: Event,
    },
}

#[derive(Debug)]
pub(crate) struct EventNode {
    pub(crate) time: SimTime,
    pub(crate) seq: u64,
    pub(crate) event: RuntimeEvent,
}

impl EventNode {
    fn key(&self) -> (SimTime, u64) {
        (self.time, self.seq)
    }
}

impl PartialEq for EventNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EventNode {}

impl PartialOrd for EventNode {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventNode {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // Inverted call should act as reverse
        other.key().cmp(&self.key())
    }
}

///
/// The pending events of a rank, ordered by time and then by the
/// order in which they were scheduled.
///
/// Events scheduled for the current instant bypass the heap.
///
#[derive(Debug)]
pub(crate) struct FutureEventSet {
    heap: BinaryHeap<EventNode>,
    zero_queue: VecDeque<EventNode>,

    last_event_simtime: SimTime,
    seq: u64,
}

impl FutureEventSet {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::with_capacity(64),
            zero_queue: VecDeque::with_capacity(32),

            last_event_simtime: SimTime::ZERO,
            seq: 0,
        }
    }

    pub(crate) fn descriptor(&self) -> String {
        "FutureEventSet::BinaryHeap()".to_string()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len() + self.zero_queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty() && self.zero_queue.is_empty()
    }

    /// The time of the next event, if any.
    pub(crate) fn peek_time(&self) -> Option<SimTime> {
        match (self.zero_queue.front(), self.heap.peek()) {
            (Some(zero), Some(heap)) => Some(cmp::min(zero.time, heap.time)),
            (Some(zero), None) => Some(zero.time),
            (None, Some(heap)) => Some(heap.time),
            (None, None) => None,
        }
    }

    pub(crate) fn fetch_next(&mut self) -> Option<EventNode> {
        // a heap entry at the current instant may predate the zero queue
        let take_zero = match (self.zero_queue.front(), self.heap.peek()) {
            (Some(zero), Some(heap)) => zero.key() < heap.key(),
            (Some(_), None) => true,
            (None, _) => false,
        };

        let node = if take_zero {
            self.zero_queue.pop_front()?
        } else {
            self.heap.pop()?
        };
        self.last_event_simtime = node.time;
        Some(node)
    }

    pub(crate) fn add(&mut self, time: SimTime, event: RuntimeEvent) {
        debug_assert!(
            time >= self.last_event_simtime,
            "cannot schedule events in the past"
        );

        let node = EventNode {
            time,
            seq: self.seq,
            event,
        };
        self.seq += 1;

        if time == self.last_event_simtime {
            self.zero_queue.push_back(node);
        } else {
            self.heap.push(node);
        }
    }
}
