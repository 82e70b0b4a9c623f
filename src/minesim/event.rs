//! Priority queue of block arrivals, earliest first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{BlockId, MinerIndex};

/// The only event is the arrival of a block, either mined or relayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Miner that gets the block.
    pub to: MinerIndex,
    /// Block arrival from mining (true) or from a peer (false).
    pub mining: bool,
    pub when: f64,
    /// Block being mined on (parent) or block from peer.
    pub block: BlockId,
}

#[derive(Debug)]
struct Queued {
    event: Event,
    seq: u64,
}

// BinaryHeap is a max-heap, so the ordering is reversed: earliest time, then earliest push.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .when
            .total_cmp(&self.event.when)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.heap.push(Queued { event, seq: self.next_seq });
        self.next_seq += 1;
    }

    /// Removes the earliest event. Events with equal time come out in push order.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
