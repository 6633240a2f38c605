//! Port - Bounded packet queue with monotonic admission and oldest-drop backpressure.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::{Packet, Timestamp};

/// Default queue capacity.
pub const DEFAULT_PORT_CAPACITY: usize = 100;

/// Shared-ownership handle to a port.
///
/// One port object serves simultaneously as the upstream calculator's output
/// and the downstream calculator's input. The engine is single-threaded, so
/// `Rc<RefCell<..>>` is the whole synchronization story.
pub type PortHandle = Rc<RefCell<Port>>;

/// Bounded FIFO of packets in strict timestamp order.
///
/// Writes never block: a packet older than anything already accepted is
/// silently dropped, and a write at capacity evicts the oldest element.
/// Reads never fail: an empty port yields the invalid packet so a polling
/// calculator can skip its tick cleanly.
#[derive(Debug)]
pub struct Port {
    queue: VecDeque<Packet>,
    capacity: usize,
    /// Maximum timestamp ever accepted; never decreases on reads.
    latest_accepted: Timestamp,

    // Metrics
    dropped_stale: u64,
    dropped_capacity: u64,
}

impl Port {
    /// Create a port with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PORT_CAPACITY)
    }

    /// Create a port bounded at `capacity` packets (floored at 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            latest_accepted: Timestamp::INVALID,
            dropped_stale: 0,
            dropped_capacity: 0,
        }
    }

    /// Wrap the port into a shared handle.
    pub fn into_handle(self) -> PortHandle {
        Rc::new(RefCell::new(self))
    }

    /// Accept `packet` iff its timestamp is strictly newer than anything
    /// accepted before; otherwise drop it silently.
    ///
    /// Invalid packets carry the sentinel timestamp and fall out of the
    /// monotonic admission rule automatically. On acceptance at capacity the
    /// front (oldest) element is evicted first.
    pub fn write(&mut self, packet: Packet) {
        if packet.timestamp() <= self.latest_accepted {
            self.dropped_stale += 1;
            trace!(
                timestamp = packet.timestamp().micros(),
                latest = self.latest_accepted.micros(),
                "stale packet dropped"
            );
            return;
        }

        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            self.dropped_capacity += 1;
        }

        self.latest_accepted = packet.timestamp();
        self.queue.push_back(packet);
    }

    /// Remove and return the earliest packet, or the invalid packet when
    /// the queue is empty.
    pub fn read(&mut self) -> Packet {
        self.queue.pop_front().unwrap_or_default()
    }

    /// Number of queued packets.
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    /// True when no packets are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum timestamp ever accepted by this port.
    pub fn latest_accepted(&self) -> Timestamp {
        self.latest_accepted
    }

    /// Packets rejected for violating monotonic admission.
    pub fn dropped_stale(&self) -> u64 {
        self.dropped_stale
    }

    /// Packets evicted by the capacity bound.
    pub fn dropped_capacity(&self) -> u64 {
        self.dropped_capacity
    }
}
