use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{DmrError, Result};
use crate::packet::Packet;

/// One queued ingress item: the slot the packet arrived on plus an owned
/// copy of the packet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueItem {
    pub source: usize,
    pub packet: Packet,
}

/// Bounded FIFO between the transport rx callbacks (many producers) and
/// the dispatch thread (single consumer). Overflow drops the new packet;
/// the repeater never signals backpressure upstream.
pub(crate) struct IngressQueue {
    items: Mutex<VecDeque<QueueItem>>,
    capacity: usize,
}

impl IngressQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn enqueue(&self, source: usize, packet: Packet) -> Result<()> {
        let mut items = self.items.lock().expect("ingress queue poisoned");
        if items.len() >= self.capacity {
            return Err(DmrError::QueueFull);
        }
        items.push_back(QueueItem { source, packet });
        Ok(())
    }

    pub fn shift(&self) -> Option<QueueItem> {
        self.items.lock().expect("ingress queue poisoned").pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("ingress queue poisoned").len()
    }
}
