//! Bounded FIFO event queue (C1).
//!
//! `Add` on a full queue fails rather than blocks (invariant I3). The
//! default implementation is safe for concurrent multi-producer use; it
//! is the processor's single background worker that performs every
//! `Remove`.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

use super::model::UserEvent;

/// Bounded FIFO queue contract.
pub trait EventQueue: Send + Sync {
    /// Append `event`. Returns `false` if the queue is at capacity.
    fn add(&self, event: UserEvent) -> bool;

    /// Remove and return up to `n` events in FIFO order.
    fn remove(&self, n: usize) -> Vec<UserEvent>;

    /// Peek at up to `n` events without removing them.
    fn get(&self, n: usize) -> Vec<UserEvent>;

    /// Current queue length.
    fn size(&self) -> usize;

    /// Resolves once the queue has at least one event. Used by the
    /// processor's cooperative worker loop; implementations that can't
    /// usefully notify may resolve immediately.
    fn notified(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>>;
}

/// Default in-memory queue backed by a `Mutex<VecDeque>` plus a
/// `Notify` the worker awaits between triggers.
pub struct InMemoryEventQueue {
    capacity: usize,
    events: Mutex<VecDeque<UserEvent>>,
    notify: Notify,
}

impl InMemoryEventQueue {
    pub fn new(capacity: usize) -> Self {
        InMemoryEventQueue {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            notify: Notify::new(),
        }
    }
}

impl EventQueue for InMemoryEventQueue {
    fn add(&self, event: UserEvent) -> bool {
        let mut events = self.events.lock().expect("event queue lock poisoned");
        if events.len() >= self.capacity {
            return false;
        }
        events.push_back(event);
        drop(events);
        self.notify.notify_one();
        true
    }

    fn remove(&self, n: usize) -> Vec<UserEvent> {
        let mut events = self.events.lock().expect("event queue lock poisoned");
        let drain_count = n.min(events.len());
        events.drain(..drain_count).collect()
    }

    fn get(&self, n: usize) -> Vec<UserEvent> {
        let events = self.events.lock().expect("event queue lock poisoned");
        events.iter().take(n).cloned().collect()
    }

    fn size(&self) -> usize {
        self.events.lock().expect("event queue lock poisoned").len()
    }

    fn notified(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(self.notify.notified())
    }
}
