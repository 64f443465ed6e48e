//! Id-keyed listener registry for dispatched `LogEvent`s.
//!
//! A mapping from numeric id to listener; registration returns the id,
//! removal is O(1) by id. Guarded by its own mutex, distinct from the
//! queue's, since listener invocation happens on the worker thread after
//! a successful dispatch and has nothing to do with queue contention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::model::LogEvent;

pub type Listener = Box<dyn Fn(&LogEvent) + Send + Sync>;

/// Thread-safe, id-addressable fan-out list for post-dispatch
/// notifications.
pub struct NotificationCenter {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        NotificationCenter {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`, returning an id usable with [`Self::remove`].
    pub fn on_event_dispatch(&self, listener: Listener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("notification center lock poisoned")
            .push((id, listener));
        id
    }

    /// Unregister a listener by id. No-op if the id is unknown (already
    /// removed, or never registered).
    pub fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .expect("notification center lock poisoned")
            .retain(|(listener_id, _)| *listener_id != id);
    }

    /// Invoke every registered listener, in registration order, on the
    /// calling thread. Called by the processor worker after a successful
    /// dispatch; a slow listener stalls the worker by design.
    pub fn notify(&self, event: &LogEvent) {
        let listeners = self.listeners.lock().expect("notification center lock poisoned");
        for (_, listener) in listeners.iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("notification center lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::model::LogEventBody;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn sample_log_event() -> LogEvent {
        LogEvent {
            endpoint_url: "https://events.example/v1".to_string(),
            event: LogEventBody {
                account_id: "a1".to_string(),
                project_id: "p1".to_string(),
                revision: "r1".to_string(),
                client_name: "decision-core".to_string(),
                client_version: "0.1.0".to_string(),
                anonymize_ip: true,
                enrich_decisions: true,
                visitors: Vec::new(),
            },
        }
    }

    #[test]
    fn registered_listener_is_invoked() {
        let center = NotificationCenter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        center.on_event_dispatch(Box::new(move |_event| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        center.notify(&sample_log_event());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_listener_is_not_invoked() {
        let center = NotificationCenter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = center.on_event_dispatch(Box::new(move |_event| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        center.remove(id);
        center.notify(&sample_log_event());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn removing_unknown_id_is_a_noop() {
        let center = NotificationCenter::new();
        center.remove(9999);
        assert_eq!(center.listener_count(), 0);
    }

    #[test]
    fn multiple_listeners_all_invoked_in_registration_order() {
        let center = NotificationCenter::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            center.on_event_dispatch(Box::new(move |_event| {
                order.lock().unwrap().push(i);
            }));
        }
        center.notify(&sample_log_event());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
