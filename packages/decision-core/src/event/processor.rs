//! The batch event processor (C3): drains the queue on size/time
//! triggers, groups by batch-compatibility key, and hands each run to the
//! dispatcher with at-most-once delivery semantics.
//!
//! The worker is a single cooperative loop awaiting `race(tick,
//! queue-signal, cancel)`, matching a parallel-threads runtime's
//! channel/timer model via `tokio::select!`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::dispatcher::EventDispatcher;
use super::model::{build_log_event, UserEvent};
use super::notification::{Listener, NotificationCenter};
use super::queue::EventQueue;

/// Injectable configuration, builder-style, with the defaults in §4.1.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub queue_size: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub endpoint_url: String,
    pub sdk_key: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            queue_size: 1000,
            batch_size: 10,
            flush_interval: Duration::from_secs(30),
            endpoint_url: "https://events.example/v1".to_string(),
            sdk_key: None,
        }
    }
}

impl ProcessorConfig {
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }

    pub fn with_sdk_key(mut self, sdk_key: impl Into<String>) -> Self {
        self.sdk_key = Some(sdk_key.into());
        self
    }
}

/// Asynchronous, bounded, time-and-size-triggered event pipeline.
pub struct BatchEventProcessor {
    config: ProcessorConfig,
    queue: Arc<dyn EventQueue>,
    dispatcher: Arc<dyn EventDispatcher>,
    notifications: Arc<NotificationCenter>,
    started: AtomicBool,
    cancelled: Arc<AtomicBool>,
    cancel_signal: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BatchEventProcessor {
    pub fn new(
        config: ProcessorConfig,
        queue: Arc<dyn EventQueue>,
        dispatcher: Arc<dyn EventDispatcher>,
    ) -> Arc<Self> {
        Arc::new(BatchEventProcessor {
            config,
            queue,
            dispatcher,
            notifications: Arc::new(NotificationCenter::new()),
            started: AtomicBool::new(false),
            cancelled: Arc::new(AtomicBool::new(false)),
            cancel_signal: Arc::new(Notify::new()),
            worker: Mutex::new(None),
        })
    }

    /// Non-blocking; returns whether `event` was accepted. Rejects when
    /// the queue is at capacity, the processor hasn't been started, or it
    /// has already been shut down.
    pub fn process_event(&self, event: UserEvent) -> bool {
        if !self.started.load(Ordering::SeqCst) || self.cancelled.load(Ordering::SeqCst) {
            tracing::warn!("event rejected: processor not started or already shut down");
            return false;
        }
        let accepted = self.queue.add(event);
        if !accepted {
            tracing::warn!(limit = self.config.queue_size, "event rejected: queue at capacity");
        }
        accepted
    }

    /// Idempotent: the second and later calls are no-ops. Launches
    /// exactly one background worker, guarded by `started`.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(
            batch_size = self.config.batch_size,
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            "batch event processor starting"
        );
        let processor = Arc::clone(self);
        let handle = tokio::spawn(async move { processor.run().await });
        *self.worker.lock().expect("worker handle lock poisoned") = Some(handle);
    }

    /// Current queue length.
    pub fn events_count(&self) -> usize {
        self.queue.size()
    }

    /// Register a listener invoked with each emitted `LogEvent`, on the
    /// worker thread, after it is handed to the dispatcher. Returns an id
    /// usable with [`Self::remove_on_event_dispatch`].
    pub fn on_event_dispatch(&self, listener: Listener) -> u64 {
        self.notifications.on_event_dispatch(listener)
    }

    pub fn remove_on_event_dispatch(&self, id: u64) {
        self.notifications.remove(id);
    }

    /// Signal shutdown and wait for the worker's final drain+flush.
    pub async fn terminate_and_wait(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_signal.notify_one();
        let handle = self.worker.lock().expect("worker handle lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick fires immediately; consume it

        loop {
            let queue_signal = self.queue.notified();
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = queue_signal => {
                    if self.queue.size() >= self.config.batch_size {
                        self.flush().await;
                    }
                }
                _ = self.cancel_signal.notified() => {
                    self.flush().await;
                    break;
                }
            }
        }
    }

    /// Drains every currently staged run in FIFO order, emitting one
    /// `LogEvent` per maximal (ProjectID, Revision)-compatible run. Stops
    /// at the first dispatch failure, leaving that run and everything
    /// behind it queued for the next trigger.
    async fn flush(&self) {
        loop {
            let staged = self.queue.get(usize::MAX);
            if staged.is_empty() {
                break;
            }

            let run_len = Self::first_run_len(&staged);
            let run = &staged[..run_len];
            let log_event = match build_log_event(self.config.endpoint_url.clone(), run) {
                Some(event) => event,
                None => break,
            };

            match self.dispatcher.dispatch_event(&log_event).await {
                Ok(true) => {
                    self.queue.remove(run_len);
                    self.notifications.notify(&log_event);
                    if let Some(sdk_key) = &self.config.sdk_key {
                        tracing::info!(sdk_key = %sdk_key, "log event notification published");
                    }
                }
                Ok(false) => {
                    tracing::warn!(
                        project_id = %log_event.event.project_id,
                        revision = %log_event.event.revision,
                        "dispatcher reported failure; batch remains queued for retry"
                    );
                    break;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "dispatcher error; batch remains queued for retry");
                    break;
                }
            }
        }
    }

    fn first_run_len(events: &[UserEvent]) -> usize {
        let mut len = 1;
        while len < events.len() && events[len].is_batch_compatible_with(&events[0]) {
            len += 1;
        }
        len
    }
}
