//! `EventDispatcher` is consumed, not specified: HTTP transport detail is
//! out of scope. This module defines the contract and a couple of
//! reference implementations useful for composing a processor without an
//! HTTP stack (logging, and a recording fake for tests).

use async_trait::async_trait;

use crate::error::DecisionCoreError;

use super::model::LogEvent;

/// Truth table: `Ok(true)` is success. `Ok(false)` or `Err` is failure;
/// the processor keeps the batch queued for retry on the next trigger.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch_event(&self, event: &LogEvent) -> Result<bool, DecisionCoreError>;
}

/// Logs the event at debug level and reports success. Useful as a
/// placeholder until a real HTTP-backed dispatcher is wired in.
#[derive(Debug, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl EventDispatcher for LoggingDispatcher {
    async fn dispatch_event(&self, event: &LogEvent) -> Result<bool, DecisionCoreError> {
        tracing::debug!(
            project_id = %event.event.project_id,
            revision = %event.event.revision,
            visitor_count = event.event.visitors.len(),
            "dispatching log event"
        );
        Ok(true)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures every event handed to it. `force_failure` makes every
    /// call report failure without recording the event, for exercising
    /// dispatch-failure retention.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        events: Mutex<Vec<LogEvent>>,
        force_failure: bool,
    }

    impl RecordingDispatcher {
        pub fn new() -> Self {
            RecordingDispatcher::default()
        }

        pub fn failing() -> Self {
            RecordingDispatcher {
                events: Mutex::new(Vec::new()),
                force_failure: true,
            }
        }

        pub fn recorded(&self) -> Vec<LogEvent> {
            self.events.lock().expect("recording dispatcher lock poisoned").clone()
        }
    }

    #[async_trait]
    impl EventDispatcher for RecordingDispatcher {
        async fn dispatch_event(&self, event: &LogEvent) -> Result<bool, DecisionCoreError> {
            if self.force_failure {
                return Ok(false);
            }
            self.events
                .lock()
                .expect("recording dispatcher lock poisoned")
                .push(event.clone());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingDispatcher;
    use super::*;
    use crate::event::model::LogEventBody;

    fn sample() -> LogEvent {
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

    #[tokio::test]
    async fn logging_dispatcher_always_succeeds() {
        let dispatcher = LoggingDispatcher;
        assert_eq!(dispatcher.dispatch_event(&sample()).await.unwrap(), true);
    }

    #[tokio::test]
    async fn recording_dispatcher_captures_events() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.dispatch_event(&sample()).await.unwrap();
        assert_eq!(dispatcher.recorded().len(), 1);
    }

    #[tokio::test]
    async fn failing_dispatcher_reports_false_and_records_nothing() {
        let dispatcher = RecordingDispatcher::failing();
        let ok = dispatcher.dispatch_event(&sample()).await.unwrap();
        assert!(!ok);
        assert!(dispatcher.recorded().is_empty());
    }
}
