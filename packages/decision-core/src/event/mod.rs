//! The event pipeline (C1-C3): queueing, building, batching, and
//! dispatching decision outcomes as `LogEvent`s.
//!
//! [`processor::BatchEventProcessor`] is the composition root: it owns a
//! queue, a dispatcher, and a notification center, and runs the single
//! background worker that drains the queue into batches.

pub mod builder;
pub mod dispatcher;
pub mod model;
pub mod notification;
pub mod processor;
pub mod queue;

pub use builder::EventBuilder;
pub use dispatcher::{testing, EventDispatcher, LoggingDispatcher};
pub use model::{
    ConversionData, EventContext, EventPayload, ImpressionData, LogEvent, LogEventBody, UserEvent,
};
pub use notification::{Listener, NotificationCenter};
pub use processor::{BatchEventProcessor, ProcessorConfig};
pub use queue::{EventQueue, InMemoryEventQueue};
