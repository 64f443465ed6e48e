//! # decision-core
//!
//! Batch event processing and composite decision making for a
//! feature-experimentation client.
//!
//! Two subsystems, composed but independently testable:
//!
//! - A bounded, size-and-time-triggered [`event`] pipeline that turns
//!   decision outcomes into batched `LogEvent`s and hands them to an
//!   injected dispatcher with at-most-once delivery.
//! - A layered [`decision`] pipeline that cascades a user through
//!   overrides, whitelists, experiment bucketing, and rollout targeting
//!   to produce a final variation assignment.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use decision_core::event::{
//!     BatchEventProcessor, EventBuilder, EventContext, LoggingDispatcher, ProcessorConfig,
//! };
//! use decision_core::event::queue::InMemoryEventQueue;
//! use decision_core::model::UserContext;
//!
//! let queue = Arc::new(InMemoryEventQueue::new(1000));
//! let dispatcher = Arc::new(LoggingDispatcher);
//! let processor = BatchEventProcessor::new(ProcessorConfig::default(), queue, dispatcher);
//! processor.start();
//!
//! let builder = EventBuilder::new(event_context);
//! let event = builder.conversion_event("purchase", &UserContext::new("user-1"), Default::default());
//! processor.process_event(event);
//!
//! processor.terminate_and_wait().await;
//! ```

pub mod audience;
pub mod bucketing;
pub mod decision;
pub mod error;
pub mod event;
pub mod model;
pub mod reasons;
pub mod reserved_attributes;
pub mod overrides;

pub use crate::decision::composite::{CompositeExperimentService, CompositeFeatureService};
pub use crate::decision::{DecisionContext, DecisionService};
pub use crate::error::{Categorizable, DecisionCoreError, SafeErrorCategory};
pub use crate::model::{
    AttributeValue, Decision, DecisionSource, Experiment, Feature, Group, UserContext, Variation,
};
pub use crate::overrides::{ExperimentOverrideKey, ExperimentOverrideStore, InMemoryOverrideStore};
pub use crate::reasons::DecisionReasons;

pub use async_trait::async_trait;
