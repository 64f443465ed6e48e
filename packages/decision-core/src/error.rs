//! Structured error types for decision-core.
//!
//! `DecisionCoreError` is the only error type produced by decision services
//! and the event pipeline. It is pattern-matchable, and its `Categorizable`
//! impl sanitizes variants before they cross a dispatch or notification
//! boundary.
//!
//! # The Error Boundary Rule
//!
//! > **No transport error ever reaches a decision caller.**
//!
//! `DecisionCoreError` is the only externalized error. A per-layer failure
//! in the composite pipeline does not abort it: a nil decision causes
//! fallthrough to the next layer regardless of whether it carries an error.
//! Only once every layer has yielded a nil decision is an error returned,
//! paired with the last layer's decision.
//!
//! # Example
//!
//! ```ignore
//! use decision_core::error::{Categorizable, DecisionCoreError, SafeErrorCategory};
//!
//! fn handle(err: &DecisionCoreError) {
//!     match err.category() {
//!         SafeErrorCategory::Validation => eprintln!("{}", err.safe_message()),
//!         SafeErrorCategory::InternalError => eprintln!("internal failure"),
//!         _ => {}
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

// =============================================================================
// Safe Error Category
// =============================================================================

/// Category for sanitizing an error before it crosses a dispatch or
/// notification boundary.
///
/// # Security Rules
///
/// - `Validation`: safe to expose details (caller passed a bad argument)
/// - `NotQualified` / `NotBucketed`: safe to expose (expected outcomes, not
///   failures, but modeled as errors per the per-layer fallthrough contract)
/// - `Transport`: NEVER expose details (may contain endpoint/credential info)
/// - `Capacity`: safe to expose (queue full, caller can back off)
/// - `InternalError`: NEVER expose details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeErrorCategory {
    Validation,
    NotQualified,
    Transport,
    Capacity,
    InternalError,
}

impl fmt::Display for SafeErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeErrorCategory::Validation => write!(f, "validation_error"),
            SafeErrorCategory::NotQualified => write!(f, "not_qualified"),
            SafeErrorCategory::Transport => write!(f, "transport_error"),
            SafeErrorCategory::Capacity => write!(f, "capacity_error"),
            SafeErrorCategory::InternalError => write!(f, "internal_error"),
        }
    }
}

// =============================================================================
// Categorizable Trait
// =============================================================================

/// Trait for errors that can be categorized for safe external exposure.
///
/// # Safe Message Contract
///
/// - `Validation`, `NotQualified`, `Capacity` MAY return their `Display`
///   string verbatim.
/// - `Transport` and `InternalError` MUST return generic messages only.
pub trait Categorizable: std::error::Error {
    /// Return the safe category for this error.
    fn category(&self) -> SafeErrorCategory;

    /// Return a sanitized, caller-safe message.
    fn safe_message(&self) -> Cow<'static, str>;
}

// =============================================================================
// Decision Core Error
// =============================================================================

/// Structured error type for decision-core operations.
///
/// Decision services never panic. A per-layer error does not abort a
/// composite pipeline; it causes fallthrough to the next layer.
#[derive(Debug, Error)]
pub enum DecisionCoreError {
    /// A caller-supplied argument was malformed (empty key, negative
    /// traffic allocation range, malformed condition tree, and so on).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// The user's context failed audience evaluation for the named entity.
    #[error("user did not qualify for {entity_key} ({rule})")]
    NotQualified {
        /// Experiment or feature key being evaluated.
        entity_key: String,
        /// Human-readable reason (audience id, whitelist miss, and so on).
        rule: String,
    },

    /// The user was evaluated for bucketing but fell outside every
    /// traffic-allocation range.
    #[error("user {bucketing_id} was not bucketed into {entity_id}")]
    NotBucketed {
        /// The bucketing id used (the resolved `$opt_bucketing_id` or user id).
        bucketing_id: String,
        /// Experiment or group id the user was bucketed against.
        entity_id: String,
    },

    /// The event dispatcher failed to deliver a batch. Never surfaced to a
    /// decision caller; only observed by the processor and its listeners.
    #[error("event transport failed: {message}")]
    Transport {
        /// Sanitized description of the transport failure.
        message: String,
    },

    /// The event queue rejected an event because it is full.
    #[error("event queue at capacity ({limit} events)")]
    Capacity {
        /// The queue's configured bound.
        limit: usize,
    },

    /// An invariant was violated that indicates a bug rather than bad input.
    #[error("internal error: {message}")]
    Internal {
        /// Internal detail, never exposed via `safe_message`.
        message: String,
    },
}

impl DecisionCoreError {
    /// Build an [`DecisionCoreError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DecisionCoreError::InvalidInput {
            message: message.into(),
        }
    }

    /// Build a [`DecisionCoreError::NotQualified`].
    pub fn not_qualified(entity_key: impl Into<String>, rule: impl Into<String>) -> Self {
        DecisionCoreError::NotQualified {
            entity_key: entity_key.into(),
            rule: rule.into(),
        }
    }

    /// Build a [`DecisionCoreError::NotBucketed`].
    pub fn not_bucketed(bucketing_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        DecisionCoreError::NotBucketed {
            bucketing_id: bucketing_id.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Build a [`DecisionCoreError::Transport`] from any internal error,
    /// dropping everything but a generic description.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        DecisionCoreError::Transport {
            message: err.to_string(),
        }
    }

    /// Build a [`DecisionCoreError::Capacity`].
    pub fn capacity(limit: usize) -> Self {
        DecisionCoreError::Capacity { limit }
    }

    /// Build a [`DecisionCoreError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        DecisionCoreError::Internal {
            message: message.into(),
        }
    }
}

impl Categorizable for DecisionCoreError {
    fn category(&self) -> SafeErrorCategory {
        match self {
            DecisionCoreError::InvalidInput { .. } => SafeErrorCategory::Validation,
            DecisionCoreError::NotQualified { .. } => SafeErrorCategory::NotQualified,
            DecisionCoreError::NotBucketed { .. } => SafeErrorCategory::NotQualified,
            DecisionCoreError::Transport { .. } => SafeErrorCategory::Transport,
            DecisionCoreError::Capacity { .. } => SafeErrorCategory::Capacity,
            DecisionCoreError::Internal { .. } => SafeErrorCategory::InternalError,
        }
    }

    fn safe_message(&self) -> Cow<'static, str> {
        match self {
            DecisionCoreError::InvalidInput { message } => message.clone().into(),
            DecisionCoreError::NotQualified { entity_key, .. } => {
                format!("not qualified for {entity_key}").into()
            }
            DecisionCoreError::NotBucketed { entity_id, .. } => {
                format!("not bucketed into {entity_id}").into()
            }
            DecisionCoreError::Capacity { limit } => format!("queue full ({limit})").into(),
            DecisionCoreError::Transport { .. } => "event delivery failed".into(),
            DecisionCoreError::Internal { .. } => "an internal error occurred".into(),
        }
    }
}
