//! The domain types decision services and the event pipeline operate on.
//!
//! These mirror a project config snapshot (`Experiment`, `Feature`,
//! `Variation`, `Group`) and the per-call inputs/outputs (`UserContext`,
//! `Decision`). Nothing here fetches or parses a datafile; callers build
//! these from whatever config source they have.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An attribute value as accepted by user-context attribute maps and
/// audience matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Null,
}

impl AttributeValue {
    /// Returns the value as a finite `f64` if it is numeric.
    pub fn as_finite_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Immutable per-call user context: an id plus a bag of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub id: String,
    pub attributes: HashMap<String, AttributeValue>,
    /// Segment keys the user is already known to be a member of. Consulted
    /// by the `qualified` audience matcher. Distinct from `attributes`
    /// because segment membership is resolved out-of-band (by whatever
    /// segment source the host application wires up) rather than carried
    /// as a typed attribute value.
    pub qualified_segments: Vec<String>,
}

impl UserContext {
    pub fn new(id: impl Into<String>) -> Self {
        UserContext {
            id: id.into(),
            attributes: HashMap::new(),
            qualified_segments: Vec::new(),
        }
    }

    pub fn with_qualified_segment(mut self, segment: impl Into<String>) -> Self {
        self.qualified_segments.push(segment.into());
        self
    }

    pub fn is_qualified_for(&self, segment: &str) -> bool {
        self.qualified_segments.iter().any(|s| s == segment)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// The key used for bucketing: the `$opt_bucketing_id` reserved
    /// attribute if present and non-null, otherwise `id`.
    pub fn bucketing_id(&self) -> &str {
        match self.attributes.get(crate::reserved_attributes::BUCKETING_ID) {
            Some(AttributeValue::String(s)) if !s.is_empty() => s.as_str(),
            _ => self.id.as_str(),
        }
    }
}

/// One contiguous span of the [0, 10000) bucket space assigned to an
/// entity (a variation id, or a group-member experiment id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficAllocationEntry {
    pub entity_id: String,
    pub end_of_range: u32,
}

/// A single experiment variation.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub id: String,
    pub key: String,
    pub feature_enabled: bool,
    pub variables: HashMap<String, String>,
}

/// Experiment status as read from a project config snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentStatus {
    Running,
    Paused,
    NotStarted,
}

/// A single experiment (also used to model a rollout targeting rule).
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub key: String,
    pub id: String,
    pub layer_id: String,
    pub status: ExperimentStatus,
    pub variations: HashMap<String, Variation>,
    pub variation_key_to_id: HashMap<String, String>,
    pub traffic_allocation: Vec<TrafficAllocationEntry>,
    pub audience_conditions: Option<crate::audience::ConditionNode>,
    pub whitelist: HashMap<String, String>,
    pub group: Option<GroupMembership>,
}

impl Experiment {
    pub fn is_running(&self) -> bool {
        matches!(self.status, ExperimentStatus::Running)
    }

    pub fn variation_by_key(&self, key: &str) -> Option<&Variation> {
        let id = self.variation_key_to_id.get(key)?;
        self.variations.get(id)
    }
}

/// An experiment's membership in a mutually-exclusive group: the group id
/// used as the bucketing layer for the group-level allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMembership {
    pub group_id: String,
}

/// A mutually-exclusive group: experiments share a traffic pool keyed by
/// group id before any experiment-level allocation is consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub experiment_ids: Vec<String>,
    pub traffic_allocation: Vec<TrafficAllocationEntry>,
}

/// A feature flag: an ordered list of feature-test experiments and an
/// ordered rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub key: String,
    pub id: String,
    pub feature_experiments: Vec<Experiment>,
    pub rollout: Vec<Experiment>,
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    FeatureTest,
    Rollout,
    None,
}

/// The outcome of a decision call: a variation (or none), its source, and
/// the experiment it was decided against, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub variation: Option<Variation>,
    pub source: DecisionSource,
    pub experiment: Option<Experiment>,
    pub reason: String,
}

impl Decision {
    pub fn nil(reason: impl Into<String>) -> Self {
        Decision {
            variation: None,
            source: DecisionSource::None,
            experiment: None,
            reason: reason.into(),
        }
    }

    pub fn is_nil(&self) -> bool {
        self.variation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucketing_id_defaults_to_user_id() {
        let ctx = UserContext::new("user-1");
        assert_eq!(ctx.bucketing_id(), "user-1");
    }

    #[test]
    fn bucketing_id_honors_reserved_attribute() {
        let ctx = UserContext::new("user-1").with_attribute(
            "$opt_bucketing_id",
            AttributeValue::String("forced-bucket".into()),
        );
        assert_eq!(ctx.bucketing_id(), "forced-bucket");
    }

    #[test]
    fn nil_decision_has_no_variation() {
        let d = Decision::nil("NotBucketedIntoVariation");
        assert!(d.is_nil());
        assert_eq!(d.reason, "NotBucketedIntoVariation");
    }

    #[test]
    fn finite_float_rejects_nan() {
        assert_eq!(AttributeValue::Float(f64::NAN).as_finite_f64(), None);
        assert_eq!(AttributeValue::Float(1.5).as_finite_f64(), Some(1.5));
    }
}
