//! Event records and the `LogEvent` wire payload.
//!
//! `UserEvent` is the internal representation a decision call produces;
//! `LogEvent` is what actually gets handed to the dispatcher. The wire
//! shape in [`LogEventBody`] and its nested types is bit-for-bit what the
//! events endpoint expects and must not drift.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::model::AttributeValue;

/// Per-call context shared by every event produced under one project
/// config snapshot. Two events are batch-compatible iff their
/// `project_id` and `revision` are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub project_id: String,
    pub revision: String,
    pub account_id: String,
    pub anonymize_ip: bool,
    pub bot_filtering: bool,
    pub client_name: String,
    pub client_version: String,
    pub attribute_key_to_id: HashMap<String, String>,
}

impl EventContext {
    pub fn is_batch_compatible_with(&self, other: &EventContext) -> bool {
        self.project_id == other.project_id && self.revision == other.revision
    }
}

/// Impression-specific metadata: which experiment/rule produced the
/// decision and what variation it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpressionData {
    pub campaign_id: String,
    pub experiment_id: String,
    pub variation_id: String,
    pub flag_key: String,
    pub rule_key: String,
    /// One of `"experiment"`, `"feature-test"`, `"rollout"`, or `""`.
    pub rule_type: String,
    pub variation_key: String,
    pub enabled: bool,
}

/// Conversion-specific metadata: the tracked event key plus whatever tags
/// the caller attached (revenue/value are parsed out of these, see
/// [`crate::event::builder`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionData {
    pub entity_id: String,
    pub key: String,
    pub tags: HashMap<String, AttributeValue>,
    pub revenue: Option<i64>,
    pub value: Option<f64>,
}

/// Exactly one of these accompanies every `UserEvent` (invariant I1).
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Impression(ImpressionData),
    Conversion(ConversionData),
}

/// One canonical event record produced by the event builder.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEvent {
    pub timestamp_ms: i64,
    pub uuid: Uuid,
    pub context: EventContext,
    pub visitor_id: String,
    pub attributes: Vec<WireAttribute>,
    pub payload: EventPayload,
}

impl UserEvent {
    pub fn is_batch_compatible_with(&self, other: &UserEvent) -> bool {
        self.context.is_batch_compatible_with(&other.context)
    }

    /// Render this event's contribution to a `LogEvent`: one visitor with
    /// a single snapshot.
    pub fn to_visitor(&self) -> Visitor {
        let (decisions, events) = match &self.payload {
            EventPayload::Impression(impression) => (
                vec![WireDecision {
                    campaign_id: impression.campaign_id.clone(),
                    experiment_id: impression.experiment_id.clone(),
                    variation_id: impression.variation_id.clone(),
                    metadata: WireDecisionMetadata {
                        flag_key: impression.flag_key.clone(),
                        rule_key: impression.rule_key.clone(),
                        rule_type: impression.rule_type.clone(),
                        variation_key: impression.variation_key.clone(),
                        enabled: impression.enabled,
                    },
                }],
                vec![WireEvent {
                    entity_id: impression.campaign_id.clone(),
                    key: "campaign_activated".to_string(),
                    timestamp: self.timestamp_ms,
                    uuid: self.uuid.to_string(),
                    tags: None,
                    revenue: None,
                    value: None,
                }],
            ),
            EventPayload::Conversion(conversion) => (
                Vec::new(),
                vec![WireEvent {
                    entity_id: conversion.entity_id.clone(),
                    key: conversion.key.clone(),
                    timestamp: self.timestamp_ms,
                    uuid: self.uuid.to_string(),
                    tags: wire_tags(&conversion.tags),
                    revenue: conversion.revenue,
                    value: conversion.value,
                }],
            ),
        };

        Visitor {
            visitor_id: self.visitor_id.clone(),
            attributes: self.attributes.clone(),
            snapshots: vec![Snapshot { decisions, events }],
        }
    }
}

fn wire_tags(tags: &HashMap<String, AttributeValue>) -> Option<HashMap<String, serde_json::Value>> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|(k, v)| (k.clone(), attribute_value_to_json(v)))
            .collect(),
    )
}

fn attribute_value_to_json(value: &AttributeValue) -> serde_json::Value {
    match value {
        AttributeValue::String(s) => serde_json::Value::String(s.clone()),
        AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
        AttributeValue::Int(i) => serde_json::Value::from(*i),
        AttributeValue::Float(f) => serde_json::json!(f),
        AttributeValue::Null => serde_json::Value::Null,
    }
}

/// One serialized user attribute on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireAttribute {
    pub entity_id: String,
    pub key: String,
    #[serde(rename = "type")]
    pub attr_type: String,
    pub value: serde_json::Value,
}

/// The payload given to the dispatcher.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub endpoint_url: String,
    pub event: LogEventBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEventBody {
    pub account_id: String,
    pub project_id: String,
    pub revision: String,
    pub client_name: String,
    pub client_version: String,
    pub anonymize_ip: bool,
    pub enrich_decisions: bool,
    pub visitors: Vec<Visitor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Visitor {
    pub visitor_id: String,
    pub attributes: Vec<WireAttribute>,
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub decisions: Vec<WireDecision>,
    pub events: Vec<WireEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireDecision {
    pub campaign_id: String,
    pub experiment_id: String,
    pub variation_id: String,
    pub metadata: WireDecisionMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireDecisionMetadata {
    pub flag_key: String,
    pub rule_key: String,
    pub rule_type: String,
    pub variation_key: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireEvent {
    pub entity_id: String,
    pub key: String,
    pub timestamp: i64,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Build one `LogEvent` from a maximal run of batch-compatible events, in
/// arrival order (invariant I2).
pub fn build_log_event(endpoint_url: String, events: &[UserEvent]) -> Option<LogEvent> {
    let first = events.first()?;
    let ctx = &first.context;
    Some(LogEvent {
        endpoint_url,
        event: LogEventBody {
            account_id: ctx.account_id.clone(),
            project_id: ctx.project_id.clone(),
            revision: ctx.revision.clone(),
            client_name: ctx.client_name.clone(),
            client_version: ctx.client_version.clone(),
            anonymize_ip: ctx.anonymize_ip,
            enrich_decisions: true,
            visitors: events.iter().map(UserEvent::to_visitor).collect(),
        },
    })
}
