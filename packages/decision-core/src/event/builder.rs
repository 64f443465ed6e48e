//! Constructs canonical `UserEvent` records from a decision outcome (C2).

use uuid::Uuid;

use crate::model::{AttributeValue, Decision, DecisionSource, UserContext};
use crate::reserved_attributes;

use super::model::{ConversionData, EventContext, EventPayload, ImpressionData, UserEvent, WireAttribute};

/// Builds impression and conversion events against one immutable
/// [`EventContext`] snapshot.
pub struct EventBuilder {
    context: EventContext,
}

impl EventBuilder {
    pub fn new(context: EventContext) -> Self {
        EventBuilder { context }
    }

    /// Build an impression event from a non-nil decision. Returns `None`
    /// for a nil decision: there's nothing to record.
    pub fn impression_event(&self, decision: &Decision, user: &UserContext) -> Option<UserEvent> {
        let variation = decision.variation.as_ref()?;
        let experiment = decision.experiment.as_ref();

        let rule_type = match decision.source {
            DecisionSource::FeatureTest => "feature-test",
            DecisionSource::Rollout => "rollout",
            DecisionSource::None => {
                if experiment.is_some() {
                    "experiment"
                } else {
                    ""
                }
            }
        };

        let impression = ImpressionData {
            campaign_id: experiment.map(|e| e.layer_id.clone()).unwrap_or_default(),
            experiment_id: experiment.map(|e| e.id.clone()).unwrap_or_default(),
            variation_id: variation.id.clone(),
            flag_key: String::new(),
            rule_key: experiment.map(|e| e.key.clone()).unwrap_or_default(),
            rule_type: rule_type.to_string(),
            variation_key: variation.key.clone(),
            enabled: variation.feature_enabled,
        };

        Some(UserEvent {
            timestamp_ms: now_ms(),
            uuid: Uuid::new_v4(),
            context: self.context.clone(),
            visitor_id: user.id.clone(),
            attributes: self.serialize_attributes(user),
            payload: EventPayload::Impression(impression),
        })
    }

    /// Build a conversion event for an arbitrary tracked event key and an
    /// optional tag map. Revenue and value are parsed out of `tags` per
    /// [`parse_revenue`] / [`parse_value`] and silently omitted when not
    /// present or not parseable.
    pub fn conversion_event(
        &self,
        event_key: impl Into<String>,
        user: &UserContext,
        tags: std::collections::HashMap<String, AttributeValue>,
    ) -> UserEvent {
        let event_key = event_key.into();
        let revenue = tags.get("revenue").and_then(parse_revenue);
        let value = tags.get("value").and_then(parse_value);

        let conversion = ConversionData {
            entity_id: event_key.clone(),
            key: event_key,
            tags,
            revenue,
            value,
        };

        UserEvent {
            timestamp_ms: now_ms(),
            uuid: Uuid::new_v4(),
            context: self.context.clone(),
            visitor_id: user.id.clone(),
            attributes: self.serialize_attributes(user),
            payload: EventPayload::Conversion(conversion),
        }
    }

    /// Only attributes whose key appears in `attribute_key_to_id` OR
    /// begins with the reserved `$opt_` prefix are emitted; each carries
    /// its datafile-assigned attribute id when known.
    fn serialize_attributes(&self, user: &UserContext) -> Vec<WireAttribute> {
        user.attributes
            .iter()
            .filter(|(key, _)| {
                self.context.attribute_key_to_id.contains_key(key.as_str())
                    || reserved_attributes::is_reserved(key)
            })
            .map(|(key, value)| WireAttribute {
                entity_id: self
                    .context
                    .attribute_key_to_id
                    .get(key)
                    .cloned()
                    .unwrap_or_default(),
                key: key.clone(),
                attr_type: "custom".to_string(),
                value: attribute_value_to_json(value),
            })
            .collect()
    }
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

/// Coerce a tag value to `i64`. Accepts an already-integral value, or a
/// string/float that round-trips exactly; anything else (including a
/// fractional float) is not parseable and yields `None`.
fn parse_revenue(value: &AttributeValue) -> Option<i64> {
    match value {
        AttributeValue::Int(i) => Some(*i),
        AttributeValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        AttributeValue::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

/// Coerce a tag value to `f64`. Accepts an integer, a finite float, or a
/// parseable string.
fn parse_value(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Int(i) => Some(*i as f64),
        AttributeValue::Float(f) if f.is_finite() => Some(*f),
        AttributeValue::String(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
