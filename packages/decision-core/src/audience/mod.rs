//! Audience-condition tree evaluation (C5).
//!
//! A condition tree's internal nodes are `and`/`or`/`not`; its leaves are
//! `{name, type, match, value}` conditions evaluated against a
//! [`UserContext`](crate::model::UserContext) through the matcher
//! registry in [`matchers`]. Combinators use three-valued logic with
//! null-propagation; an unknown result at the root means the user does
//! not qualify.

pub mod matchers;

use crate::error::DecisionCoreError;
use crate::model::{AttributeValue, UserContext};
use crate::reasons::DecisionReasons;

/// A condition tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    And(Vec<ConditionNode>),
    Or(Vec<ConditionNode>),
    Not(Box<ConditionNode>),
    Leaf(Condition),
}

/// A single leaf condition: an attribute name, its declared type (carried
/// through for datafile fidelity but not consulted by matching — the
/// matcher's own type handling governs comparisons), a `match` kind, and
/// the expected value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub name: String,
    pub condition_type: String,
    pub match_kind: String,
    pub value: AttributeValue,
}

/// Three-valued logic result of evaluating a node or leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    fn and(self, other: Tristate) -> Tristate {
        use Tristate::*;
        match (self, other) {
            (False, _) | (_, False) => False,
            (True, True) => True,
            _ => Unknown,
        }
    }

    fn or(self, other: Tristate) -> Tristate {
        use Tristate::*;
        match (self, other) {
            (True, _) | (_, True) => True,
            (False, False) => False,
            _ => Unknown,
        }
    }

    fn not(self) -> Tristate {
        match self {
            Tristate::True => Tristate::False,
            Tristate::False => Tristate::True,
            Tristate::Unknown => Tristate::Unknown,
        }
    }
}

/// Stateless audience-condition evaluation.
pub struct AudienceEvaluator;

impl AudienceEvaluator {
    /// Root-level qualification check. Unknown resolves to
    /// does-not-qualify, per the combinator rules.
    pub fn qualifies(
        node: &ConditionNode,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> Result<bool, DecisionCoreError> {
        match Self::evaluate(node, user, reasons)? {
            Tristate::True => Ok(true),
            Tristate::False | Tristate::Unknown => Ok(false),
        }
    }

    fn evaluate(
        node: &ConditionNode,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> Result<Tristate, DecisionCoreError> {
        match node {
            ConditionNode::And(children) => {
                let mut result = Tristate::True;
                for child in children {
                    result = result.and(Self::evaluate(child, user, reasons)?);
                    if result == Tristate::False {
                        break;
                    }
                }
                Ok(result)
            }
            ConditionNode::Or(children) => {
                let mut result = Tristate::False;
                for child in children {
                    result = result.or(Self::evaluate(child, user, reasons)?);
                    if result == Tristate::True {
                        break;
                    }
                }
                Ok(result)
            }
            ConditionNode::Not(inner) => Ok(Self::evaluate(inner, user, reasons)?.not()),
            ConditionNode::Leaf(condition) => Self::evaluate_leaf(condition, user, reasons),
        }
    }

    fn evaluate_leaf(
        condition: &Condition,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> Result<Tristate, DecisionCoreError> {
        let matcher = matchers::lookup(&condition.match_kind).ok_or_else(|| {
            DecisionCoreError::internal(format!(
                "no matcher registered for match kind \"{}\"",
                condition.match_kind
            ))
        })?;

        let actual = if condition.match_kind == "qualified" {
            let segment = condition.value.as_str().unwrap_or_default();
            Some(AttributeValue::Bool(user.is_qualified_for(segment)))
        } else {
            user.attribute(&condition.name).cloned()
        };

        match matcher(actual.as_ref(), &condition.value) {
            Some(true) => Ok(Tristate::True),
            Some(false) => Ok(Tristate::False),
            None => {
                reasons.add_info(format!(
                    "attribute \"{}\" missing or type-mismatched for condition (match: {})",
                    condition.name, condition.match_kind
                ));
                Ok(Tristate::Unknown)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exists_leaf(name: &str) -> ConditionNode {
        ConditionNode::Leaf(Condition {
            name: name.to_string(),
            condition_type: "custom_attribute".to_string(),
            match_kind: "exists".to_string(),
            value: AttributeValue::Null,
        })
    }

    #[test]
    fn and_short_circuits_on_false() {
        let tree = ConditionNode::And(vec![exists_leaf("missing"), exists_leaf("also_missing")]);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        assert_eq!(
            AudienceEvaluator::evaluate(&tree, &user, &mut reasons).unwrap(),
            Tristate::False
        );
    }

    #[test]
    fn or_unknown_and_true_is_true() {
        let tree = ConditionNode::Or(vec![
            ConditionNode::Leaf(Condition {
                name: "missing".to_string(),
                condition_type: "custom_attribute".to_string(),
                match_kind: "exact".to_string(),
                value: AttributeValue::String("x".into()),
            }),
            exists_leaf("present"),
        ]);
        let user = UserContext::new("u1").with_attribute("present", AttributeValue::Bool(true));
        let mut reasons = DecisionReasons::new(true);
        assert_eq!(
            AudienceEvaluator::evaluate(&tree, &user, &mut reasons).unwrap(),
            Tristate::True
        );
    }

    #[test]
    fn unknown_and_false_is_false() {
        let tree = ConditionNode::And(vec![
            ConditionNode::Leaf(Condition {
                name: "missing".to_string(),
                condition_type: "custom_attribute".to_string(),
                match_kind: "exact".to_string(),
                value: AttributeValue::String("x".into()),
            }),
            exists_leaf("missing_too"),
        ]);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        assert_eq!(
            AudienceEvaluator::evaluate(&tree, &user, &mut reasons).unwrap(),
            Tristate::False
        );
    }

    #[test]
    fn not_of_unknown_is_unknown() {
        let tree = ConditionNode::Not(Box::new(ConditionNode::Leaf(Condition {
            name: "missing".to_string(),
            condition_type: "custom_attribute".to_string(),
            match_kind: "exact".to_string(),
            value: AttributeValue::String("x".into()),
        })));
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        assert_eq!(
            AudienceEvaluator::evaluate(&tree, &user, &mut reasons).unwrap(),
            Tristate::Unknown
        );
    }

    #[test]
    fn root_unknown_does_not_qualify() {
        let tree = exists_leaf("missing");
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        assert!(!AudienceEvaluator::qualifies(&tree, &user, &mut reasons).unwrap());
    }

    #[test]
    fn missing_matcher_is_an_error() {
        let tree = ConditionNode::Leaf(Condition {
            name: "x".to_string(),
            condition_type: "custom_attribute".to_string(),
            match_kind: "starts_with".to_string(),
            value: AttributeValue::String("x".into()),
        });
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        assert!(AudienceEvaluator::evaluate(&tree, &user, &mut reasons).is_err());
    }

    #[test]
    fn qualified_matcher_checks_segment_membership() {
        let tree = ConditionNode::Leaf(Condition {
            name: "".to_string(),
            condition_type: "third_party_dimension".to_string(),
            match_kind: "qualified".to_string(),
            value: AttributeValue::String("vip_segment".into()),
        });
        let user = UserContext::new("u1").with_qualified_segment("vip_segment");
        let mut reasons = DecisionReasons::new(true);
        assert_eq!(
            AudienceEvaluator::evaluate(&tree, &user, &mut reasons).unwrap(),
            Tristate::True
        );
    }

    #[test]
    fn exists_matcher_property_p10() {
        let mut reasons = DecisionReasons::new(true);
        let present = UserContext::new("u1").with_attribute("X", AttributeValue::String("any".into()));
        assert_eq!(
            AudienceEvaluator::evaluate(&exists_leaf("X"), &present, &mut reasons).unwrap(),
            Tristate::True
        );

        let other_attr = UserContext::new("u1").with_attribute("X1", AttributeValue::String("any".into()));
        assert_eq!(
            AudienceEvaluator::evaluate(&exists_leaf("X"), &other_attr, &mut reasons).unwrap(),
            Tristate::False
        );

        let empty = UserContext::new("u1");
        assert_eq!(
            AudienceEvaluator::evaluate(&exists_leaf("X"), &empty, &mut reasons).unwrap(),
            Tristate::False
        );
    }
}
