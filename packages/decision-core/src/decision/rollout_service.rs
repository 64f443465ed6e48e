//! Walks a feature's rollout rules in order, stopping at the first one
//! that qualifies and buckets, and falling back to the terminal
//! "everyone-else" rule when none do.

use crate::audience::AudienceEvaluator;
use crate::bucketing::Bucketer;
use crate::error::DecisionCoreError;
use crate::model::{Decision, DecisionSource, UserContext};
use crate::reasons::DecisionReasons;

use super::{DecisionContext, DecisionService};

#[derive(Debug, Default, Clone, Copy)]
pub struct RolloutService;

impl DecisionService for RolloutService {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>) {
        let feature = match context.feature {
            Some(f) => f,
            None => {
                return (
                    Decision::nil("NoRolloutAvailable"),
                    Some(DecisionCoreError::invalid_input(
                        "rollout service requires a feature in context",
                    )),
                )
            }
        };

        if feature.rollout.is_empty() {
            return (Decision::nil("NoRolloutAvailable"), None);
        }

        let split_at = feature.rollout.len() - 1;
        let (non_terminal, terminal) = feature.rollout.split_at(split_at);

        for rule in non_terminal {
            let qualifies = match &rule.audience_conditions {
                Some(conditions) => match AudienceEvaluator::qualifies(conditions, user, reasons) {
                    Ok(q) => q,
                    Err(err) => return (Decision::nil("NoRolloutResult"), Some(err)),
                },
                None => true,
            };

            if !qualifies {
                continue;
            }

            let decision = Bucketer::bucket(user, rule, context.group);
            if !decision.is_nil() {
                reasons.add_info(format!(
                    "user {} bucketed into rollout rule {}",
                    user.id, rule.key
                ));
                return (
                    Decision {
                        source: DecisionSource::Rollout,
                        ..decision
                    },
                    None,
                );
            }
            // Qualified but not bucketed: skip the remaining non-terminal
            // rules and fall through to the terminal rule.
            break;
        }

        let terminal_rule = match terminal.first() {
            Some(rule) => rule,
            None => {
                return (
                    Decision::nil("NoRolloutResult"),
                    Some(DecisionCoreError::internal(
                        "rollout has no terminal everyone-else rule",
                    )),
                )
            }
        };

        let qualifies_terminal = match &terminal_rule.audience_conditions {
            Some(conditions) => match AudienceEvaluator::qualifies(conditions, user, reasons) {
                Ok(q) => q,
                Err(err) => return (Decision::nil("NoRolloutResult"), Some(err)),
            },
            None => true,
        };

        if !qualifies_terminal {
            return (Decision::nil("NoRolloutResult"), None);
        }

        let decision = Bucketer::bucket(user, terminal_rule, context.group);
        if decision.is_nil() {
            (Decision::nil("NoRolloutResult"), None)
        } else {
            (
                Decision {
                    source: DecisionSource::Rollout,
                    ..decision
                },
                None,
            )
        }
    }
}
