//! Evaluates audience, then delegates to the bucketer.

use crate::audience::AudienceEvaluator;
use crate::bucketing::Bucketer;
use crate::error::DecisionCoreError;
use crate::model::{Decision, UserContext};
use crate::reasons::DecisionReasons;

use super::{DecisionContext, DecisionService};

#[derive(Debug, Default, Clone, Copy)]
pub struct ExperimentBucketerService;

impl DecisionService for ExperimentBucketerService {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>) {
        let experiment = match context.experiment {
            Some(e) => e,
            None => {
                return (
                    Decision::nil("NotBucketedIntoVariation"),
                    Some(DecisionCoreError::invalid_input(
                        "bucketer service requires an experiment in context",
                    )),
                )
            }
        };

        if let Some(conditions) = &experiment.audience_conditions {
            match AudienceEvaluator::qualifies(conditions, user, reasons) {
                Ok(true) => {}
                Ok(false) => {
                    reasons.add_info(format!(
                        "user {} does not meet the audience conditions for experiment {}",
                        user.id, experiment.key
                    ));
                    return (Decision::nil("FailedAudienceTargeting"), None);
                }
                Err(err) => return (Decision::nil("NotBucketedIntoVariation"), Some(err)),
            }
        }

        let decision = Bucketer::bucket(user, experiment, context.group);
        if decision.is_nil() {
            reasons.add_info("NotBucketedIntoVariation");
        } else {
            reasons.add_info(format!(
                "user {} bucketed into variation of experiment {}",
                user.id, experiment.key
            ));
        }
        (decision, None)
    }
}
