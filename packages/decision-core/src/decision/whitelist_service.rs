//! Same contract as the override service, but the source is the
//! experiment's own embedded whitelist map rather than an injected store.

use crate::error::DecisionCoreError;
use crate::model::{Decision, DecisionSource, UserContext};
use crate::reasons::DecisionReasons;

use super::{DecisionContext, DecisionService};

#[derive(Debug, Default, Clone, Copy)]
pub struct ExperimentWhitelistService;

impl DecisionService for ExperimentWhitelistService {
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
                    Decision::nil("NoOverrideVariationAssignment"),
                    Some(DecisionCoreError::invalid_input(
                        "whitelist service requires an experiment in context",
                    )),
                )
            }
        };

        let found = experiment.whitelist.get(&user.id).and_then(|variation_key| {
            experiment
                .variation_by_key(variation_key)
                .cloned()
                .map(|variation| (variation_key.clone(), variation))
        });

        match found {
            Some((variation_key, variation)) => {
                reasons.add_info(format!(
                    "user {} is whitelisted into variation {} of experiment {}",
                    user.id, variation_key, experiment.key
                ));
                (
                    Decision {
                        variation: Some(variation),
                        source: DecisionSource::None,
                        experiment: Some(experiment.clone()),
                        reason: "WhitelistVariationAssignmentFound".to_string(),
                    },
                    None,
                )
            }
            None => {
                reasons.add_info("NoOverrideVariationAssignment");
                (Decision::nil("NoOverrideVariationAssignment"), None)
            }
        }
    }
}
