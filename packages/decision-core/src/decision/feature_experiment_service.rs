//! Walks a feature's `FeatureExperiments` in order, running the
//! composite experiment chain (override -> whitelist -> bucketer) against
//! each until one produces a non-nil decision.

use std::sync::Arc;

use crate::error::DecisionCoreError;
use crate::model::{Decision, DecisionSource, UserContext};
use crate::reasons::DecisionReasons;

use super::composite::CompositeExperimentService;
use super::{DecisionContext, DecisionService};

pub struct FeatureExperimentService {
    composite: Arc<CompositeExperimentService>,
}

impl FeatureExperimentService {
    pub fn new(composite: Arc<CompositeExperimentService>) -> Self {
        FeatureExperimentService { composite }
    }
}

impl DecisionService for FeatureExperimentService {
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
                    Decision::nil("NoFeatureTestAvailable"),
                    Some(DecisionCoreError::invalid_input(
                        "feature experiment service requires a feature in context",
                    )),
                )
            }
        };

        let mut last_decision = Decision::nil("NoFeatureTestAvailable");
        let mut last_error: Option<DecisionCoreError> = None;

        for experiment in &feature.feature_experiments {
            let experiment_context = DecisionContext::for_experiment(experiment, context.group);
            let (decision, error) = self.composite.get_decision(&experiment_context, user, reasons);
            if !decision.is_nil() {
                reasons.add_info(format!(
                    "user {} assigned via feature test {}",
                    user.id, experiment.key
                ));
                return (
                    Decision {
                        source: DecisionSource::FeatureTest,
                        ..decision
                    },
                    None,
                );
            }
            last_decision = decision;
            last_error = error;
        }

        (last_decision, last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::overrides::InMemoryOverrideStore;
    use std::collections::HashMap;

    fn experiment(key: &str, variation_id: &str) -> Experiment {
        let mut variations = HashMap::new();
        variations.insert(
            variation_id.to_string(),
            Variation {
                id: variation_id.to_string(),
                key: "on".to_string(),
                feature_enabled: true,
                variables: HashMap::new(),
            },
        );
        let mut variation_key_to_id = HashMap::new();
        variation_key_to_id.insert("on".to_string(), variation_id.to_string());
        Experiment {
            key: key.to_string(),
            id: key.to_string(),
            layer_id: format!("{key}_layer"),
            status: ExperimentStatus::Running,
            variations,
            variation_key_to_id,
            traffic_allocation: vec![TrafficAllocationEntry {
                entity_id: variation_id.to_string(),
                end_of_range: 10000,
            }],
            audience_conditions: None,
            whitelist: HashMap::new(),
            group: None,
        }
    }

    #[test]
    fn first_qualifying_experiment_wins() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let composite = Arc::new(CompositeExperimentService::new(store));
        let service = FeatureExperimentService::new(composite);
        let feature = Feature {
            key: "feat_1".to_string(),
            id: "feat_1".to_string(),
            feature_experiments: vec![experiment("exp_1", "v1")],
            rollout: Vec::new(),
        };
        let context = DecisionContext::for_feature(&feature, None);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(error.is_none());
        assert_eq!(decision.source, DecisionSource::FeatureTest);
    }

    #[test]
    fn no_experiments_is_nil() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let composite = Arc::new(CompositeExperimentService::new(store));
        let service = FeatureExperimentService::new(composite);
        let feature = Feature {
            key: "feat_1".to_string(),
            id: "feat_1".to_string(),
            feature_experiments: Vec::new(),
            rollout: Vec::new(),
        };
        let context = DecisionContext::for_feature(&feature, None);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(error.is_none());
        assert!(decision.is_nil());
    }
}
