//! Consults an injected read-only store keyed by `(ExperimentKey, UserID)`.

use std::sync::Arc;

use crate::error::DecisionCoreError;
use crate::model::{Decision, DecisionSource};
use crate::overrides::{ExperimentOverrideKey, ExperimentOverrideStore};
use crate::reasons::DecisionReasons;

use super::{DecisionContext, DecisionService};

pub struct ExperimentOverrideService {
    store: Arc<dyn ExperimentOverrideStore>,
}

impl ExperimentOverrideService {
    pub fn new(store: Arc<dyn ExperimentOverrideStore>) -> Self {
        ExperimentOverrideService { store }
    }
}

impl DecisionService for ExperimentOverrideService {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &crate::model::UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>) {
        let experiment = match context.experiment {
            Some(e) => e,
            None => {
                return (
                    Decision::nil("NoOverrideVariationAssignment"),
                    Some(DecisionCoreError::invalid_input(
                        "override service requires an experiment in context",
                    )),
                )
            }
        };

        let key = ExperimentOverrideKey::new(experiment.key.clone(), user.id.clone());
        let found = self.store.get_variation(&key).and_then(|variation_key| {
            experiment
                .variation_by_key(&variation_key)
                .cloned()
                .map(|variation| (variation_key, variation))
        });

        match found {
            Some((variation_key, variation)) => {
                reasons.add_info(format!(
                    "user {} is forced into variation {} of experiment {} by an override",
                    user.id, variation_key, experiment.key
                ));
                (
                    Decision {
                        variation: Some(variation),
                        source: DecisionSource::None,
                        experiment: Some(experiment.clone()),
                        reason: "OverrideVariationAssignmentFound".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::overrides::{ExperimentOverrideWriter, InMemoryOverrideStore};
    use std::collections::HashMap;

    fn experiment_with_variation(variation_id: &str, variation_key: &str) -> Experiment {
        let mut variations = HashMap::new();
        variations.insert(
            variation_id.to_string(),
            Variation {
                id: variation_id.to_string(),
                key: variation_key.to_string(),
                feature_enabled: true,
                variables: HashMap::new(),
            },
        );
        let mut variation_key_to_id = HashMap::new();
        variation_key_to_id.insert(variation_key.to_string(), variation_id.to_string());
        Experiment {
            key: "exp_1".to_string(),
            id: "exp_1".to_string(),
            layer_id: "layer_1".to_string(),
            status: ExperimentStatus::Running,
            variations,
            variation_key_to_id,
            traffic_allocation: Vec::new(),
            audience_conditions: None,
            whitelist: HashMap::new(),
            group: None,
        }
    }

    #[test]
    fn missing_experiment_context_is_an_error() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let service = ExperimentOverrideService::new(store);
        let context = DecisionContext::default();
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(decision.is_nil());
        assert!(error.is_some());
    }

    #[test]
    fn found_override_resolves_to_variation() {
        let store = Arc::new(InMemoryOverrideStore::new());
        store.set_variation(
            ExperimentOverrideKey::new("exp_1", "u1"),
            "treatment".to_string(),
        );
        let service = ExperimentOverrideService::new(store);
        let experiment = experiment_with_variation("v1", "treatment");
        let context = DecisionContext::for_experiment(&experiment, None);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(error.is_none());
        assert_eq!(decision.variation.unwrap().key, "treatment");
    }

    #[test]
    fn override_key_not_in_variation_map_is_nil() {
        let store = Arc::new(InMemoryOverrideStore::new());
        store.set_variation(
            ExperimentOverrideKey::new("exp_1", "u1"),
            "unknown_key".to_string(),
        );
        let service = ExperimentOverrideService::new(store);
        let experiment = experiment_with_variation("v1", "treatment");
        let context = DecisionContext::for_experiment(&experiment, None);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(error.is_none());
        assert!(decision.is_nil());
    }

    #[test]
    fn no_override_set_is_nil_without_error() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let service = ExperimentOverrideService::new(store);
        let experiment = experiment_with_variation("v1", "treatment");
        let context = DecisionContext::for_experiment(&experiment, None);
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = service.get_decision(&context, &user, &mut reasons);
        assert!(error.is_none());
        assert!(decision.is_nil());
    }
}
