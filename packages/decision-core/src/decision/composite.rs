//! Fixed-order chains with short-circuit-on-hit and
//! fallthrough-on-nil-or-error semantics (C7).
//!
//! Tie-breaking and ordering are normative: a composite must not reorder
//! its chain and must not skip ahead on error. When every service in the
//! chain yields a nil decision, the *last* decision and the *last* error
//! observed are returned together, even though most layers never error.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::DecisionCoreError;
use crate::model::{Decision, UserContext};
use crate::overrides::ExperimentOverrideStore;
use crate::reasons::DecisionReasons;

use super::bucketer_service::ExperimentBucketerService;
use super::feature_experiment_service::FeatureExperimentService;
use super::override_service::ExperimentOverrideService;
use super::rollout_service::RolloutService;
use super::whitelist_service::ExperimentWhitelistService;
use super::{DecisionContext, DecisionService};

/// Runs `chain` in order, short-circuiting on the first non-nil decision.
/// Every nil result (whether or not it carries an error) falls through to
/// the next service. If every service yields nil, the last decision and
/// last error are returned together.
pub(super) fn run_chain(
    chain: &[Box<dyn DecisionService>],
    context: &DecisionContext<'_>,
    user: &UserContext,
    reasons: &mut DecisionReasons,
) -> (Decision, Option<DecisionCoreError>) {
    let mut last_decision = Decision::nil("NoDecision");
    let mut last_error: Option<DecisionCoreError> = None;

    for service in chain {
        let (decision, error) = service.get_decision(context, user, reasons);
        let is_nil = decision.is_nil();
        last_decision = decision;
        last_error = error;
        if !is_nil {
            return (last_decision, last_error);
        }
    }

    (last_decision, last_error)
}

/// Fixed chain `[Override, Whitelist, Bucketer]`.
pub struct CompositeExperimentService {
    chain: SmallVec<[Box<dyn DecisionService>; 3]>,
}

impl CompositeExperimentService {
    pub fn new(override_store: Arc<dyn ExperimentOverrideStore>) -> Self {
        let mut chain: SmallVec<[Box<dyn DecisionService>; 3]> = SmallVec::new();
        chain.push(Box::new(ExperimentOverrideService::new(override_store)));
        chain.push(Box::new(ExperimentWhitelistService));
        chain.push(Box::new(ExperimentBucketerService));
        CompositeExperimentService { chain }
    }
}

impl DecisionService for CompositeExperimentService {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>) {
        run_chain(&self.chain, context, user, reasons)
    }
}

/// Fixed chain `[FeatureExperimentService, RolloutService]`.
pub struct CompositeFeatureService {
    chain: SmallVec<[Box<dyn DecisionService>; 2]>,
}

impl CompositeFeatureService {
    pub fn new(override_store: Arc<dyn ExperimentOverrideStore>) -> Self {
        let experiment_composite = Arc::new(CompositeExperimentService::new(override_store));
        let mut chain: SmallVec<[Box<dyn DecisionService>; 2]> = SmallVec::new();
        chain.push(Box::new(FeatureExperimentService::new(experiment_composite)));
        chain.push(Box::new(RolloutService));
        CompositeFeatureService { chain }
    }
}

impl DecisionService for CompositeFeatureService {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>) {
        run_chain(&self.chain, context, user, reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DecisionSource;

    struct AlwaysNil;
    impl DecisionService for AlwaysNil {
        fn get_decision(
            &self,
            _context: &DecisionContext<'_>,
            _user: &UserContext,
            _reasons: &mut DecisionReasons,
        ) -> (Decision, Option<DecisionCoreError>) {
            (Decision::nil("nope"), None)
        }
    }

    struct AlwaysErrors;
    impl DecisionService for AlwaysErrors {
        fn get_decision(
            &self,
            _context: &DecisionContext<'_>,
            _user: &UserContext,
            _reasons: &mut DecisionReasons,
        ) -> (Decision, Option<DecisionCoreError>) {
            (Decision::nil("broken"), Some(DecisionCoreError::internal("boom")))
        }
    }

    struct AlwaysDecides;
    impl DecisionService for AlwaysDecides {
        fn get_decision(
            &self,
            _context: &DecisionContext<'_>,
            _user: &UserContext,
            _reasons: &mut DecisionReasons,
        ) -> (Decision, Option<DecisionCoreError>) {
            (
                Decision {
                    variation: Some(crate::model::Variation {
                        id: "v1".to_string(),
                        key: "v1".to_string(),
                        feature_enabled: true,
                        variables: Default::default(),
                    }),
                    source: DecisionSource::None,
                    experiment: None,
                    reason: "decided".to_string(),
                },
                None,
            )
        }
    }

    struct NeverCalled;
    impl DecisionService for NeverCalled {
        fn get_decision(
            &self,
            _context: &DecisionContext<'_>,
            _user: &UserContext,
            _reasons: &mut DecisionReasons,
        ) -> (Decision, Option<DecisionCoreError>) {
            panic!("should not be consulted once a prior service decided");
        }
    }

    #[test]
    fn nil_falls_through_to_next() {
        let chain: Vec<Box<dyn DecisionService>> = vec![Box::new(AlwaysNil), Box::new(AlwaysDecides)];
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = run_chain(&chain, &DecisionContext::default(), &user, &mut reasons);
        assert!(error.is_none());
        assert!(!decision.is_nil());
    }

    #[test]
    fn decision_short_circuits_remaining_services() {
        let chain: Vec<Box<dyn DecisionService>> = vec![Box::new(AlwaysDecides), Box::new(NeverCalled)];
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, _error) = run_chain(&chain, &DecisionContext::default(), &user, &mut reasons);
        assert!(!decision.is_nil());
    }

    #[test]
    fn error_falls_through_to_next() {
        let chain: Vec<Box<dyn DecisionService>> = vec![Box::new(AlwaysErrors), Box::new(AlwaysDecides)];
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = run_chain(&chain, &DecisionContext::default(), &user, &mut reasons);
        assert!(error.is_none());
        assert!(!decision.is_nil());
    }

    #[test]
    fn all_error_returns_last_decision_and_last_error() {
        let chain: Vec<Box<dyn DecisionService>> = vec![Box::new(AlwaysErrors), Box::new(AlwaysErrors)];
        let user = UserContext::new("u1");
        let mut reasons = DecisionReasons::new(true);
        let (decision, error) = run_chain(&chain, &DecisionContext::default(), &user, &mut reasons);
        assert!(decision.is_nil());
        assert!(error.is_some());
    }
}
