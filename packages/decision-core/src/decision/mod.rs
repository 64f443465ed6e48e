//! Per-layer decision services (C6) and the fixed-order composites that
//! chain them (C7).
//!
//! Every service shares one contract: given a context (which experiment,
//! feature, and group the decision concerns) and a user, produce a
//! decision plus an optional error, appending reasoning to a shared
//! accumulator along the way. The composite chains use that pairing to
//! implement fallthrough-on-nil-or-error with short-circuit-on-hit: see
//! [`composite`].

pub mod bucketer_service;
pub mod composite;
pub mod feature_experiment_service;
pub mod override_service;
pub mod rollout_service;
pub mod whitelist_service;

use crate::error::DecisionCoreError;
use crate::model::{Decision, Experiment, Feature, Group, UserContext};
use crate::reasons::DecisionReasons;

/// What a decision service is being asked to decide against. Not every
/// service needs every field: `ExperimentOverrideService` only reads
/// `experiment`, `RolloutService` only reads `feature`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionContext<'a> {
    pub experiment: Option<&'a Experiment>,
    pub feature: Option<&'a Feature>,
    pub group: Option<&'a Group>,
}

impl<'a> DecisionContext<'a> {
    pub fn for_experiment(experiment: &'a Experiment, group: Option<&'a Group>) -> Self {
        DecisionContext {
            experiment: Some(experiment),
            feature: None,
            group,
        }
    }

    pub fn for_feature(feature: &'a Feature, group: Option<&'a Group>) -> Self {
        DecisionContext {
            experiment: None,
            feature: Some(feature),
            group,
        }
    }
}

/// A single-operation capability: decide against a context and a user.
///
/// Decision services never panic. They report failure through the
/// `Option<DecisionCoreError>` half of the return pair rather than
/// propagating a `Result`, because a composite chain needs to keep the
/// last decision *and* the last error together when every layer fails —
/// a plain `Result` can't carry both at once.
pub trait DecisionService: Send + Sync {
    fn get_decision(
        &self,
        context: &DecisionContext<'_>,
        user: &UserContext,
        reasons: &mut DecisionReasons,
    ) -> (Decision, Option<DecisionCoreError>);
}
