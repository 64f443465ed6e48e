//! Experiment override store: a read-mostly map consulted on the
//! decision hot path and mutated rarely by whoever owns overrides.
//!
//! A single read/write lock guards the map: readers (the decision path)
//! acquire shared access, mutators acquire exclusive access. This matches
//! the concurrency model's requirement that the store remain consistent
//! under concurrent mutation during decisions, without paying a `Mutex`'s
//! reader-reader contention cost on the hot path.

use std::collections::HashMap;
use std::sync::RwLock;

/// Key identifying one user's forced override for one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentOverrideKey {
    pub experiment_key: String,
    pub user_id: String,
}

impl ExperimentOverrideKey {
    pub fn new(experiment_key: impl Into<String>, user_id: impl Into<String>) -> Self {
        ExperimentOverrideKey {
            experiment_key: experiment_key.into(),
            user_id: user_id.into(),
        }
    }
}

/// Read side of the override store, consumed by
/// [`ExperimentOverrideService`](crate::decision::override_service::ExperimentOverrideService).
pub trait ExperimentOverrideStore: Send + Sync {
    /// Look up the forced variation key for `key`, if any has been set.
    fn get_variation(&self, key: &ExperimentOverrideKey) -> Option<String>;
}

/// Write side, used by whoever owns override administration (not on the
/// decision hot path).
pub trait ExperimentOverrideWriter: Send + Sync {
    fn set_variation(&self, key: ExperimentOverrideKey, variation_key: String);
    fn remove_variation(&self, key: &ExperimentOverrideKey);
}

/// Default in-memory implementation backed by a single `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    data: RwLock<HashMap<ExperimentOverrideKey, String>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        InMemoryOverrideStore {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl ExperimentOverrideStore for InMemoryOverrideStore {
    fn get_variation(&self, key: &ExperimentOverrideKey) -> Option<String> {
        self.data
            .read()
            .expect("override store lock poisoned")
            .get(key)
            .cloned()
    }
}

impl ExperimentOverrideWriter for InMemoryOverrideStore {
    fn set_variation(&self, key: ExperimentOverrideKey, variation_key: String) {
        self.data
            .write()
            .expect("override store lock poisoned")
            .insert(key, variation_key);
    }

    fn remove_variation(&self, key: &ExperimentOverrideKey) {
        self.data
            .write()
            .expect("override store lock poisoned")
            .remove(key);
    }
}
