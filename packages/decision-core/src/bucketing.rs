//! Deterministic user -> variation assignment via hashed traffic
//! allocation (C4).
//!
//! The bucket value is derived from the canonical 32-bit MurmurHash3 so
//! assignments match other SDK implementations of the same protocol
//! (invariant I5). Experiments that belong to a mutually-exclusive group
//! are first bucketed at the group level, using the same algorithm with
//! the group id standing in for the layer id.

use std::io::Cursor;

use crate::model::{Decision, DecisionSource, Experiment, Group, TrafficAllocationEntry, UserContext};

/// Upper bound of the bucket space. Buckets are drawn from `[0, 10000)`.
pub const MAX_TRAFFIC_VALUE: u32 = 10_000;

/// The seed the reference protocol hashes with. Fixed, not configurable:
/// changing it would silently reassign every user in the traffic pool.
const HASH_SEED: u32 = 1;

/// Stateless bucketing logic. All methods are pure functions of their
/// arguments, which is what makes I5 (cross-run, cross-machine
/// determinism) straightforward to hold.
pub struct Bucketer;

impl Bucketer {
    /// `murmur3_32(bucketing_id + layer_id, seed = 1)` mapped into
    /// `[0, 10000)`.
    pub fn bucket_value(bucketing_id: &str, layer_id: &str) -> u32 {
        let mut key = String::with_capacity(bucketing_id.len() + layer_id.len());
        key.push_str(bucketing_id);
        key.push_str(layer_id);
        let hash = Self::hash32(&key);
        // hash / 2^32 * MAX_TRAFFIC_VALUE, truncated, done in integer
        // arithmetic so the result is bit-exact regardless of platform
        // float rounding.
        ((hash as u64 * MAX_TRAFFIC_VALUE as u64) >> 32) as u32
    }

    fn hash32(input: &str) -> u32 {
        let mut cursor = Cursor::new(input.as_bytes());
        murmur3::murmur3_32(&mut cursor, HASH_SEED)
            .expect("murmur3 over an in-memory byte buffer cannot fail")
    }

    /// Walk `allocation` in order; return the entity id of the first range
    /// whose `end_of_range` exceeds `bucket_value`. `None` if the bucket
    /// falls past every range, or the selected range's entity id is empty.
    fn select_entity(bucket_value: u32, allocation: &[TrafficAllocationEntry]) -> Option<String> {
        for entry in allocation {
            if entry.end_of_range > bucket_value {
                if entry.entity_id.is_empty() {
                    return None;
                }
                return Some(entry.entity_id.clone());
            }
        }
        None
    }

    /// Bucket `user` into one of `experiment`'s variations.
    ///
    /// If `experiment` belongs to a mutually-exclusive group, `group` must
    /// be supplied (the caller looks it up by `experiment.group.group_id`
    /// from its config snapshot). The user is first bucketed at the group
    /// level; if the selected group-experiment isn't this one, the result
    /// is a nil decision, same as an ordinary bucketing miss.
    pub fn bucket(user: &UserContext, experiment: &Experiment, group: Option<&Group>) -> Decision {
        let bucketing_id = user.bucketing_id();

        if let (Some(membership), Some(group)) = (experiment.group.as_ref(), group) {
            debug_assert_eq!(membership.group_id, group.id);
            let group_bucket_value = Self::bucket_value(bucketing_id, &group.id);
            match Self::select_entity(group_bucket_value, &group.traffic_allocation) {
                Some(selected_experiment_id) if selected_experiment_id == experiment.id => {}
                _ => return Decision::nil("NotBucketedIntoVariation"),
            }
        }

        let bucket_value = Self::bucket_value(bucketing_id, &experiment.layer_id);
        match Self::select_entity(bucket_value, &experiment.traffic_allocation) {
            Some(variation_id) => match experiment.variations.get(&variation_id) {
                Some(variation) => Decision {
                    variation: Some(variation.clone()),
                    source: DecisionSource::None,
                    experiment: Some(experiment.clone()),
                    reason: "BucketedIntoVariation".to_string(),
                },
                None => Decision::nil("NotBucketedIntoVariation"),
            },
            None => Decision::nil("NotBucketedIntoVariation"),
        }
    }
}
