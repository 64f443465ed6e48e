//! Reserved `$opt_*` user-attribute keys.
//!
//! These are recognized by name rather than routed through a
//! datafile-assigned attribute id, and are always eligible for event
//! serialization regardless of whether they appear in `AttributeKeyToIDMap`.

pub const RESERVED_PREFIX: &str = "$opt_";

/// Overrides the bucketing key used by the bucketer in place of
/// `UserContext.id`.
pub const BUCKETING_ID: &str = "$opt_bucketing_id";

/// Carried through to event attributes; consumed by downstream analytics,
/// not interpreted by decision-core itself.
pub const USER_AGENT: &str = "$opt_user_agent";

/// A precomputed experiment-id -> variation-id map a caller may supply to
/// bypass bucketing for specific experiments. Carried through to event
/// attributes; not consumed by decision-core's bucketer.
pub const EXPERIMENT_BUCKET_MAP: &str = "$opt_experiment_bucket_map";

/// True if `key` is a reserved attribute by virtue of its prefix.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}
