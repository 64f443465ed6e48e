//! Typed attribute matchers (C5), keyed by the `match` string on a
//! condition leaf.
//!
//! Each matcher is a pure function from `(actual attribute, expected
//! value)` to a three-valued result: `Some(true)`, `Some(false)`, or
//! `None` meaning unknown (missing attribute or a type mismatch that
//! can't be compared). Matchers never error; a missing *matcher* is the
//! registry's concern, not an individual matcher's.

use crate::model::AttributeValue;

pub type MatcherFn = fn(Option<&AttributeValue>, &AttributeValue) -> Option<bool>;

/// Look up a matcher by its `match` string. `None` if no matcher is
/// registered for `kind` — callers should treat that as an error, not an
/// unknown result.
pub fn lookup(kind: &str) -> Option<MatcherFn> {
    match kind {
        "exists" => Some(exists),
        "exact" => Some(exact),
        "substring" => Some(substring),
        "gt" => Some(gt),
        "ge" => Some(ge),
        "lt" => Some(lt),
        "le" => Some(le),
        "semver_eq" => Some(semver_eq),
        "semver_gt" => Some(semver_gt),
        "semver_ge" => Some(semver_ge),
        "semver_lt" => Some(semver_lt),
        "semver_le" => Some(semver_le),
        "qualified" => Some(qualified),
        _ => None,
    }
}

fn exists(actual: Option<&AttributeValue>, _expected: &AttributeValue) -> Option<bool> {
    Some(matches!(actual, Some(v) if !v.is_null()))
}

fn exact(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    let actual = actual?;
    if actual.is_null() {
        return None;
    }
    match (actual.as_finite_f64(), expected.as_finite_f64()) {
        (Some(a), Some(e)) => return Some(a == e),
        _ => {}
    }
    match (actual, expected) {
        (AttributeValue::String(a), AttributeValue::String(e)) => Some(a == e),
        (AttributeValue::Bool(a), AttributeValue::Bool(e)) => Some(a == e),
        _ => None,
    }
}

fn substring(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    let actual = actual?.as_str()?;
    let expected = expected.as_str()?;
    Some(actual.contains(expected))
}

fn numeric_cmp(
    actual: Option<&AttributeValue>,
    expected: &AttributeValue,
    cmp: impl Fn(f64, f64) -> bool,
) -> Option<bool> {
    let a = actual?.as_finite_f64()?;
    let e = expected.as_finite_f64()?;
    Some(cmp(a, e))
}

fn gt(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    numeric_cmp(actual, expected, |a, e| a > e)
}

fn ge(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    numeric_cmp(actual, expected, |a, e| a >= e)
}

fn lt(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    numeric_cmp(actual, expected, |a, e| a < e)
}

fn le(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    numeric_cmp(actual, expected, |a, e| a <= e)
}

/// Split a version string into dot-separated components, comparing each
/// numerically when both sides parse as integers and lexicographically
/// otherwise (a pre-release suffix like "1.0.0-beta" compares its last
/// component as a string).
fn semver_components(version: &str) -> Vec<String> {
    version.split('.').map(|s| s.to_string()).collect()
}

fn semver_cmp(actual: &str, expected: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let a = semver_components(actual);
    let e = semver_components(expected);
    for i in 0..a.len().max(e.len()) {
        let ac = a.get(i).map(String::as_str).unwrap_or("0");
        let ec = e.get(i).map(String::as_str).unwrap_or("0");
        let ordering = match (ac.parse::<u64>(), ec.parse::<u64>()) {
            (Ok(an), Ok(en)) => an.cmp(&en),
            _ => ac.cmp(ec),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn semver_match(
    actual: Option<&AttributeValue>,
    expected: &AttributeValue,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Option<bool> {
    let actual = actual?.as_str()?;
    let expected = expected.as_str()?;
    Some(accept(semver_cmp(actual, expected)))
}

fn semver_eq(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    semver_match(actual, expected, |o| o.is_eq())
}

fn semver_gt(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    semver_match(actual, expected, |o| o.is_gt())
}

fn semver_ge(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    semver_match(actual, expected, |o| o.is_ge())
}

fn semver_lt(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    semver_match(actual, expected, |o| o.is_lt())
}

fn semver_le(actual: Option<&AttributeValue>, expected: &AttributeValue) -> Option<bool> {
    semver_match(actual, expected, |o| o.is_le())
}

/// `qualified` is special: the "actual" side isn't a user attribute at
/// all, it's membership in `UserContext.qualified_segments`. The caller
/// (the leaf evaluator) passes that membership in as a bool disguised as
/// an `AttributeValue::Bool` so this matcher can share the same
/// `MatcherFn` signature as every other matcher.
fn qualified(actual: Option<&AttributeValue>, _expected: &AttributeValue) -> Option<bool> {
    actual.and_then(|v| v.as_bool())
}
