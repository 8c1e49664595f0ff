//! Capability constraints: a closed enumeration of recognized keys plus an
//! "ignore unknown" forward-compatibility rule.

use std::collections::BTreeMap;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::CapabilityError;

/// A recognized (or opaque-but-preserved) constraint value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    /// Glob patterns a `params.path` must match at least one of.
    Paths(Vec<String>),
    /// Tool names a `params.name` must be a member of.
    AllowedTools(Vec<String>),
    /// `"<N>/<period>"` rate limit, e.g. `"100/minute"`. Not enforced by
    /// the constraint checker itself (the gateway's `RateLimiter` owns
    /// enforcement); carried here so it narrows under delegation.
    RateLimit(String),
    /// An unrecognized key's value, preserved opaquely for canonicalization
    /// and forward compatibility.
    Other(serde_json::Value),
}

/// The constraints attached to a capability: an ordered map from key to
/// [`ConstraintValue`]. Ordering (via `BTreeMap`) matches the canonical
/// encoding's sorted-key requirement.
pub type Constraints = BTreeMap<String, ConstraintValue>;

/// The subset of a tool call's parameters the constraint checker cares
/// about, extracted by the caller from the MCP request.
#[derive(Debug, Clone, Default)]
pub struct AuthParams {
    /// The path a filesystem-shaped tool call operates on, if any.
    pub path: Option<String>,
    /// The tool name a call targets, if any (distinct from the frame's
    /// `tool` field when a capability's `allowed_tools` constrains a
    /// dispatch-style tool such as `tools/call`).
    pub name: Option<String>,
}

/// Check `params` against `constraints`. Unrecognized keys are ignored. A
/// recognized key is only enforced when the matching `params` field is
/// present; if the caller never supplied that field, the constraint is
/// skipped rather than treated as a denial.
pub fn check_constraints(constraints: &Constraints, params: &AuthParams) -> bool {
    for (key, value) in constraints {
        let ok = match (key.as_str(), value) {
            ("paths", ConstraintValue::Paths(patterns)) => match &params.path {
                Some(path) => patterns
                    .iter()
                    .filter_map(|p| Pattern::new(p).ok())
                    .any(|p| p.matches(path)),
                None => true,
            },
            ("allowed_tools", ConstraintValue::AllowedTools(tools)) => match &params.name {
                Some(name) => tools.iter().any(|t| t == name),
                None => true,
            },
            // `rate_limit` is enforced by the gateway's RateLimiter, not here.
            ("rate_limit", ConstraintValue::RateLimit(_)) => true,
            // Unrecognized key: forward-compatible no-op.
            _ => true,
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Overlay `narrowed` onto `parent`, enforcing "additions-only, never
/// looser": a delegated capability may restrict further but never widen
/// what its parent already allows.
///
/// - A key present only in `narrowed` is an additional restriction: kept
///   as-is.
/// - A key present in both must narrow: `paths`/`allowed_tools` lists must
///   be subsets of the parent's; `rate_limit` values are compared
///   numerically and must not exceed the parent's rate.
/// - A type mismatch on a shared key (e.g. `paths` narrowed into
///   `allowed_tools`) is `DelegationInvalid`.
pub fn narrow(parent: &Constraints, narrowed: &Constraints) -> Result<Constraints, CapabilityError> {
    let mut result = parent.clone();
    for (key, new_value) in narrowed {
        match result.get(key) {
            None => {
                result.insert(key.clone(), new_value.clone());
            }
            Some(existing) => {
                let merged = narrow_value(key, existing, new_value)?;
                result.insert(key.clone(), merged);
            }
        }
    }
    Ok(result)
}

fn narrow_value(
    key: &str,
    existing: &ConstraintValue,
    narrowed: &ConstraintValue,
) -> Result<ConstraintValue, CapabilityError> {
    match (existing, narrowed) {
        (ConstraintValue::Paths(parent_list), ConstraintValue::Paths(child_list)) => {
            if child_list.iter().all(|c| parent_list.contains(c)) {
                Ok(ConstraintValue::Paths(child_list.clone()))
            } else {
                Err(CapabilityError::DelegationInvalid(format!(
                    "narrowed '{key}' paths are not a subset of the parent's"
                )))
            }
        }
        (ConstraintValue::AllowedTools(parent_list), ConstraintValue::AllowedTools(child_list)) => {
            if child_list.iter().all(|c| parent_list.contains(c)) {
                Ok(ConstraintValue::AllowedTools(child_list.clone()))
            } else {
                Err(CapabilityError::DelegationInvalid(format!(
                    "narrowed '{key}' tools are not a subset of the parent's"
                )))
            }
        }
        (ConstraintValue::RateLimit(parent_rate), ConstraintValue::RateLimit(child_rate)) => {
            match (parse_rate(parent_rate), parse_rate(child_rate)) {
                (Some(p), Some(c)) if c <= p => Ok(ConstraintValue::RateLimit(child_rate.clone())),
                _ => Err(CapabilityError::DelegationInvalid(format!(
                    "narrowed '{key}' rate {child_rate} is not <= parent's {parent_rate}"
                ))),
            }
        }
        _ => Err(CapabilityError::DelegationInvalid(format!(
            "narrowed constraint '{key}' changes type"
        ))),
    }
}

/// Parse a `"<N>/<period>"` rate-limit string into requests-per-second,
/// for narrowing comparisons only (the gateway owns real enforcement).
fn parse_rate(rate: &str) -> Option<f64> {
    let (count, period) = rate.split_once('/')?;
    let count: f64 = count.parse().ok()?;
    let seconds = match period {
        "second" | "sec" | "s" => 1.0,
        "minute" | "min" | "m" => 60.0,
        "hour" | "h" => 3600.0,
        _ => return None,
    };
    Some(count / seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_constraint_matches_glob() {
        let mut constraints = Constraints::new();
        constraints.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string()]),
        );
        let params = AuthParams {
            path: Some("/data/file.txt".to_string()),
            name: None,
        };
        assert!(check_constraints(&constraints, &params));
    }

    #[test]
    fn paths_constraint_rejects_non_matching_path() {
        let mut constraints = Constraints::new();
        constraints.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string()]),
        );
        let params = AuthParams {
            path: Some("/etc/passwd".to_string()),
            name: None,
        };
        assert!(!check_constraints(&constraints, &params));
    }

    #[test]
    fn paths_constraint_is_skipped_when_path_param_absent() {
        let mut constraints = Constraints::new();
        constraints.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string()]),
        );
        assert!(check_constraints(&constraints, &AuthParams::default()));
    }

    #[test]
    fn allowed_tools_constraint_is_skipped_when_name_param_absent() {
        let mut constraints = Constraints::new();
        constraints.insert(
            "allowed_tools".to_string(),
            ConstraintValue::AllowedTools(vec!["weather".to_string()]),
        );
        assert!(check_constraints(&constraints, &AuthParams::default()));
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut constraints = Constraints::new();
        constraints.insert(
            "future_feature".to_string(),
            ConstraintValue::Other(serde_json::json!("anything")),
        );
        assert!(check_constraints(&constraints, &AuthParams::default()));
    }

    #[test]
    fn narrowing_requires_subset() {
        let mut parent = Constraints::new();
        parent.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string(), "/tmp/*".to_string()]),
        );
        let mut narrower = Constraints::new();
        narrower.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string()]),
        );
        assert!(narrow(&parent, &narrower).is_ok());

        let mut wider = Constraints::new();
        wider.insert(
            "paths".to_string(),
            ConstraintValue::Paths(vec!["/data/*".to_string(), "/etc/*".to_string()]),
        );
        assert!(narrow(&parent, &wider).is_err());
    }

    #[test]
    fn new_key_is_an_additional_restriction() {
        let parent = Constraints::new();
        let mut narrower = Constraints::new();
        narrower.insert(
            "allowed_tools".to_string(),
            ConstraintValue::AllowedTools(vec!["weather".to_string()]),
        );
        let merged = narrow(&parent, &narrower).unwrap();
        assert_eq!(merged.len(), 1);
    }
}
