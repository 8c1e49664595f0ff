//! Hierarchical scope matching: `tool:<T>/method:<M>`, `/`-segmented and
//! prefix-matched. The cached fast path additionally honors `:*` wildcard
//! segments; the slow, signature-verifying path does not, so a
//! self-signed capability can't widen its own matching by embedding a
//! literal `:*` in a scope segment.

/// Does `capability_scope` cover `requested_scope` under plain segment
/// equality?
///
/// `capability_scope` must have no more segments than `requested_scope`,
/// and each of its segments must equal the corresponding segment of
/// `requested_scope` exactly. Used by the slow, signature-verifying path.
pub fn scope_covers(capability_scope: &str, requested_scope: &str) -> bool {
    let cap_parts: Vec<&str> = capability_scope.split('/').collect();
    let req_parts: Vec<&str> = requested_scope.split('/').collect();
    if cap_parts.len() > req_parts.len() {
        return false;
    }
    cap_parts
        .iter()
        .zip(req_parts.iter())
        .all(|(cap_seg, req_seg)| cap_seg == req_seg)
}

/// Does `capability_scope` cover `requested_scope`, honoring `:*` wildcard
/// segments?
///
/// Same prefix-matching rule as [`scope_covers`], except a capability
/// segment ending in `:*` matches any request segment prefixed by the part
/// before `:*`. Used only by the cached fast path, against facts already
/// established when the capability was verified and cached.
pub fn scope_covers_wildcard(capability_scope: &str, requested_scope: &str) -> bool {
    let cap_parts: Vec<&str> = capability_scope.split('/').collect();
    let req_parts: Vec<&str> = requested_scope.split('/').collect();
    if cap_parts.len() > req_parts.len() {
        return false;
    }
    cap_parts
        .iter()
        .zip(req_parts.iter())
        .all(|(cap_seg, req_seg)| segment_covers(cap_seg, req_seg))
}

fn segment_covers(cap_seg: &str, req_seg: &str) -> bool {
    match cap_seg.strip_suffix(":*") {
        Some(prefix) => req_seg.starts_with(prefix),
        None => cap_seg == req_seg,
    }
}

/// Build the scope string for a `(tool, method)` pair:
/// `scope = "tool:<tool>/method:<method>"`.
pub fn tool_method_scope(tool: &str, method: &str) -> String {
    format!("tool:{tool}/method:{method}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_scope_covers_itself() {
        assert!(scope_covers("tools/call", "tools/call"));
    }

    #[test]
    fn prefix_covers_longer_scope() {
        assert!(scope_covers("tools", "tools/filesystem/read"));
    }

    #[test]
    fn does_not_cover_sibling_scope() {
        assert!(!scope_covers(
            "tool:weather/method:get",
            "tool:weather/method:set"
        ));
    }

    #[test]
    fn longer_capability_never_covers_shorter_request() {
        assert!(!scope_covers("tools/filesystem/read", "tools"));
    }

    #[test]
    fn wildcard_segment_matches_prefixed_request_segment() {
        assert!(scope_covers_wildcard(
            "tool:weather:*/method:get",
            "tool:weather-eu/method:get"
        ));
        assert!(!scope_covers_wildcard(
            "tool:weather:*/method:get",
            "tool:ocean/method:get"
        ));
    }

    #[test]
    fn plain_scope_covers_does_not_honor_wildcard_suffix() {
        // A literal `:*` segment in a self-signed scope is just a string;
        // the slow path never treats it as a wildcard.
        assert!(!scope_covers(
            "tool:weather:*/method:get",
            "tool:weather-eu/method:get"
        ));
        assert!(scope_covers("tool:weather:*/method:get", "tool:weather:*/method:get"));
    }
}
