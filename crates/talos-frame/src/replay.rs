//! Replay defense: a sliding time window of accepted `(session_id,
//! correlation_id)` pairs, global to a gateway instance.

use std::collections::HashMap;

/// Tracks `(session_id, correlation_id)` pairs seen within the replay
/// window, pruning entries older than the window on every check.
///
/// Not internally synchronized; [`crate::FrameCodec`] guards access with a
/// `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct ReplayTable {
    seen: HashMap<([u8; 16], String), i64>,
}

impl ReplayTable {
    /// An empty replay table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `(session_id, correlation_id)` if not already seen within
    /// `window_seconds` of `now`. Returns `true` if this is a fresh pair
    /// (the caller should proceed), `false` if it is a replay.
    pub fn check_and_record(
        &mut self,
        session_id: [u8; 16],
        correlation_id: &str,
        now: i64,
        window_seconds: i64,
    ) -> bool {
        self.prune(now, window_seconds);
        let key = (session_id, correlation_id.to_string());
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, now);
        true
    }

    /// Number of pairs currently tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no pairs are currently tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn prune(&mut self, now: i64, window_seconds: i64) {
        self.seen.retain(|_, issued_at| now - *issued_at < window_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_pair_is_accepted() {
        let mut table = ReplayTable::new();
        assert!(table.check_and_record([1u8; 16], "corr-1", 1_000, 300));
    }

    #[test]
    fn duplicate_pair_within_window_is_rejected() {
        let mut table = ReplayTable::new();
        assert!(table.check_and_record([1u8; 16], "corr-1", 1_000, 300));
        assert!(!table.check_and_record([1u8; 16], "corr-1", 1_010, 300));
    }

    #[test]
    fn pair_outside_window_is_pruned_and_accepted_again() {
        let mut table = ReplayTable::new();
        assert!(table.check_and_record([1u8; 16], "corr-1", 1_000, 300));
        assert!(table.check_and_record([1u8; 16], "corr-1", 1_400, 300));
    }

    #[test]
    fn distinct_correlation_ids_are_independent() {
        let mut table = ReplayTable::new();
        assert!(table.check_and_record([1u8; 16], "corr-1", 1_000, 300));
        assert!(table.check_and_record([1u8; 16], "corr-2", 1_000, 300));
    }
}
