//! Audit event recording. [`AuditSink`] is an abstract append + query
//! capability with concrete in-memory and persistent variants; a
//! blockchain-backed sink is an external collaborator reachable through
//! the same trait.

use talos_core::DenialReason;
use time::OffsetDateTime;

/// The kind of event an [`AuditEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// A call was authorized (allowed).
    Authorization,
    /// A call was denied.
    Denial,
    /// A capability or one of its descendants was revoked.
    Revocation,
    /// A capability was delegated to a new subject.
    Delegation,
    /// A ratchet session was established.
    SessionStart,
    /// A ratchet session was torn down.
    SessionEnd,
}

/// A single recorded authorization (or lifecycle) event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuditEvent {
    /// Opaque identifier for this event, unique within a sink.
    pub event_id: String,
    /// What kind of event this is.
    pub event_type: AuditEventType,
    /// UTC timestamp the event was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The tenant (or agent) this event is attributed to.
    pub agent_id: String,
    /// The target tool name.
    pub tool: String,
    /// The target method name.
    pub method: String,
    /// The capability that authorized (or almost authorized) the call.
    pub capability_id: Option<String>,
    /// Whether the call was allowed.
    pub allowed: bool,
    /// The reason for denial, when `allowed` is false.
    pub denial_reason: Option<DenialReason>,
    /// End-to-end authorization latency, in microseconds.
    pub latency_us: u64,
    /// Hex-encoded session id, when the call was session-scoped.
    pub session_id: Option<String>,
}

/// An append + query sink for audit events.
///
/// Implementations may be in-memory (tests, local runs), a persistent
/// store, or a remote/blockchain-backed service; the gateway only ever
/// depends on this trait.
pub trait AuditSink: Send + Sync {
    /// Record `event`.
    fn append(&self, event: AuditEvent);

    /// Return up to `limit` most recent events matching `agent_id` (all
    /// agents if `None`), most recent first. Sinks with no queryable
    /// backing store may return an empty vector.
    fn query(&self, agent_id: Option<&str>, limit: usize) -> Vec<AuditEvent>;
}

/// An in-memory, bounded [`AuditSink`] for tests and local runs.
pub struct InMemoryAuditSink {
    events: parking_lot::Mutex<std::collections::VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Build a sink retaining at most `max_events` events, oldest
    /// dropped first.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: parking_lot::Mutex::new(std::collections::VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Total events currently retained.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are currently retained.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }

    fn query(&self, agent_id: Option<&str>, limit: usize) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .rev()
            .filter(|event| agent_id.map_or(true, |id| event.agent_id == id))
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Build a fresh event id from 16 random bytes, matching
/// `CapabilityManager`'s `cap_<uuid>` id style.
pub fn fresh_event_id(random_bytes: [u8; 16]) -> String {
    let uuid = uuid::Builder::from_random_bytes(random_bytes).into_uuid();
    format!("audit_{uuid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(agent_id: &str) -> AuditEvent {
        AuditEvent {
            event_id: "evt_1".to_string(),
            event_type: AuditEventType::Authorization,
            timestamp: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            agent_id: agent_id.to_string(),
            tool: "weather".to_string(),
            method: "get".to_string(),
            capability_id: Some("cap_1".to_string()),
            allowed: true,
            denial_reason: None,
            latency_us: 42,
            session_id: None,
        }
    }

    #[test]
    fn append_then_query_returns_most_recent_first() {
        let sink = InMemoryAuditSink::new(10);
        sink.append(sample_event("tenant-a"));
        let mut second = sample_event("tenant-a");
        second.event_id = "evt_2".to_string();
        sink.append(second);

        let events = sink.query(Some("tenant-a"), 10);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "evt_2");
    }

    #[test]
    fn query_filters_by_agent_id() {
        let sink = InMemoryAuditSink::new(10);
        sink.append(sample_event("tenant-a"));
        sink.append(sample_event("tenant-b"));

        assert_eq!(sink.query(Some("tenant-b"), 10).len(), 1);
        assert_eq!(sink.query(None, 10).len(), 2);
    }

    #[test]
    fn oldest_events_are_dropped_past_capacity() {
        let sink = InMemoryAuditSink::new(2);
        for i in 0..5 {
            let mut event = sample_event("tenant-a");
            event.event_id = format!("evt_{i}");
            sink.append(event);
        }
        assert_eq!(sink.len(), 2);
        let events = sink.query(None, 10);
        assert_eq!(events[0].event_id, "evt_4");
    }
}
