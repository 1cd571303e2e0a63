//! Node status reports and the availability policy.
//!
//! # Responsibilities
//! - Define the heartbeat payload (`NodeStatus`)
//! - Hold one node's last report plus its local receipt time
//! - Decide whether a node may receive traffic

use std::time::{Duration, Instant};

use axum::http::uri::Authority;
use serde::{Deserialize, Serialize};

/// Self-reported status of one backend node, received over the control
/// channel. Each report supersedes the previous one for the same id
/// wholesale; fields are never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Opaque node identifier, stable for the node's process lifetime.
    pub id: String,
    /// IP address the node serves HTTP on.
    pub ip: String,
    /// Port the node serves HTTP on.
    pub port: u32,
    /// Declared maximum concurrent-connection capacity.
    pub max_connections: u32,
    /// Currently active connections as of this report.
    pub active_connections: u32,
}

impl NodeStatus {
    /// The node's routable `host:port` authority, if its reported
    /// address parses.
    pub fn authority(&self) -> Option<Authority> {
        format!("{}:{}", self.ip, self.port).parse().ok()
    }
}

/// One node's last report plus the instant the registry received it.
///
/// `last_seen` is stamped by the registry, not the node; clock skew on
/// the node side cannot break staleness tracking.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    pub status: NodeStatus,
    /// Routable authority, parsed once at ingestion.
    pub authority: Authority,
    pub last_seen: Instant,
}

/// Verdict of the availability policy for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// May receive traffic.
    Available,
    /// At or above half of declared capacity.
    Overloaded,
    /// Silent for longer than the staleness threshold.
    Stale,
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Pure predicate deciding whether a node may receive traffic.
///
/// A record is available iff the node reports fewer active connections
/// than half its declared capacity AND its last heartbeat is younger
/// than `max_silence`. Both bounds are re-evaluated from scratch on
/// every reconciliation tick; there is no hysteresis.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityPolicy {
    /// A node silent for this long is presumed dead.
    pub max_silence: Duration,
}

impl AvailabilityPolicy {
    pub fn new(max_silence: Duration) -> Self {
        Self { max_silence }
    }

    /// Evaluate one record against `now`.
    pub fn evaluate(&self, record: &HealthRecord, now: Instant) -> Availability {
        let status = &record.status;
        if status.active_connections >= status.max_connections / 2 {
            return Availability::Overloaded;
        }
        if now.saturating_duration_since(record.last_seen) >= self.max_silence {
            return Availability::Stale;
        }
        Availability::Available
    }
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(active: u32, max: u32, age: Duration) -> HealthRecord {
        let status = NodeStatus {
            id: "n1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9000,
            max_connections: max,
            active_connections: active,
        };
        let authority = status.authority().unwrap();
        HealthRecord {
            status,
            authority,
            last_seen: Instant::now() - age,
        }
    }

    #[test]
    fn fresh_idle_node_is_available() {
        let policy = AvailabilityPolicy::default();
        let rec = record(0, 100, Duration::ZERO);
        assert_eq!(policy.evaluate(&rec, Instant::now()), Availability::Available);
    }

    #[test]
    fn load_bound_is_half_capacity_inclusive() {
        let policy = AvailabilityPolicy::default();
        let now = Instant::now();

        // 49 of 100 is still routable, 50 is not.
        let under = record(49, 100, Duration::ZERO);
        assert_eq!(policy.evaluate(&under, now), Availability::Available);

        let at = record(50, 100, Duration::ZERO);
        assert_eq!(policy.evaluate(&at, now), Availability::Overloaded);

        let over = record(60, 100, Duration::ZERO);
        assert_eq!(policy.evaluate(&over, now), Availability::Overloaded);
    }

    #[test]
    fn half_capacity_uses_integer_division() {
        let policy = AvailabilityPolicy::default();
        let now = Instant::now();

        // max = 5 gives a threshold of 2
        assert_eq!(
            policy.evaluate(&record(1, 5, Duration::ZERO), now),
            Availability::Available
        );
        assert_eq!(
            policy.evaluate(&record(2, 5, Duration::ZERO), now),
            Availability::Overloaded
        );
    }

    #[test]
    fn zero_capacity_node_is_never_available() {
        let policy = AvailabilityPolicy::default();
        assert_eq!(
            policy.evaluate(&record(0, 0, Duration::ZERO), Instant::now()),
            Availability::Overloaded
        );
    }

    #[test]
    fn silent_node_goes_stale_at_threshold() {
        let policy = AvailabilityPolicy::default();

        let fresh = record(0, 100, Duration::from_millis(299));
        assert_eq!(policy.evaluate(&fresh, Instant::now()), Availability::Available);

        let stale = record(0, 100, Duration::from_millis(300));
        assert_eq!(policy.evaluate(&stale, Instant::now()), Availability::Stale);

        let long_gone = record(0, 100, Duration::from_millis(350));
        assert_eq!(policy.evaluate(&long_gone, Instant::now()), Availability::Stale);
    }

    #[test]
    fn overload_is_reported_before_staleness() {
        // A node that is both silent and busy reports as overloaded;
        // the ordering matches the eviction log lines.
        let policy = AvailabilityPolicy::default();
        let rec = record(80, 100, Duration::from_millis(400));
        assert_eq!(policy.evaluate(&rec, Instant::now()), Availability::Overloaded);
    }

    #[test]
    fn authority_parses_ip_and_port() {
        let status = NodeStatus {
            id: "n1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9000,
            max_connections: 100,
            active_connections: 0,
        };
        assert_eq!(status.authority().unwrap().as_str(), "127.0.0.1:9000");
    }

    #[test]
    fn garbage_address_yields_no_authority() {
        let status = NodeStatus {
            id: "n1".to_string(),
            ip: "not an ip at all".to_string(),
            port: 9000,
            max_connections: 100,
            active_connections: 0,
        };
        assert!(status.authority().is_none());
    }
}
