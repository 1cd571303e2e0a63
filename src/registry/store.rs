//! The node registry: single source of truth for node liveness and the
//! currently routable address set.
//!
//! # Responsibilities
//! - Ingest heartbeats (insert-or-replace, cheap, many concurrent writers)
//! - Answer the admission gate (`has_nodes`) with one atomic read
//! - Hand the proxy a target (`next`) with one pointer read plus a short
//!   resolver lock
//! - Periodically evict stale/overloaded nodes and republish the
//!   routable set (`reconcile`)
//!
//! # Design Decisions
//! - Eviction never runs inline with ingestion or routing; it has its
//!   own cadence so liveness tracking has bounded staleness even under
//!   zero traffic
//! - Reconciliation builds a brand-new resolver and swaps the pointer;
//!   in-flight `next()` calls finish against the old instance
//! - Concurrent heartbeats for one id race last-write-wins; reports are
//!   idempotent and the next pass corrects any transient inconsistency

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::http::uri::Authority;
use dashmap::DashMap;
use serde::Serialize;

use crate::observability::metrics;
use crate::registry::resolver::Resolver;
use crate::registry::status::{Availability, AvailabilityPolicy, HealthRecord, NodeStatus};

/// Concurrent store of node health records plus the active resolver.
#[derive(Debug)]
pub struct Registry {
    /// Node id → last accepted health record.
    records: DashMap<String, HealthRecord>,

    /// The currently published routable set. Swapped wholesale by
    /// `reconcile`, appended to by `ingest`.
    resolver: ArcSwap<Resolver>,

    /// Count of entries considered live. Incremented on every heartbeat
    /// (repeats included), reset to the survivor count each pass.
    registered: AtomicU32,

    /// Keeps reconciliation passes mutually exclusive; a tick that
    /// arrives mid-pass is skipped, not queued.
    reconcile_gate: Mutex<()>,

    policy: AvailabilityPolicy,
}

/// Introspection view of one record, served by the control channel.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub address: String,
    pub active_connections: u32,
    pub max_connections: u32,
    /// Milliseconds since the last accepted heartbeat.
    pub age_ms: u64,
}

impl Registry {
    pub fn new(policy: AvailabilityPolicy) -> Self {
        Self {
            records: DashMap::new(),
            resolver: ArcSwap::from_pointee(Resolver::default()),
            registered: AtomicU32::new(0),
            reconcile_gate: Mutex::new(()),
            policy,
        }
    }

    /// Record a heartbeat.
    ///
    /// Inserts or replaces the health record for `status.id` with a
    /// fresh receipt time and makes the node immediately selectable by
    /// appending its authority to the active resolver. A status whose
    /// address does not parse is discarded with a warning.
    pub fn ingest(&self, status: NodeStatus) {
        let Some(authority) = status.authority() else {
            tracing::warn!(
                id = %status.id,
                ip = %status.ip,
                port = status.port,
                "discarding heartbeat with unparseable address"
            );
            return;
        };

        self.records.insert(
            status.id.clone(),
            HealthRecord {
                status,
                authority: authority.clone(),
                last_seen: Instant::now(),
            },
        );
        self.resolver.load().push(authority);
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Admission gate: is anything registered at all?
    pub fn has_nodes(&self) -> bool {
        self.registered.load(Ordering::Relaxed) > 0
    }

    /// Next target per the active resolver's selection rule. `None`
    /// only when the routable set is empty; callers gate on
    /// `has_nodes()` first.
    pub fn next(&self) -> Option<Authority> {
        self.resolver.load().select()
    }

    /// Evict stale and overloaded nodes and republish the routable set.
    ///
    /// Evaluates the availability policy against every held record with
    /// a single `now`, drops failures from the map, then atomically
    /// swaps in a resolver holding exactly the survivors' authorities
    /// and stores the survivor count. The sole place nodes are removed.
    ///
    /// A call that finds another pass in flight returns immediately.
    pub fn reconcile(&self) {
        let Ok(_gate) = self.reconcile_gate.try_lock() else {
            tracing::trace!("reconciliation already in flight, skipping");
            return;
        };

        let now = Instant::now();
        let mut survivors = Vec::with_capacity(self.records.len());

        self.records.retain(|id, record| {
            match self.policy.evaluate(record, now) {
                Availability::Available => {
                    survivors.push(record.authority.clone());
                    true
                }
                Availability::Overloaded => {
                    tracing::warn!(
                        id = %id,
                        address = %record.authority,
                        active = record.status.active_connections,
                        max = record.status.max_connections,
                        "evicting node: too busy"
                    );
                    metrics::record_eviction("overloaded");
                    false
                }
                Availability::Stale => {
                    tracing::warn!(
                        id = %id,
                        address = %record.authority,
                        silent_ms = now.saturating_duration_since(record.last_seen).as_millis() as u64,
                        "evicting node: no recent heartbeat"
                    );
                    metrics::record_eviction("stale");
                    false
                }
            }
        });

        let live = survivors.len();
        self.resolver.store(Arc::new(Resolver::new(survivors)));
        self.registered.store(live as u32, Ordering::Relaxed);
        metrics::record_pool_size(live);
    }

    /// Number of records currently held (live or awaiting eviction).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of all held records for introspection.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        let now = Instant::now();
        self.records
            .iter()
            .map(|entry| NodeSnapshot {
                id: entry.key().clone(),
                address: entry.authority.to_string(),
                active_connections: entry.status.active_connections,
                max_connections: entry.status.max_connections,
                age_ms: now.saturating_duration_since(entry.last_seen).as_millis() as u64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status(id: &str, port: u32, active: u32, max: u32) -> NodeStatus {
        NodeStatus {
            id: id.to_string(),
            ip: "127.0.0.1".to_string(),
            port,
            max_connections: max,
            active_connections: active,
        }
    }

    fn age_record(registry: &Registry, id: &str, age: Duration) {
        registry.records.get_mut(id).unwrap().last_seen = Instant::now() - age;
    }

    #[test]
    fn fresh_registration_is_immediately_routable() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 0, 100));

        assert!(registry.has_nodes());
        assert_eq!(registry.next().unwrap().as_str(), "127.0.0.1:9000");
    }

    #[test]
    fn repeated_heartbeat_keeps_one_record_and_refreshes_receipt() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 0, 100));
        age_record(&registry, "n1", Duration::from_millis(200));
        let first_seen = registry.records.get("n1").unwrap().last_seen;

        registry.ingest(status("n1", 9000, 3, 100));

        assert_eq!(registry.len(), 1);
        let record = registry.records.get("n1").unwrap();
        assert!(record.last_seen > first_seen);
        assert_eq!(record.status.active_connections, 3);
    }

    #[test]
    fn repeat_heartbeats_inflate_registered_count_until_reconcile() {
        // Deliberate reference-matching behavior: every heartbeat
        // increments the live count, so repeats overcount until the
        // next pass stores the true survivor count.
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 0, 100));
        registry.ingest(status("n1", 9000, 0, 100));
        registry.ingest(status("n1", 9000, 0, 100));
        assert_eq!(registry.registered.load(Ordering::Relaxed), 3);

        registry.reconcile();
        assert_eq!(registry.registered.load(Ordering::Relaxed), 1);
        assert!(registry.has_nodes());
    }

    #[test]
    fn overloaded_node_is_evicted_on_reconcile() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 60, 100));
        assert!(registry.has_nodes());

        registry.reconcile();

        assert!(!registry.has_nodes());
        assert!(registry.next().is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn silent_node_is_evicted_on_reconcile() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 0, 100));
        age_record(&registry, "n1", Duration::from_millis(350));

        registry.reconcile();

        assert!(!registry.has_nodes());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn reconcile_keeps_exactly_the_survivors() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9001, 0, 100));
        registry.ingest(status("n2", 9002, 60, 100)); // overloaded
        registry.ingest(status("n3", 9003, 0, 100));
        registry.ingest(status("n4", 9004, 0, 100));
        age_record(&registry, "n4", Duration::from_millis(400)); // stale

        registry.reconcile();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolver.load().len(), 2);
        assert_eq!(registry.registered.load(Ordering::Relaxed), 2);

        for _ in 0..100 {
            let picked = registry.next().unwrap();
            assert!(
                picked.as_str() == "127.0.0.1:9001" || picked.as_str() == "127.0.0.1:9003",
                "selected an evicted node: {picked}"
            );
        }
    }

    #[test]
    fn ingest_after_reconcile_reappears_in_routable_set() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 60, 100));
        registry.reconcile();
        assert!(!registry.has_nodes());

        // Next heartbeat reports a sane load; back in the pool at once.
        registry.ingest(status("n1", 9000, 10, 100));
        assert!(registry.has_nodes());
        assert_eq!(registry.next().unwrap().as_str(), "127.0.0.1:9000");
    }

    #[test]
    fn unparseable_address_is_discarded() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(NodeStatus {
            id: "bad".to_string(),
            ip: "definitely not an address".to_string(),
            port: 9000,
            max_connections: 100,
            active_connections: 0,
        });
        assert!(!registry.has_nodes());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn snapshot_reports_current_records() {
        let registry = Registry::new(AvailabilityPolicy::default());
        registry.ingest(status("n1", 9000, 7, 100));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "n1");
        assert_eq!(snapshot[0].address, "127.0.0.1:9000");
        assert_eq!(snapshot[0].active_connections, 7);
    }

    #[test]
    fn concurrent_heartbeats_and_reconciles_settle() {
        let registry = Arc::new(Registry::new(AvailabilityPolicy::default()));

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        registry.ingest(status(&format!("n{}", i % 10), 9000 + w, 0, 100));
                    }
                })
            })
            .collect();

        let reconciler = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    registry.reconcile();
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reconciler.join().unwrap();

        registry.reconcile();
        // All ten ids heartbeat recently with low load; all survive.
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.registered.load(Ordering::Relaxed), 10);
        assert!(registry.next().is_some());
    }
}
