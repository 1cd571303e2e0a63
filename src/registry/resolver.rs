//! Target resolution: the routable address set and the selection rule.
//!
//! # Responsibilities
//! - Hold the ordered sequence of routable authorities
//! - Pick one uniformly at random per request
//! - Accept heartbeat-time appends between reconciliation passes
//!
//! # Design Decisions
//! - Uniform random over round-robin: no shared rotation cursor on the
//!   hot path, and the availability policy already bounds per-node load
//! - A resolver instance is never rebuilt in place; reconciliation
//!   constructs a fresh one and the registry swaps the pointer

use std::sync::Mutex;

use axum::http::uri::Authority;

/// An immutable-by-convention snapshot of routable targets.
///
/// The mutex only guards the `Vec` itself; the registry replaces the
/// whole instance on reconciliation, so a lock here is held for an
/// index or a push, never across I/O.
#[derive(Debug, Default)]
pub struct Resolver {
    targets: Mutex<Vec<Authority>>,
}

impl Resolver {
    pub fn new(targets: Vec<Authority>) -> Self {
        Self {
            targets: Mutex::new(targets),
        }
    }

    /// Append one target. Used only by heartbeat ingestion; duplicates
    /// are permitted and resolved away at the next reconciliation.
    pub fn push(&self, target: Authority) {
        self.targets.lock().expect("resolver lock poisoned").push(target);
    }

    /// Choose a target uniformly at random, or `None` if the set is
    /// empty. Callers gate the empty case via the registry's node count.
    pub fn select(&self) -> Option<Authority> {
        let targets = self.targets.lock().expect("resolver lock poisoned");
        if targets.is_empty() {
            return None;
        }
        Some(targets[fastrand::usize(..targets.len())].clone())
    }

    pub fn len(&self) -> usize {
        self.targets.lock().expect("resolver lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
