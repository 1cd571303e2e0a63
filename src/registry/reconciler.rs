//! Periodic reconciliation driver.
//!
//! # Responsibilities
//! - Tick on a fixed period, independent of request traffic
//! - Drive the registry's reconcile pass until shutdown
//!
//! # Design Decisions
//! - Delayed ticks coalesce instead of queueing; combined with the
//!   registry's own try-lock gate, passes never overlap

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::registry::Registry;

pub struct Reconciler {
    registry: Arc<Registry>,
    interval: Duration,
}

impl Reconciler {
    pub fn new(registry: Arc<Registry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "reconciler starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.registry.reconcile();
                }
                _ = shutdown.recv() => {
                    tracing::info!("reconciler received shutdown signal, exiting");
                    break;
                }
            }
        }
    }
}
