//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (atomic increments through the `metrics`
//!   facade); recording never blocks the request or heartbeat path
//! - The exporter is config-gated; with it disabled the facade's
//!   no-op recorder swallows every update

pub mod logging;
pub mod metrics;
