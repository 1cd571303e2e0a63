//! Node registry subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat received (control channel)
//!     → store.rs ingest: replace health record, append to live resolver
//!
//! Reconciliation tick (every 10ms):
//!     → reconciler.rs drives store.rs reconcile
//!     → status.rs policy evaluated per record
//!     → failing records dropped
//!     → resolver.rs instance rebuilt and atomically republished
//!
//! Proxy request:
//!     → store.rs next() → resolver.rs select() (uniform random)
//! ```
//!
//! # Design Decisions
//! - Ingestion is additive: a node is selectable the instant its first
//!   heartbeat lands, without waiting for a reconciliation pass
//! - Eviction happens only in the reconciliation pass, never inline on
//!   the request path
//! - The resolver is replaced wholesale, not mutated, so request-path
//!   readers always see a complete address list

pub mod reconciler;
pub mod resolver;
pub mod status;
pub mod store;

pub use reconciler::Reconciler;
pub use resolver::Resolver;
pub use status::{Availability, AvailabilityPolicy, HealthRecord, NodeStatus};
pub use store::{NodeSnapshot, Registry};
