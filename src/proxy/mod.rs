//! Reverse-proxy subsystem (the data channel).
//!
//! # Data Flow
//! ```text
//! client request
//!     → server.rs (catch-all route, timeout + trace layers)
//!     → admission.rs (empty pool? synthetic 503, no network I/O)
//!     → director.rs (pick target, rewrite scheme + authority)
//!     → outbound client → backend node
//!     → response streamed back unchanged
//! ```
//!
//! # Design Decisions
//! - The admission check is one atomic read; the hot path touches no
//!   lock beyond the resolver's brief index lock
//! - Pure address substitution: no retries, no failover, no per-node
//!   failure bookkeeping — an unhealthy node leaves the pool via the
//!   reconciler, not via the request path

pub mod admission;
pub mod director;
pub mod server;

pub use admission::AdmissionGate;
pub use director::Director;
pub use server::ProxyServer;
