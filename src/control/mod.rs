//! Control channel subsystem.
//!
//! # Data Flow
//! ```text
//! node agent ──POST /v1/status──▶ server.rs ──ingest──▶ registry
//!                                    │
//! operator  ──GET /v1/nodes────────▶ │ (registry snapshot)
//! probe     ──GET /v1/health───────▶ │ (liveness)
//! ```
//!
//! # Design Decisions
//! - The channel is HTTP/JSON on its own listener, separate from the
//!   data channel, so heartbeat traffic never competes with proxied
//!   requests for the accept loop
//! - A conforming heartbeat is always acknowledged with an empty
//!   success; nodes treat any transport failure as "not recorded,
//!   retry next tick"
//! - No authentication: the control listener is expected to be bound
//!   on a trusted interface

pub mod server;

pub use server::ControlServer;
