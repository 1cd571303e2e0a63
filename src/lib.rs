//! Heartbeat-driven HTTP load balancer library.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                 BALANCER                      │
//!                          │                                               │
//!   node heartbeats        │  ┌──────────┐        ┌──────────────────┐    │
//!   ──────────────────────▶│  │ control  │───────▶│     registry      │    │
//!   (POST /v1/status)      │  │ endpoint │ ingest │  id → record map  │    │
//!                          │  └──────────┘        │  + resolver swap  │    │
//!                          │                      └───────┬──▲────────┘    │
//!                          │                       next() │  │ reconcile   │
//!                          │                              │  │ (10ms tick) │
//!   client request         │  ┌──────────┐  ┌──────────┐  │  │             │
//!   ──────────────────────▶│  │admission │─▶│ director │◀─┘  │             │
//!                          │  │  gate    │  │ rewrite  │     │             │
//!   client response        │  └────┬─────┘  └────┬─────┘  ┌──┴─────────┐  │
//!   ◀──────────────────────┼───────┘             └───────▶│ reconciler │  │
//!                          │   503 when pool     forward  └────────────┘  │
//!                          │   is empty          to node                   │
//!                          └──────────────────────────────────────────────┘
//! ```
//!
//! Nodes self-report identity, address, capacity, and current load over
//! the control channel. The registry keeps one health record per node id
//! and republishes the routable address set on every reconciliation pass,
//! evicting nodes that went silent or crossed half of their declared
//! capacity. The proxy path reads a single atomic pointer per request.

// Core subsystems
pub mod config;
pub mod control;
pub mod proxy;
pub mod registry;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::BalancerConfig;
pub use lifecycle::Shutdown;
pub use registry::{NodeStatus, Registry};
