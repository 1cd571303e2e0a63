//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP/SIGQUIT → trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     trigger → broadcast to reconciler + both servers
//!     → stop accepting, drain in-flight requests
//!     → forced exit after the grace period
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task holds a receiver
//! - Shutdown has a timeout: tasks that fail to drain are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
