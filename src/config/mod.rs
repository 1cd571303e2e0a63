//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → semantic checks (timing bounds)
//!     → BalancerConfig (validated, immutable)
//!     → shared by value with each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the dynamic state of the system is
//!   the node registry, not the config file
//! - All fields have defaults so the balancer runs with no config at all
//! - Defaults carry the timing constants the node agent is built against

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::BalancerConfig;
