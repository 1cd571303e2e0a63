//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! balancer. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Proxy listener configuration (the data channel).
    pub proxy: ProxyConfig,

    /// Control listener configuration (the heartbeat channel).
    pub control: ControlConfig,

    /// Registry and reconciliation settings.
    pub registry: RegistryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Proxy listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind address for inbound client traffic (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Control listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Bind address for node heartbeats (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Registry and reconciliation settings.
///
/// The defaults are interoperability constants: the node agent heartbeats
/// every 10ms and expects to be evicted after 300ms of silence. Raising
/// `staleness_ms` without touching the agent only delays eviction;
/// lowering it below the agent's heartbeat period evicts live nodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Period of the reconciliation pass in milliseconds.
    pub reconcile_interval_ms: u64,

    /// Silence threshold in milliseconds; a node not heard from for this
    /// long is presumed dead.
    pub staleness_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ms: 10,
            staleness_ms: 300,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout on the proxy path in seconds.
    pub request_secs: u64,

    /// Grace period for draining in-flight requests at shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
