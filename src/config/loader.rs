//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BalancerConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BalancerConfig = toml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Semantic validation (serde handles syntactic).
fn validate_config(config: &BalancerConfig) -> Result<(), ConfigError> {
    if config.registry.reconcile_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "registry.reconcile_interval_ms must be nonzero".to_string(),
        ));
    }
    if config.registry.staleness_ms == 0 {
        return Err(ConfigError::Validation(
            "registry.staleness_ms must be nonzero".to_string(),
        ));
    }
    // A staleness bound at or below the reconcile period evicts nodes
    // faster than they can possibly heartbeat.
    if config.registry.staleness_ms <= config.registry.reconcile_interval_ms {
        return Err(ConfigError::Validation(format!(
            "registry.staleness_ms ({}) must exceed registry.reconcile_interval_ms ({})",
            config.registry.staleness_ms, config.registry.reconcile_interval_ms
        )));
    }
    if config.timeouts.request_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts.request_secs must be nonzero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn staleness_below_interval_is_rejected() {
        let mut config = BalancerConfig::default();
        config.registry.staleness_ms = 5;
        config.registry.reconcile_interval_ms = 10;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: BalancerConfig = toml::from_str("").unwrap();
        assert_eq!(config.registry.reconcile_interval_ms, 10);
        assert_eq!(config.registry.staleness_ms, 300);
        assert_eq!(config.timeouts.request_secs, 10);
        assert_eq!(config.timeouts.shutdown_grace_secs, 5);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: BalancerConfig = toml::from_str(
            r#"
            [proxy]
            bind_address = "127.0.0.1:18080"

            [registry]
            staleness_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.bind_address, "127.0.0.1:18080");
        assert_eq!(config.registry.staleness_ms, 500);
        assert_eq!(config.registry.reconcile_interval_ms, 10);
        assert_eq!(config.control.bind_address, "0.0.0.0:8000");
    }
}
