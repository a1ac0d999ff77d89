//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint schemes (ws/wss for the chain, http/https for pruntime)
//! - Validate value ranges (poll interval within timeout, block time > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DeployConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::chain::types::ClusterId;
use crate::config::schema::DeployConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_scheme(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&str],
) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', expected {}", url.scheme(), schemes.join("/")),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &DeployConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_scheme(&mut errors, "network.chain_url", &config.network.chain_url, &["ws", "wss"]);
    for url in &config.network.failover_urls {
        check_scheme(&mut errors, "network.failover_urls", url, &["ws", "wss"]);
    }
    check_scheme(
        &mut errors,
        "network.pruntime_url",
        &config.network.pruntime_url,
        &["http", "https"],
    );
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }

    if config.cluster.id.parse::<ClusterId>().is_err() {
        errors.push(ValidationError::new(
            "cluster.id",
            "must be 0x-prefixed 32-byte hex",
        ));
    }

    if config.signer.uri.trim().is_empty() {
        errors.push(ValidationError::new("signer.uri", "must not be empty"));
    }

    let polling = &config.polling;
    if polling.interval_ms == 0 {
        errors.push(ValidationError::new("polling.interval_ms", "must be > 0"));
    }
    if polling.interval_ms > polling.timeout_ms {
        errors.push(ValidationError::new(
            "polling.interval_ms",
            format!("{} exceeds timeout_ms {}", polling.interval_ms, polling.timeout_ms),
        ));
    }

    if config.devnet.block_time_ms == 0 {
        errors.push(ValidationError::new("devnet.block_time_ms", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&DeployConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DeployConfig::default();
        config.network.chain_url = "https://node".into();
        config.network.pruntime_url = "not a url".into();
        config.cluster.id = "0x1234".into();
        config.polling.interval_ms = 50_000;
        config.devnet.block_time_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "network.chain_url",
                "network.pruntime_url",
                "cluster.id",
                "polling.interval_ms",
                "devnet.block_time_ms",
            ]
        );
    }
}
