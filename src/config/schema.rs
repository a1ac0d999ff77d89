//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every section
//! has defaults targeting the public PoC test network, so an empty file (or
//! no file) is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the deployer.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DeployConfig {
    /// Chain and worker endpoints.
    pub network: NetworkConfig,

    /// Signer secrets.
    pub signer: SignerConfig,

    /// Target cluster.
    pub cluster: ClusterConfig,

    /// Compiled contract artifacts.
    pub artifacts: ArtifactConfig,

    /// Redeem code lists.
    pub codes: CodeListConfig,

    /// Condition polling.
    pub polling: PollingConfig,

    /// In-process devnet parameters.
    pub devnet: DevnetConfig,

    /// End-to-end scenario inputs.
    pub scenario: ScenarioConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain and worker endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Substrate node WebSocket endpoint.
    pub chain_url: String,

    /// Failover node endpoints.
    pub failover_urls: Vec<String>,

    /// Pruntime prpc base URL.
    pub pruntime_url: String,

    /// Request timeout for remote calls in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_url: "wss://poc5.phala.network/ws".to_string(),
            failover_urls: Vec::new(),
            pruntime_url: "https://poc5.phala.network/tee-api-1".to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Signer secrets. Never logged.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SignerConfig {
    /// Deployer secret URI (`//Alice` or a hex seed).
    pub uri: String,

    /// Sudo key URI for network setup.
    pub sudo_uri: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            uri: "//Alice".to_string(),
            sudo_uri: "//Alice".to_string(),
        }
    }
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerConfig").finish_non_exhaustive()
    }
}

/// Target cluster.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Cluster id as 32-byte hex.
    pub id: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            id: format!("0x{}", "00".repeat(32)),
        }
    }
}

/// Compiled contract artifacts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding `<name>/<name>.wasm` and `<name>/metadata.json`.
    pub dir: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: "target/ink".to_string(),
        }
    }
}

/// Redeem code lists, one code per line.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CodeListConfig {
    pub easy_path: String,
    pub adv_path: String,
}

impl Default for CodeListConfig {
    fn default() -> Self {
        Self {
            easy_path: "./tmp/code-easy.csv".to_string(),
            adv_path: "./tmp/code-adv.csv".to_string(),
        }
    }
}

/// Condition polling.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    /// Give up after this many milliseconds.
    pub timeout_ms: u64,

    /// Delay between condition checks in milliseconds.
    pub interval_ms: u64,

    /// Backoff ceiling in milliseconds (equal to `interval_ms` for fixed
    /// intervals).
    pub max_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 4 * 6000,
            interval_ms: 500,
            max_interval_ms: 500,
        }
    }
}

/// In-process devnet parameters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DevnetConfig {
    /// Block production interval in milliseconds.
    pub block_time_ms: u64,

    /// Blocks between inclusion and key/registry updates.
    pub key_delay_blocks: u64,

    /// Blocks the worker trails the chain head.
    pub worker_lag_blocks: u64,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            block_time_ms: 200,
            key_delay_blocks: 2,
            worker_lag_blocks: 1,
        }
    }
}

/// End-to-end scenario inputs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Gist attested by the easy oracle.
    pub gist_url: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            gist_url: "https://gist.githubusercontent.com/h4x3rotab/4b6bb4aa8dc9956af9c976a906daaa2a/raw/80da37a6e9e91b9e3929ba284c826631644f7d1a/test".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: DeployConfig = toml::from_str("").unwrap();
        assert_eq!(config, DeployConfig::default());
        assert_eq!(config.polling.timeout_ms, 24_000);
        assert_eq!(config.signer.uri, "//Alice");
    }

    #[test]
    fn test_partial_toml() {
        let config: DeployConfig = toml::from_str(
            r#"
            [network]
            chain_url = "ws://localhost:19944"
            pruntime_url = "http://localhost:18000"

            [polling]
            timeout_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.network.chain_url, "ws://localhost:19944");
        assert_eq!(config.network.rpc_timeout_secs, 10);
        assert_eq!(config.polling.timeout_ms, 1000);
        assert_eq!(config.polling.interval_ms, 500);
    }

    #[test]
    fn test_signer_debug_redacted() {
        let signer = SignerConfig {
            uri: "0xsecret".into(),
            sudo_uri: "//Alice".into(),
        };
        assert!(!format!("{:?}", signer).contains("secret"));
    }
}
