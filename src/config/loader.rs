//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::DeployConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Cluster id override.
pub const CLUSTER_ID_ENV_VAR: &str = "CLUSTER_ID";
/// Deployer secret override.
pub const PRIVKEY_ENV_VAR: &str = "PRIVKEY";
/// Chain WebSocket endpoint override.
pub const CHAIN_ENV_VAR: &str = "CHAIN";
/// Pruntime endpoint override.
pub const PRUNTIME_ENV_VAR: &str = "PRUNTIME";
/// Easy challenge code list override.
pub const CODE_EASY_CSV_ENV_VAR: &str = "CODE_EASY_CSV";
/// Advanced challenge code list override.
pub const CODE_ADV_CSV_ENV_VAR: &str = "CODE_ADV_CSV";
/// Artifact directory override.
pub const ARTIFACTS_DIR_ENV_VAR: &str = "ARTIFACTS_DIR";
/// Poll timeout override in milliseconds.
pub const POLL_TIMEOUT_MS_ENV_VAR: &str = "POLL_TIMEOUT_MS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value for {}: {:?}", var, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn read_file(path: &Path) -> Result<DeployConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load the effective configuration.
///
/// Order: defaults, then the TOML file if given, then `.env`, then process
/// environment variables. The result is validated once at the end.
pub fn load(path: Option<&Path>) -> Result<DeployConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => DeployConfig::default(),
    };

    match dotenvy::dotenv() {
        Ok(env_path) => tracing::debug!(path = %env_path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env"),
    }

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut DeployConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let string_overrides: [(&str, &mut String); 7] = [
        (CLUSTER_ID_ENV_VAR, &mut config.cluster.id),
        (PRIVKEY_ENV_VAR, &mut config.signer.uri),
        (CHAIN_ENV_VAR, &mut config.network.chain_url),
        (PRUNTIME_ENV_VAR, &mut config.network.pruntime_url),
        (CODE_EASY_CSV_ENV_VAR, &mut config.codes.easy_path),
        (CODE_ADV_CSV_ENV_VAR, &mut config.codes.adv_path),
        (ARTIFACTS_DIR_ENV_VAR, &mut config.artifacts.dir),
    ];
    for (var, slot) in string_overrides {
        if let Some(value) = lookup(var) {
            *slot = value;
        }
    }

    if let Some(value) = lookup(POLL_TIMEOUT_MS_ENV_VAR) {
        config.polling.timeout_ms = value.trim().parse().map_err(|_| ConfigError::Env {
            var: POLL_TIMEOUT_MS_ENV_VAR,
            value,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DeployConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("CHAIN", "ws://localhost:19944"),
                ("CODE_EASY_CSV", "/codes/easy.csv"),
                ("CODE_ADV_CSV", "/codes/adv.csv"),
                ("POLL_TIMEOUT_MS", "1500"),
            ]),
        )
        .unwrap();

        assert_eq!(config.network.chain_url, "ws://localhost:19944");
        assert_eq!(config.codes.easy_path, "/codes/easy.csv");
        assert_eq!(config.codes.adv_path, "/codes/adv.csv");
        assert_eq!(config.polling.timeout_ms, 1500);
        // untouched
        assert_eq!(config.signer.uri, "//Alice");
    }

    #[test]
    fn test_adv_codes_not_taken_from_easy_var() {
        let mut config = DeployConfig::default();
        apply_env_overrides(&mut config, lookup(&[("CODE_EASY_CSV", "/codes/easy.csv")])).unwrap();
        assert_eq!(config.codes.adv_path, "./tmp/code-adv.csv");
    }

    #[test]
    fn test_bad_poll_timeout() {
        let mut config = DeployConfig::default();
        let err = apply_env_overrides(&mut config, lookup(&[("POLL_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "POLL_TIMEOUT_MS", .. }));
    }

    #[test]
    fn test_read_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [polling]
            timeout_ms = 2000
            interval_ms = 100

            [devnet]
            block_time_ms = 50
            "#
        )
        .unwrap();

        let config = read_file(file.path()).unwrap();
        assert_eq!(config.polling.timeout_ms, 2000);
        assert_eq!(config.devnet.block_time_ms, 50);
    }

    #[test]
    fn test_file_values_are_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nchain_url = \"http://node:9944\"").unwrap();

        let config = read_file(file.path()).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "network.chain_url"));
    }
}
