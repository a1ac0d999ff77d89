//! The `deploy` runner against each target.

use std::fs;
use std::path::Path;

use badge_deployer::chain::types::blake2_256;
use badge_deployer::chain::ChainError;
use badge_deployer::cli::{self, Target};
use badge_deployer::config::schema::{NetworkConfig, PollingConfig};
use badge_deployer::{DeployConfig, Error};

mod common;

fn config(dir: &Path) -> DeployConfig {
    common::write_artifacts(dir);
    fs::write(dir.join("easy.csv"), "easy1\neasy2\n").unwrap();
    fs::write(dir.join("adv.csv"), "adv1\n").unwrap();

    let mut config = DeployConfig::default();
    config.network = NetworkConfig {
        chain_url: "ws://127.0.0.1:1".into(),
        pruntime_url: "http://127.0.0.1:1".into(),
        rpc_timeout_secs: 1,
        ..NetworkConfig::default()
    };
    config.artifacts.dir = dir.display().to_string();
    config.codes.easy_path = dir.join("easy.csv").display().to_string();
    config.codes.adv_path = dir.join("adv.csv").display().to_string();
    config.polling = PollingConfig {
        timeout_ms: 10_000,
        interval_ms: 50,
        max_interval_ms: 50,
    };
    config.devnet = common::devnet_config();
    config
}

#[tokio::test]
async fn test_live_deploy_fails_on_unreachable_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let err = cli::deploy(&config, Target::Live).await.unwrap_err();
    assert!(matches!(err, Error::Chain(ChainError::Rpc(_))), "{:?}", err);
}

#[tokio::test(start_paused = true)]
async fn test_devnet_deploy_reports_the_connected_worker() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let report = cli::deploy(&config, Target::Devnet).await.unwrap();
    assert_eq!(
        report.connected_worker,
        hex::encode(blake2_256(b"devnet-worker-0"))
    );
    let contracts = report.contracts;
    assert_ne!(contracts.fat_badges, contracts.easy_oracle);
    assert_ne!(contracts.easy_oracle, contracts.advanced_judger);
}
