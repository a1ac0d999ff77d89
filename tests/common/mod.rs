//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use badge_deployer::artifacts::loader::load_artifacts;
use badge_deployer::artifacts::ArtifactSet;
use badge_deployer::chain::{CodeHash, Wallet};
use badge_deployer::config::schema::DevnetConfig;
use badge_deployer::contracts::gist::claim_for;
use badge_deployer::contracts::ContractKind;
use badge_deployer::devnet::{Devnet, DevnetBuilder};
use badge_deployer::resilience::PollPolicy;
use badge_deployer::DeployContext;
use serde_json::json;
use tempfile::TempDir;

pub const GIST_URL: &str = "https://gist.githubusercontent.com/h4x3rotab/4b6bb4aa8dc9956af9c976a906daaa2a/raw/80da37a6e9e91b9e3929ba284c826631644f7d1a/test";

/// Write a wasm blob and matching ink! metadata for every contract.
pub fn write_artifacts(dir: &Path) {
    for (i, kind) in ContractKind::ALL.into_iter().enumerate() {
        let base = dir.join(kind.file_stem());
        fs::create_dir_all(&base).unwrap();

        let wasm = format!("\0asm-{}", kind.file_stem()).into_bytes();
        let metadata = json!({
            "source": { "hash": CodeHash::of(&wasm).to_string() },
            "V3": { "spec": { "constructors": [
                { "label": "new", "selector": format!("0x9bae9d5{}", i) },
            ]}}
        });
        fs::write(base.join(format!("{}.wasm", kind.file_stem())), &wasm).unwrap();
        fs::write(base.join("metadata.json"), metadata.to_string()).unwrap();
    }
}

/// Artifacts in a temporary directory. Keep the `TempDir` alive.
pub fn artifacts() -> (TempDir, ArtifactSet) {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let set = load_artifacts(dir.path()).unwrap();
    (dir, set)
}

pub fn devnet_config() -> DevnetConfig {
    DevnetConfig {
        block_time_ms: 100,
        key_delay_blocks: 2,
        worker_lag_blocks: 1,
    }
}

pub fn policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_secs(10), Duration::from_millis(50))
}

pub fn alice() -> Wallet {
    Wallet::dev("Alice").unwrap()
}

pub fn bob() -> Wallet {
    Wallet::dev("Bob").unwrap()
}

/// Fresh devnet whose gist fixture carries Alice's claim.
pub fn scenario_devnet(artifacts: &ArtifactSet) -> Arc<Devnet> {
    DevnetBuilder::new(devnet_config())
        .artifacts(artifacts)
        .http_response(GIST_URL, 200, claim_for(&alice().account()))
        .build()
        .unwrap()
}

pub fn context(devnet: Arc<Devnet>, artifacts: ArtifactSet) -> DeployContext {
    DeployContext::on_devnet(devnet, policy(), artifacts)
}
