//! Failure injection: reverted batches, missed deadlines, exit codes.

use std::fs;
use std::process::Command;
use std::time::Duration;

use badge_deployer::chain::{
    Call, ChainApi, ChainEvent, ClusterId, ClusterPermission, CodeHash, CodeIndex, DispatchError,
    Selector,
};
use badge_deployer::config::schema::DevnetConfig;
use badge_deployer::deploy::{setup_gatekeeper, worker_pubkey};
use badge_deployer::devnet::DevnetBuilder;
use badge_deployer::resilience::PollPolicy;
use badge_deployer::{DeployContext, Error};

mod common;

const OVERRIDES: [&str; 9] = [
    "CLUSTER_ID",
    "PRIVKEY",
    "CHAIN",
    "PRUNTIME",
    "CODE_EASY_CSV",
    "CODE_ADV_CSV",
    "ARTIFACTS_DIR",
    "POLL_TIMEOUT_MS",
    "RUST_LOG",
];

#[tokio::test(start_paused = true)]
async fn test_failed_batch_leaves_no_trace() {
    let (_dir, artifacts) = common::artifacts();
    let devnet = DevnetBuilder::new(common::devnet_config())
        .artifacts(&artifacts)
        .genesis_cluster(ClusterId::default())
        .build()
        .unwrap();
    let ctx = common::context(devnet.clone(), artifacts);
    let alice = common::alice();
    let worker = devnet.worker_pubkey();

    let add_cluster = Call::AddCluster {
        permission: ClusterPermission::Public,
        workers: vec![worker],
    };
    let bad_instantiate = Call::InstantiateContract {
        code: CodeIndex::WasmCode(CodeHash::of(b"never uploaded")),
        selector: Selector::default(),
        salt: vec![0; 4],
        cluster: ClusterId::default(),
    };
    let err = ctx
        .txqueue
        .submit(
            Call::batch_all(vec![add_cluster.clone(), bad_instantiate]),
            &alice,
            true,
        )
        .await
        .unwrap_err();
    match err {
        Error::TransactionFailed { detail, .. } => {
            assert_eq!(detail, DispatchError::module("phalaFatContracts", "CodeNotFound"))
        }
        other => panic!("expected TransactionFailed, got {:?}", other),
    }
    // the nonce is spent even though the batch reverted
    assert_eq!(devnet.account_nonce(&alice.account()).await.unwrap(), 1);

    // the reverted addCluster did not consume a cluster id
    let result = ctx.txqueue.submit(add_cluster, &alice, true).await.unwrap();
    let mut expected = [0u8; 32];
    expected[31] = 1;
    assert_eq!(result.created_cluster(), Some(ClusterId::new(expected)));
    assert!(result.events.contains(&ChainEvent::ExtrinsicSuccess));
}

#[tokio::test(start_paused = true)]
async fn test_lenient_failure_returns_result() {
    let (_dir, artifacts) = common::artifacts();
    let devnet = DevnetBuilder::new(common::devnet_config())
        .artifacts(&artifacts)
        .build()
        .unwrap();
    let ctx = common::context(devnet, artifacts);

    // Bob is not the sudo key
    let result = ctx
        .txqueue
        .submit(
            Call::sudo(Call::RegisterGatekeeper {
                worker: ctx.chain.workers().await.unwrap()[0],
            }),
            &common::bob(),
            false,
        )
        .await
        .unwrap();
    assert_eq!(
        result.dispatch_error(),
        Some(&DispatchError::module("sudo", "RequireSudo"))
    );
    assert!(ctx.chain.gatekeepers().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_key_delay_beyond_timeout_is_poll_timeout() {
    let (_dir, artifacts) = common::artifacts();
    let devnet = DevnetBuilder::new(DevnetConfig {
        block_time_ms: 100,
        key_delay_blocks: 20,
        worker_lag_blocks: 1,
    })
    .artifacts(&artifacts)
    .build()
    .unwrap();
    let ctx = DeployContext::on_devnet(
        devnet,
        PollPolicy::fixed(Duration::from_millis(500), Duration::from_millis(100)),
        artifacts,
    );

    let worker = worker_pubkey(ctx.chain.as_ref()).await.unwrap();
    let err = setup_gatekeeper(&ctx, &common::alice(), worker)
        .await
        .unwrap_err();
    match err {
        Error::PollTimeout { what, timeout_ms, last } => {
            assert_eq!(what, "gatekeeper master key");
            assert_eq!(timeout_ms, 500);
            assert_eq!(last.as_deref(), Some("false"));
        }
        other => panic!("expected PollTimeout, got {:?}", other),
    }
}

fn write_config(dir: &std::path::Path, timeout_ms: u64, key_delay_blocks: u64) -> std::path::PathBuf {
    let path = dir.join("deployer.toml");
    let toml = format!(
        r#"
[artifacts]
dir = "{}"

[polling]
timeout_ms = {}
interval_ms = 20
max_interval_ms = 20

[devnet]
block_time_ms = 20
key_delay_blocks = {}
worker_lag_blocks = 1

[observability]
log_level = "warn"
"#,
        dir.display(),
        timeout_ms,
        key_delay_blocks
    );
    fs::write(&path, toml).unwrap();
    path
}

fn run(config: &std::path::Path, args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_badge-deployer"));
    cmd.arg("--config").arg(config).args(args);
    for var in OVERRIDES {
        cmd.env_remove(var);
    }
    cmd.output().unwrap()
}

fn run_e2e(config: &std::path::Path) -> std::process::Output {
    run(config, &["e2e", "--devnet"])
}

/// Config pointing at endpoints nothing listens on.
fn write_unreachable_config(dir: &std::path::Path) -> std::path::PathBuf {
    fs::write(dir.join("easy.csv"), "easy1\n").unwrap();
    fs::write(dir.join("adv.csv"), "adv1\n").unwrap();
    let path = dir.join("unreachable.toml");
    let toml = format!(
        r#"
[network]
chain_url = "ws://127.0.0.1:1"
pruntime_url = "http://127.0.0.1:1"
rpc_timeout_secs = 1

[artifacts]
dir = "{dir}"

[codes]
easy_path = "{dir}/easy.csv"
adv_path = "{dir}/adv.csv"

[observability]
log_level = "warn"
"#,
        dir = dir.display()
    );
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn test_poll_timeout_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    common::write_artifacts(dir.path());
    let config = write_config(dir.path(), 100, 50);

    let output = run_e2e(&config);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_successful_e2e_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    common::write_artifacts(dir.path());
    let config = write_config(dir.path(), 10_000, 2);

    let output = run_e2e(&config);
    assert!(
        output.status.success(),
        "stderr: {}\nstdout: {}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn test_deploy_to_unreachable_network_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    common::write_artifacts(dir.path());
    let config = write_unreachable_config(dir.path());

    let output = run(&config, &["deploy"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Deploy: done"), "stdout: {}", stdout);
}

#[test]
fn test_e2e_without_devnet_flag_uses_the_network() {
    let dir = tempfile::tempdir().unwrap();
    common::write_artifacts(dir.path());
    let config = write_unreachable_config(dir.path());

    let output = run(&config, &["e2e"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployer.toml");
    fs::write(&path, "[polling]\ntimeout_ms = 10\ninterval_ms = 500\n").unwrap();

    let output = run_e2e(&path);
    assert_eq!(output.status.code(), Some(1));
}
