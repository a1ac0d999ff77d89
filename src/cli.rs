//! Command runners behind the binary's subcommands.
//!
//! # Commands
//! ```text
//! deploy  configured network → contracts → wiring (CSV codes) → verify
//! e2e     full scenario on the configured network
//! status  live node head + worker info
//! ```
//!
//! `deploy` and `e2e` take a [`Target`]: the configured live endpoints, or an
//! in-process devnet when asked for explicitly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::artifacts::loader::{load_artifacts, load_code_list};
use crate::chain::types::ParseIdError;
use crate::artifacts::ArtifactSet;
use crate::chain::{ChainHead, ClusterId, NodeClient, Wallet};
use crate::config::validation::ValidationError;
use crate::config::{ConfigError, DeployConfig};
use crate::contracts::gist::claim_for;
use crate::deploy::{
    block_barrier, connect_contracts, connected_worker, deploy_contracts, verify_badges,
    wire_contracts, DeployContext, DeployedContracts, WiringPlan,
};
use crate::devnet::{Devnet, DevnetBuilder};
use crate::error::{Error, Result};
use crate::resilience::PollPolicy;
use crate::scenario::{self, ScenarioAccounts, ScenarioReport};
use crate::worker::{Certificate, PruntimeClient, WorkerApi};

fn cluster_id(config: &DeployConfig) -> Result<ClusterId> {
    config.cluster.id.parse().map_err(|e: ParseIdError| {
        Error::Config(ConfigError::Validation(vec![ValidationError {
            field: "cluster.id",
            message: e.to_string(),
        }]))
    })
}

/// Network a run deploys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The chain and worker configured under `[network]`.
    Live,
    /// An in-process devnet built from `[devnet]`.
    Devnet,
}

/// Outcome of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Hex identity key of the worker that served the deploy.
    pub connected_worker: String,
    pub contracts: DeployedContracts,
}

/// Deploy, wire and verify the badge contracts into the configured cluster.
pub async fn deploy(config: &DeployConfig, target: Target) -> Result<DeployReport> {
    let cluster = cluster_id(config)?;
    let signer = Wallet::from_uri(&config.signer.uri)?;
    let sudo = Wallet::from_uri(&config.signer.sudo_uri)?;
    let artifacts = load_artifacts(Path::new(&config.artifacts.dir))?;
    let plan = WiringPlan {
        easy_codes: load_code_list(Path::new(&config.codes.easy_path))?,
        adv_codes: load_code_list(Path::new(&config.codes.adv_path))?,
    };
    info!(
        signer = %signer.display_name(),
        cluster = %cluster,
        target = ?target,
        easy_codes = plan.easy_codes.len(),
        adv_codes = plan.adv_codes.len(),
        "Deploy: starting"
    );

    let poll = PollPolicy::from(&config.polling);
    let (ctx, devnet) = match target {
        Target::Live => (DeployContext::connect(&config.network, poll, artifacts).await?, None),
        Target::Devnet => {
            let devnet = DevnetBuilder::new(config.devnet.clone())
                .sudo(sudo)
                .account(signer.clone())
                .artifacts(&artifacts)
                .genesis_cluster(cluster)
                .build()?;
            (DeployContext::on_devnet(devnet.clone(), poll, artifacts), Some(devnet))
        }
    };

    let result = run_deploy(&ctx, &signer, cluster, &plan).await;
    if let Some(devnet) = &devnet {
        report_failures(devnet).await;
    }
    let report = result?;
    info!(connected_worker = %report.connected_worker, "Deploy: done");
    Ok(report)
}

async fn run_deploy(
    ctx: &DeployContext,
    signer: &Wallet,
    cluster: ClusterId,
    plan: &WiringPlan,
) -> Result<DeployReport> {
    let worker = connected_worker(ctx).await?;
    deploy_contracts(ctx, signer, cluster).await?;
    let contracts = connect_contracts(ctx)?;
    wire_contracts(ctx, signer, &contracts, plan).await?;
    block_barrier(ctx.chain.as_ref(), ctx.worker.as_ref(), &ctx.poll).await?;
    verify_badges(ctx, &Certificate::sign(signer), &contracts).await?;
    Ok(DeployReport {
        connected_worker: worker.public_key,
        contracts,
    })
}

/// Run the end-to-end scenario.
///
/// On a devnet the gist fetch is served from a fixture claiming Alice's
/// account; live runs fetch `scenario.gist_url`.
pub async fn e2e(config: &DeployConfig, target: Target) -> Result<ScenarioReport> {
    let accounts = ScenarioAccounts::dev()?;
    let artifacts = load_artifacts(Path::new(&config.artifacts.dir))?;
    let poll = PollPolicy::from(&config.polling);
    match target {
        Target::Live => {
            let ctx = DeployContext::connect(&config.network, poll, artifacts).await?;
            scenario::run(&ctx, &accounts, &config.scenario).await
        }
        Target::Devnet => {
            let devnet = scenario_devnet(config, &accounts, &artifacts)?;
            let ctx = DeployContext::on_devnet(devnet.clone(), poll, artifacts);
            let report = scenario::run(&ctx, &accounts, &config.scenario).await;
            report_failures(&devnet).await;
            report
        }
    }
}

fn scenario_devnet(
    config: &DeployConfig,
    accounts: &ScenarioAccounts,
    artifacts: &ArtifactSet,
) -> Result<Arc<Devnet>> {
    Ok(DevnetBuilder::new(config.devnet.clone())
        .sudo(accounts.alice.clone())
        .artifacts(artifacts)
        .http_response(
            config.scenario.gist_url.clone(),
            200,
            claim_for(&accounts.alice.account()),
        )
        .build()?)
}

/// Print the live node head and the worker's sync state.
pub async fn status(config: &DeployConfig) -> Result<()> {
    let node = NodeClient::new(&config.network)?;
    let chain = node.chain_name().await?;
    let head = node.block_number().await?;
    info!(chain = %chain, head, "Node");

    let worker = PruntimeClient::new(
        &config.network.pruntime_url,
        Duration::from_secs(config.network.rpc_timeout_secs),
    )?;
    let info = worker.get_info().await?;
    info!(
        public_key = %info.public_key,
        blocknum = info.blocknum,
        headernum = info.headernum,
        synced = info.has_processed(head),
        "Worker"
    );
    Ok(())
}

async fn report_failures(devnet: &Arc<Devnet>) {
    for failure in devnet.message_failures().await {
        tracing::warn!(
            block = failure.block,
            contract = %failure.contract,
            message = failure.message,
            error = %failure.error,
            "Contract message failed"
        );
    }
}
