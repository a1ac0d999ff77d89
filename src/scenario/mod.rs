//! End-to-end badge scenario.
//!
//! # Flow
//! ```text
//! setup (sudo = alice) → deploy + wire (bob) → barrier → verify badges
//!     → alice: attest gist → redeem → barrier → read easy code
//!     → alice: checkContract(EasyOracle) → bob: redeem → barrier → read adv code
//! ```
//!
//! Bob deploys, so Bob is the EasyOracle admin the judger attests to. Alice
//! owns the gist claim.

use tracing::{info, Instrument};
use uuid::Uuid;

use crate::chain::{Call, ClusterId, ContractId, Wallet};
use crate::config::ScenarioConfig;
use crate::contracts::{Attestation, ContractMessage, ContractQuery, GistQuote, GoodSubmission};
use crate::deploy::wiring::expect_text;
use crate::deploy::{
    block_barrier, connect_contracts, connected_worker, deploy_cluster, deploy_contracts,
    setup_gatekeeper, verify_badges, wire_contracts, worker_pubkey, DeployContext,
    DeployedContracts, WiringPlan, ADV_BADGE_ID, EASY_BADGE_ID,
};
use crate::error::{Error, Result};
use crate::worker::Certificate;

/// The two signers the scenario drives.
#[derive(Debug, Clone)]
pub struct ScenarioAccounts {
    pub alice: Wallet,
    pub bob: Wallet,
}

impl ScenarioAccounts {
    pub fn dev() -> Result<Self> {
        Ok(Self {
            alice: Wallet::dev("Alice")?,
            bob: Wallet::dev("Bob")?,
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    /// Hex identity key of the worker that served the run.
    pub connected_worker: String,
    pub cluster: ClusterId,
    pub contracts: DeployedContracts,
    /// Redeem code Alice received from the easy badge.
    pub easy_code: String,
    /// Redeem code Bob received from the advanced badge.
    pub adv_code: String,
}

/// Codes loaded into the badges during the scenario.
pub fn scenario_plan() -> WiringPlan {
    WiringPlan {
        easy_codes: vec!["easy1".into(), "easy2".into()],
        adv_codes: vec!["adv1".into(), "adv2".into()],
    }
}

/// Run the full scenario against `ctx`.
pub async fn run(
    ctx: &DeployContext,
    accounts: &ScenarioAccounts,
    config: &ScenarioConfig,
) -> Result<ScenarioReport> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("scenario", run_id = %run_id);
    async move {
        let report = drive(ctx, accounts, config, run_id).await?;
        info!(easy_code = %report.easy_code, adv_code = %report.adv_code, "Scenario: passed");
        Ok(report)
    }
    .instrument(span)
    .await
}

async fn drive(
    ctx: &DeployContext,
    accounts: &ScenarioAccounts,
    config: &ScenarioConfig,
    run_id: Uuid,
) -> Result<ScenarioReport> {
    let ScenarioAccounts { alice, bob } = accounts;
    let cert_alice = Certificate::sign(alice);
    let cert_bob = Certificate::sign(bob);

    let connected = connected_worker(ctx).await?;
    let worker = worker_pubkey(ctx.chain.as_ref()).await?;
    info!(worker = %worker, "Worker");
    setup_gatekeeper(ctx, alice, worker).await?;
    let cluster = deploy_cluster(ctx, alice, worker, ClusterId::default()).await?;

    deploy_contracts(ctx, bob, cluster).await?;
    let contracts = connect_contracts(ctx)?;
    wire_contracts(ctx, bob, &contracts, &scenario_plan()).await?;
    barrier(ctx).await?;
    verify_badges(ctx, &cert_bob, &contracts).await?;

    // Easy challenge
    let attestation = fetch_attestation(
        ctx,
        &cert_alice,
        &contracts.easy_oracle,
        ContractQuery::Attest {
            arg: config.gist_url.clone(),
        },
        "gist attestation",
    )
    .await?;
    let quote: Option<GistQuote> = attestation.decode_unchecked();
    info!(quote = ?quote, "Easy challenge: attested");

    redeem(ctx, alice, contracts.easy_oracle, attestation).await?;
    barrier(ctx).await?;
    let easy_code = badge_code(ctx, &cert_alice, &contracts, EASY_BADGE_ID).await?;
    info!(code = %easy_code, "Easy challenge: badge redeemed");

    // Advanced challenge
    let attestation = fetch_attestation(
        ctx,
        &cert_alice,
        &contracts.advanced_judger,
        ContractQuery::CheckContract {
            contract: contracts.easy_oracle,
            url: config.gist_url.clone(),
        },
        "contract check",
    )
    .await?;
    let submission: Option<GoodSubmission> = attestation.decode_unchecked();
    info!(submission = ?submission, "Advanced challenge: contract checked");

    redeem(ctx, bob, contracts.advanced_judger, attestation).await?;
    barrier(ctx).await?;
    let adv_code = badge_code(ctx, &cert_bob, &contracts, ADV_BADGE_ID).await?;
    info!(code = %adv_code, "Advanced challenge: badge redeemed");

    Ok(ScenarioReport {
        run_id,
        connected_worker: connected.public_key,
        cluster,
        contracts,
        easy_code,
        adv_code,
    })
}

async fn barrier(ctx: &DeployContext) -> Result<u64> {
    block_barrier(ctx.chain.as_ref(), ctx.worker.as_ref(), &ctx.poll).await
}

async fn fetch_attestation(
    ctx: &DeployContext,
    cert: &Certificate,
    contract: &ContractId,
    query: ContractQuery,
    what: &str,
) -> Result<Attestation> {
    let output = ctx
        .query(cert, contract, query)
        .await
        .map_err(|e| Error::Scenario(format!("{}: {}", what, e)))?;
    let kind = output.kind();
    output
        .into_attestation()
        .ok_or_else(|| Error::Scenario(format!("{}: expected attestation, got {}", what, kind)))
}

async fn redeem(
    ctx: &DeployContext,
    signer: &Wallet,
    contract: ContractId,
    attestation: Attestation,
) -> Result<()> {
    ctx.txqueue
        .submit(
            Call::contract_tx(contract, ContractMessage::Redeem { attestation }),
            signer,
            true,
        )
        .await?;
    Ok(())
}

async fn badge_code(
    ctx: &DeployContext,
    cert: &Certificate,
    contracts: &DeployedContracts,
    id: u32,
) -> Result<String> {
    let what = format!("badge {} code", id);
    let output = ctx
        .query(cert, &contracts.fat_badges, ContractQuery::Get { id })
        .await
        .map_err(|e| Error::Scenario(format!("{}: {}", what, e)))?;
    expect_text(output, &what)
}
