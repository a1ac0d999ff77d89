//! Network setup: worker lookup, gatekeeper and cluster.
//!
//! Both setup steps check for existing state first and return without
//! submitting anything when it is already there.

use tracing::info;

use crate::chain::{Call, ChainApi, ClusterId, ClusterPermission, Wallet, WorkerPubkey};
use crate::deploy::DeployContext;
use crate::error::{Error, Result};
use crate::resilience::{check_until, check_until_eq};
use crate::worker::WorkerInfo;

/// Worker the context talks to. Fails when it is unreachable.
pub async fn connected_worker(ctx: &DeployContext) -> Result<WorkerInfo> {
    let info = ctx.worker.get_info().await?;
    info!(
        connected_worker = %info.public_key,
        blocknum = info.blocknum,
        "Connected worker"
    );
    Ok(info)
}

/// First registered worker.
pub async fn worker_pubkey(chain: &dyn ChainApi) -> Result<WorkerPubkey> {
    chain
        .workers()
        .await?
        .first()
        .copied()
        .ok_or_else(|| Error::Consistency("no worker registered on chain".into()))
}

/// Register `worker` as gatekeeper through sudo, unless one exists.
pub async fn setup_gatekeeper(ctx: &DeployContext, sudo: &Wallet, worker: WorkerPubkey) -> Result<()> {
    if !ctx.chain.gatekeepers().await?.is_empty() {
        info!("Gatekeeper: already registered");
        return Ok(());
    }

    info!(worker = %worker, "Gatekeeper: registering");
    ctx.txqueue
        .submit(Call::sudo(Call::RegisterGatekeeper { worker }), sudo, true)
        .await?;

    check_until_eq(
        &ctx.poll,
        "gatekeeper registration",
        || async move { Ok::<_, Error>(ctx.chain.gatekeepers().await?.len()) },
        1,
    )
    .await?;
    info!("Gatekeeper: added");

    check_until(&ctx.poll, "gatekeeper master key", || async move {
        Ok::<_, Error>(ctx.chain.gatekeeper_master_pubkey().await?.is_some())
    })
    .await?;
    info!("Gatekeeper: master key ready");
    Ok(())
}

/// Return `default_cluster` if its key exists, otherwise create a public
/// cluster on `worker` and wait for its key.
pub async fn deploy_cluster(
    ctx: &DeployContext,
    owner: &Wallet,
    worker: WorkerPubkey,
    default_cluster: ClusterId,
) -> Result<ClusterId> {
    if ctx.chain.cluster_key(&default_cluster).await?.is_some() {
        info!(cluster = %default_cluster, "Cluster: already exists");
        return Ok(default_cluster);
    }

    info!("Cluster: creating");
    let result = ctx
        .txqueue
        .submit(
            Call::AddCluster {
                permission: ClusterPermission::Public,
                workers: vec![worker],
            },
            owner,
            true,
        )
        .await?;
    let cluster = result
        .created_cluster()
        .ok_or_else(|| Error::Consistency("addCluster emitted no ClusterCreated event".into()))?;
    info!(cluster = %cluster, "Cluster: created");

    check_until(&ctx.poll, "cluster key", || async move {
        Ok::<_, Error>(ctx.chain.cluster_key(&cluster).await?.is_some())
    })
    .await?;
    info!(cluster = %cluster, "Cluster: key ready");
    Ok(cluster)
}
