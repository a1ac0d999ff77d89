//! Contract upload and instantiation.
//!
//! # Ordering
//! The batch carries one `[clusterUploadResource, instantiateContract]` pair
//! per artifact. The chain executes a batch in order, so the k-th
//! `Instantiating` event belongs to the k-th instantiation request. Each
//! [`InstantiationRequest`] carries that ordinal explicitly.

use tracing::info;

use crate::artifacts::{ArtifactError, ContractArtifact};
use crate::chain::{Call, ClusterId, CodeIndex, ContractId, ResourceType, Wallet};
use crate::contracts::ContractKind;
use crate::deploy::DeployContext;
use crate::error::{Error, Result};
use crate::resilience::{check_until, check_until_eq};

/// One instantiation request paired with the ordinal of the event it expects.
#[derive(Debug)]
pub struct InstantiationRequest<'a> {
    pub artifact: &'a ContractArtifact,
    pub salt: [u8; 4],
    /// Position among the batch's `Instantiating` events.
    pub event_index: usize,
}

impl InstantiationRequest<'_> {
    fn calls(&self, cluster: ClusterId) -> [Call; 2] {
        [
            Call::UploadResource {
                cluster,
                kind: ResourceType::InkCode,
                data: self.artifact.wasm.clone(),
            },
            Call::InstantiateContract {
                code: CodeIndex::WasmCode(self.artifact.code_hash),
                selector: self.artifact.constructor,
                salt: self.salt.to_vec(),
                cluster,
            },
        ]
    }
}

/// Build one request per artifact, in artifact order, with random salts.
pub fn instantiation_requests(ctx: &DeployContext) -> Vec<InstantiationRequest<'_>> {
    ctx.artifacts
        .iter()
        .enumerate()
        .map(|(event_index, artifact)| InstantiationRequest {
            artifact,
            salt: rand::random(),
            event_index,
        })
        .collect()
}

/// Upload and instantiate every artifact in `cluster` as one atomic batch,
/// then wait until the cluster lists them and each has its key.
pub async fn deploy_contracts(
    ctx: &DeployContext,
    deployer: &Wallet,
    cluster: ClusterId,
) -> Result<Vec<ContractId>> {
    info!(cluster = %cluster, deployer = %deployer.display_name(), "Contracts: uploading");
    let requests = instantiation_requests(ctx);
    let calls = requests.iter().flat_map(|r| r.calls(cluster)).collect();

    let result = ctx.txqueue.submit(Call::batch_all(calls), deployer, true).await?;

    let instantiated = result.instantiated_contracts();
    if instantiated.len() != requests.len() {
        return Err(Error::Consistency(format!(
            "expected {} Instantiating events, got {}",
            requests.len(),
            instantiated.len()
        )));
    }

    let mut ids = Vec::with_capacity(requests.len());
    for request in &requests {
        let id = instantiated[request.event_index];
        request.artifact.assign_address(id)?;
        info!(contract = request.artifact.name(), address = %id, "Contracts: instantiating");
        ids.push(id);
    }

    let expected = ids.len();
    let wanted = &ids;
    check_until_eq(
        &ctx.poll,
        "cluster contract registration",
        || async move {
            let listed = ctx.chain.cluster_contracts(&cluster).await?;
            Ok::<_, Error>(listed.iter().filter(|c| wanted.contains(c)).count())
        },
        expected,
    )
    .await?;
    info!("Contracts: uploaded");

    for artifact in ctx.artifacts.iter() {
        let address = artifact.deployed_address()?;
        check_until(&ctx.poll, &format!("{} contract key", artifact.name()), || async move {
            Ok::<_, Error>(ctx.chain.contract_key(&address).await?.is_some())
        })
        .await?;
        info!(contract = artifact.name(), address = %address, "Contracts: key ready");
    }

    info!("Contracts: deployed");
    Ok(ids)
}

/// Addresses of the three deployed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContracts {
    pub fat_badges: ContractId,
    pub easy_oracle: ContractId,
    pub advanced_judger: ContractId,
}

/// Resolve the deployed addresses. Every artifact must have one.
pub fn connect_contracts(ctx: &DeployContext) -> Result<DeployedContracts> {
    let address = |kind: ContractKind| -> Result<ContractId> {
        let artifact = ctx
            .artifacts
            .get(kind)
            .ok_or_else(|| ArtifactError::Unknown(kind.name().to_string()))?;
        Ok(artifact.deployed_address()?)
    };

    let contracts = DeployedContracts {
        fat_badges: address(ContractKind::FatBadges)?,
        easy_oracle: address(ContractKind::EasyOracle)?,
        advanced_judger: address(ContractKind::AdvancedJudger)?,
    };
    info!(
        fat_badges = %contracts.fat_badges,
        easy_oracle = %contracts.easy_oracle,
        advanced_judger = %contracts.advanced_judger,
        "Fat Contract: connected"
    );
    Ok(contracts)
}
