//! Chain access seams.
//!
//! `ChainHead` is the read-only slice every backend can serve (the remote
//! JSON-RPC client included). `ChainApi` adds extrinsic submission and the
//! registry storage the orchestrator polls.

use async_trait::async_trait;

use crate::chain::call::SignedCall;
use crate::chain::events::InclusionResult;
use crate::chain::types::{AccountId, ChainResult, ClusterId, ContractId, WorkerPubkey};

#[async_trait]
pub trait ChainHead: Send + Sync {
    /// Number of the best block.
    async fn block_number(&self) -> ChainResult<u64>;
}

#[async_trait]
pub trait ChainApi: ChainHead {
    /// Next nonce of `account`.
    async fn account_nonce(&self, account: &AccountId) -> ChainResult<u64>;

    /// Submits one extrinsic and resolves once it is included in a block.
    ///
    /// Implementations submit exactly once; a dropped connection is an error,
    /// never a silent resubmission.
    async fn submit_and_watch(&self, xt: SignedCall) -> ChainResult<InclusionResult>;

    /// `phalaRegistry.workers` keys.
    async fn workers(&self) -> ChainResult<Vec<WorkerPubkey>>;

    /// `phalaRegistry.gatekeeper`
    async fn gatekeepers(&self) -> ChainResult<Vec<WorkerPubkey>>;

    /// `phalaRegistry.gatekeeperMasterPubkey`
    async fn gatekeeper_master_pubkey(&self) -> ChainResult<Option<Vec<u8>>>;

    /// `phalaRegistry.clusterKeys(cluster)`
    async fn cluster_key(&self, cluster: &ClusterId) -> ChainResult<Option<Vec<u8>>>;

    /// `phalaFatContracts.clusterContracts(cluster)`
    async fn cluster_contracts(&self, cluster: &ClusterId) -> ChainResult<Vec<ContractId>>;

    /// `phalaRegistry.contractKeys(contract)`
    async fn contract_key(&self, contract: &ContractId) -> ChainResult<Option<Vec<u8>>>;
}
