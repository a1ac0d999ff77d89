//! Shared handles for one deployment run.

use std::sync::Arc;
use std::time::Duration;

use crate::artifacts::ArtifactSet;
use crate::chain::{ChainApi, ContractId, LiveChain, TxQueue};
use crate::config::schema::NetworkConfig;
use crate::contracts::{ContractQuery, QueryOutput};
use crate::devnet::Devnet;
use crate::error::Result;
use crate::resilience::PollPolicy;
use crate::worker::{Certificate, ContractChannel, ContractQuerier, PruntimeClient, WorkerApi};

/// Everything the orchestrator and scenario need, built once per run.
pub struct DeployContext {
    pub chain: Arc<dyn ChainApi>,
    pub worker: Arc<dyn WorkerApi>,
    pub querier: Arc<dyn ContractQuerier>,
    pub txqueue: TxQueue,
    pub poll: PollPolicy,
    pub artifacts: ArtifactSet,
}

impl DeployContext {
    pub fn new(
        chain: Arc<dyn ChainApi>,
        worker: Arc<dyn WorkerApi>,
        querier: Arc<dyn ContractQuerier>,
        poll: PollPolicy,
        artifacts: ArtifactSet,
    ) -> Self {
        Self {
            txqueue: TxQueue::new(chain.clone()),
            chain,
            worker,
            querier,
            poll,
            artifacts,
        }
    }

    /// Context backed entirely by one devnet.
    pub fn on_devnet(devnet: Arc<Devnet>, poll: PollPolicy, artifacts: ArtifactSet) -> Self {
        Self::new(devnet.clone(), devnet.clone(), devnet, poll, artifacts)
    }

    /// Context on a live network: the configured node and worker.
    pub async fn connect(
        network: &NetworkConfig,
        poll: PollPolicy,
        artifacts: ArtifactSet,
    ) -> Result<Self> {
        let chain: Arc<dyn ChainApi> = Arc::new(LiveChain::connect(network).await?);
        let pruntime = PruntimeClient::new(
            &network.pruntime_url,
            Duration::from_secs(network.rpc_timeout_secs),
        )?;
        let querier = Arc::new(ContractChannel::new(pruntime.clone(), chain.clone())?);
        Ok(Self::new(chain, Arc::new(pruntime), querier, poll, artifacts))
    }

    /// Query a contract through the worker.
    pub async fn query(
        &self,
        cert: &Certificate,
        contract: &ContractId,
        query: ContractQuery,
    ) -> Result<QueryOutput> {
        tracing::trace!(contract = %contract, query = ?query, "Contract query");
        Ok(self.querier.query(cert, contract, query).await?)
    }
}

impl std::fmt::Debug for DeployContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployContext")
            .field("poll", &self.poll)
            .field("artifacts", &self.artifacts.len())
            .finish_non_exhaustive()
    }
}
