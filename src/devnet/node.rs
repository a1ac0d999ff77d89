//! The devnet node: a time-driven chain plus one lagging worker.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::chain::api::{ChainApi, ChainHead};
use crate::chain::call::SignedCall;
use crate::chain::events::{ChainEvent, InclusionResult};
use crate::chain::types::{
    AccountId, ChainError, ChainResult, ClusterId, CodeHash, ContractId, WorkerPubkey,
};
use crate::chain::wallet::Wallet;
use crate::contracts::{ContractKind, ContractQuery, QueryOutput};
use crate::devnet::contracts::query_instance;
use crate::devnet::dispatch::{dispatch, DispatchEnv, Origin};
use crate::devnet::fixtures::HttpFixtures;
use crate::devnet::state::{ChainState, MessageFailure};
use crate::worker::{Certificate, ContractQuerier, WorkerApi, WorkerError, WorkerInfo, WorkerResult};

/// In-process chain and worker.
///
/// Block `n` starts at `genesis + n * block_time`. Storage reads first catch
/// up on every effect due at the current head.
pub struct Devnet {
    pub(crate) genesis: Instant,
    pub(crate) block_time_ms: u64,
    pub(crate) key_delay_blocks: u64,
    pub(crate) worker_lag_blocks: u64,
    pub(crate) worker: WorkerPubkey,
    pub(crate) sudo_key: AccountId,
    pub(crate) code_book: HashMap<CodeHash, ContractKind>,
    pub(crate) http: HttpFixtures,
    pub(crate) keyring: HashMap<AccountId, Wallet>,
    pub(crate) state: Mutex<ChainState>,
}

impl Devnet {
    fn head(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.genesis);
        (elapsed.as_millis() / u128::from(self.block_time_ms.max(1))) as u64
    }

    fn block_start(&self, number: u64) -> Instant {
        self.genesis + Duration::from_millis(self.block_time_ms.saturating_mul(number))
    }

    /// Last block the worker has processed, if any.
    fn worker_processed(&self, head: u64) -> Option<u64> {
        head.checked_sub(self.worker_lag_blocks)
    }

    /// Lock the state and bring it up to the current head.
    async fn synced(&self) -> (tokio::sync::MutexGuard<'_, ChainState>, u64) {
        let mut state = self.state.lock().await;
        let head = self.head();
        state.apply_effects(head);
        if let Some(processed) = self.worker_processed(head) {
            state.run_worker(processed);
        }
        (state, head)
    }

    /// The registered worker.
    pub fn worker_pubkey(&self) -> WorkerPubkey {
        self.worker
    }

    /// Contract messages the worker rejected so far.
    pub async fn message_failures(&self) -> Vec<MessageFailure> {
        self.synced().await.0.failures.clone()
    }

    fn check_nonce(state: &ChainState, xt: &SignedCall) -> ChainResult<()> {
        let signer = xt.signer.account();
        let expected = state.nonce(&signer);
        if xt.nonce != expected {
            return Err(ChainError::InvalidTransaction(format!(
                "nonce {} for {} (expected {})",
                xt.nonce, signer, expected
            )));
        }
        Ok(())
    }

    fn include(&self, state: &mut ChainState, xt: SignedCall, block: u64) -> Vec<ChainEvent> {
        let signer = xt.signer.account();
        *state.nonces.entry(signer).or_insert(0) += 1;

        let env = DispatchEnv {
            block,
            key_delay_blocks: self.key_delay_blocks,
            sudo_key: self.sudo_key,
            code_book: &self.code_book,
        };
        let mut draft = state.clone();
        let mut events = Vec::new();
        match dispatch(&mut draft, &env, Origin::Signed(signer), &xt.call, &mut events) {
            Ok(()) => {
                *state = draft;
                events.push(ChainEvent::ExtrinsicSuccess);
                events
            }
            Err(error) => vec![ChainEvent::ExtrinsicFailed { error }],
        }
    }
}

impl std::fmt::Debug for Devnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Devnet")
            .field("block_time_ms", &self.block_time_ms)
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChainHead for Devnet {
    async fn block_number(&self) -> ChainResult<u64> {
        Ok(self.synced().await.1)
    }
}

#[async_trait]
impl ChainApi for Devnet {
    async fn account_nonce(&self, account: &AccountId) -> ChainResult<u64> {
        Ok(self.synced().await.0.nonce(account))
    }

    async fn submit_and_watch(&self, xt: SignedCall) -> ChainResult<InclusionResult> {
        let target = {
            let (state, head) = self.synced().await;
            Self::check_nonce(&state, &xt)?;
            head + 1
        };

        sleep_until(self.block_start(target)).await;

        let (mut state, block) = self.synced().await;
        // another extrinsic from the same signer may have landed meanwhile
        Self::check_nonce(&state, &xt)?;
        let label = xt.call.label();
        let events = self.include(&mut state, xt, block);
        tracing::debug!(call = %label, block, events = events.len(), "Devnet included extrinsic");
        Ok(InclusionResult {
            block_number: block,
            events,
        })
    }

    async fn workers(&self) -> ChainResult<Vec<WorkerPubkey>> {
        Ok(self.synced().await.0.workers.clone())
    }

    async fn gatekeepers(&self) -> ChainResult<Vec<WorkerPubkey>> {
        Ok(self.synced().await.0.gatekeepers.clone())
    }

    async fn gatekeeper_master_pubkey(&self) -> ChainResult<Option<Vec<u8>>> {
        Ok(self.synced().await.0.master_pubkey.clone())
    }

    async fn cluster_key(&self, cluster: &ClusterId) -> ChainResult<Option<Vec<u8>>> {
        Ok(self.synced().await.0.cluster_keys.get(cluster).cloned())
    }

    async fn cluster_contracts(&self, cluster: &ClusterId) -> ChainResult<Vec<ContractId>> {
        Ok(self
            .synced()
            .await
            .0
            .cluster_contracts
            .get(cluster)
            .cloned()
            .unwrap_or_default())
    }

    async fn contract_key(&self, contract: &ContractId) -> ChainResult<Option<Vec<u8>>> {
        Ok(self.synced().await.0.contract_keys.get(contract).cloned())
    }
}

#[async_trait]
impl WorkerApi for Devnet {
    async fn get_info(&self) -> WorkerResult<WorkerInfo> {
        let (_, head) = self.synced().await;
        Ok(WorkerInfo {
            public_key: hex::encode(self.worker.as_bytes()),
            blocknum: self.worker_processed(head).map_or(0, |p| p + 1),
            headernum: head,
        })
    }
}

#[async_trait]
impl ContractQuerier for Devnet {
    async fn query(
        &self,
        cert: &Certificate,
        contract: &ContractId,
        query: ContractQuery,
    ) -> WorkerResult<QueryOutput> {
        let valid = self
            .keyring
            .get(&cert.account)
            .is_some_and(|wallet| cert.verify_with(wallet));
        if !valid {
            return Err(WorkerError::InvalidCertificate);
        }

        let (state, _) = self.synced().await;
        if !state.instances.contains_key(contract) {
            return Err(WorkerError::ContractNotFound(*contract));
        }
        Ok(query_instance(
            &state.instances,
            &self.http,
            contract,
            cert.account,
            query,
        )?)
    }
}
