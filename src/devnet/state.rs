//! Devnet storage: chain registry plus the worker's view.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::chain::call::ClusterPermission;
use crate::chain::types::{blake2_256, AccountId, ClusterId, CodeHash, ContractId, WorkerPubkey};
use crate::contracts::{ContractError, ContractKind, ContractMessage};
use crate::devnet::contracts::{execute_message, ContractInstance, Instances};

#[derive(Debug, Clone)]
pub struct Cluster {
    pub owner: AccountId,
    pub permission: ClusterPermission,
    pub workers: Vec<WorkerPubkey>,
    /// Code uploaded with `clusterUploadResource`.
    pub resources: BTreeSet<CodeHash>,
}

/// On-chain record of an instantiated contract.
#[derive(Debug, Clone)]
pub struct ContractRecord {
    pub code_hash: CodeHash,
    pub cluster: ClusterId,
    pub deployer: AccountId,
}

/// Registry update that lands some blocks after its extrinsic.
#[derive(Debug, Clone)]
pub enum Effect {
    MasterKey { gatekeeper: WorkerPubkey },
    ClusterKey { cluster: ClusterId },
    ContractRegistered {
        cluster: ClusterId,
        contract: ContractId,
        /// Contracts of unknown code never get a key.
        has_key: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Pending {
    pub at_block: u64,
    pub effect: Effect,
}

/// Work the worker performs once it processes `block`.
#[derive(Debug, Clone)]
pub enum WorkerTask {
    Instantiate {
        contract: ContractId,
        kind: ContractKind,
        deployer: AccountId,
    },
    Message {
        contract: ContractId,
        caller: AccountId,
        message: ContractMessage,
    },
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub block: u64,
    pub task: WorkerTask,
}

/// A contract message that the worker executed with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFailure {
    pub block: u64,
    pub contract: ContractId,
    pub caller: AccountId,
    pub message: &'static str,
    pub error: ContractError,
}

#[derive(Debug, Clone, Default)]
pub struct ChainState {
    pub nonces: HashMap<AccountId, u64>,
    pub workers: Vec<WorkerPubkey>,
    pub gatekeepers: Vec<WorkerPubkey>,
    pub master_pubkey: Option<Vec<u8>>,
    pub clusters: BTreeMap<ClusterId, Cluster>,
    pub next_cluster: u64,
    pub cluster_keys: HashMap<ClusterId, Vec<u8>>,
    pub cluster_contracts: HashMap<ClusterId, Vec<ContractId>>,
    pub contract_keys: HashMap<ContractId, Vec<u8>>,
    pub contracts: HashMap<ContractId, ContractRecord>,
    pub pending: Vec<Pending>,
    pub worker_queue: Vec<ScheduledTask>,
    pub instances: Instances,
    pub failures: Vec<MessageFailure>,
}

pub fn derive_key(domain: &str, id: &[u8]) -> Vec<u8> {
    let mut material = domain.as_bytes().to_vec();
    material.extend_from_slice(id);
    blake2_256(&material).to_vec()
}

/// Address of a contract, as the chain derives it.
pub fn contract_address(
    deployer: &AccountId,
    code_hash: &CodeHash,
    cluster: &ClusterId,
    salt: &[u8],
) -> ContractId {
    let mut material = deployer.as_bytes().to_vec();
    material.extend_from_slice(code_hash.as_bytes());
    material.extend_from_slice(cluster.as_bytes());
    material.extend_from_slice(salt);
    ContractId::new(blake2_256(&material))
}

impl ChainState {
    pub fn nonce(&self, account: &AccountId) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    /// Next free counter-derived cluster id.
    pub fn allocate_cluster_id(&mut self) -> ClusterId {
        loop {
            let mut bytes = [0u8; 32];
            bytes[24..].copy_from_slice(&self.next_cluster.to_be_bytes());
            self.next_cluster += 1;
            let id = ClusterId::new(bytes);
            if !self.clusters.contains_key(&id) {
                return id;
            }
        }
    }

    /// Apply registry effects due at or before `head`.
    pub fn apply_effects(&mut self, head: u64) {
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.at_block <= head);
        self.pending = later;

        for Pending { at_block, effect } in due {
            match effect {
                Effect::MasterKey { gatekeeper } => {
                    if self.master_pubkey.is_none() {
                        self.master_pubkey = Some(derive_key("master-key:", gatekeeper.as_bytes()));
                        tracing::debug!(block = at_block, "Gatekeeper master key generated");
                    }
                }
                Effect::ClusterKey { cluster } => {
                    self.cluster_keys
                        .insert(cluster, derive_key("cluster-key:", cluster.as_bytes()));
                    tracing::debug!(block = at_block, cluster = %cluster, "Cluster key ready");
                }
                Effect::ContractRegistered {
                    cluster,
                    contract,
                    has_key,
                } => {
                    self.cluster_contracts.entry(cluster).or_default().push(contract);
                    if has_key {
                        self.contract_keys
                            .insert(contract, derive_key("contract-key:", contract.as_bytes()));
                    }
                    tracing::debug!(block = at_block, contract = %contract, has_key, "Contract registered");
                }
            }
        }
    }

    /// Run worker tasks scheduled at or before `processed`.
    pub fn run_worker(&mut self, processed: u64) {
        let split = self
            .worker_queue
            .iter()
            .position(|t| t.block > processed)
            .unwrap_or(self.worker_queue.len());
        let due: Vec<_> = self.worker_queue.drain(..split).collect();

        for ScheduledTask { block, task } in due {
            match task {
                WorkerTask::Instantiate {
                    contract,
                    kind,
                    deployer,
                } => {
                    self.instances
                        .insert(contract, ContractInstance::instantiate(kind, contract, deployer));
                    tracing::debug!(block, contract = %contract, kind = %kind, "Worker instantiated contract");
                }
                WorkerTask::Message {
                    contract,
                    caller,
                    message,
                } => {
                    let label = message.label();
                    if let Err(error) = execute_message(&mut self.instances, &contract, caller, message) {
                        tracing::warn!(
                            block,
                            contract = %contract,
                            message = label,
                            error = %error,
                            "Contract message failed"
                        );
                        self.failures.push(MessageFailure {
                            block,
                            contract,
                            caller,
                            message: label,
                            error,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_ids_are_counters() {
        let mut state = ChainState::default();
        assert_eq!(state.allocate_cluster_id(), ClusterId::default());
        let second = state.allocate_cluster_id();
        assert_eq!(second.as_bytes()[31], 1);
    }

    #[test]
    fn test_cluster_id_skips_taken() {
        let mut state = ChainState::default();
        state.clusters.insert(
            ClusterId::default(),
            Cluster {
                owner: AccountId::default(),
                permission: ClusterPermission::Public,
                workers: vec![],
                resources: BTreeSet::new(),
            },
        );
        assert_ne!(state.allocate_cluster_id(), ClusterId::default());
    }

    #[test]
    fn test_effects_wait_for_their_block() {
        let mut state = ChainState::default();
        let cluster = ClusterId::default();
        state.pending.push(Pending {
            at_block: 5,
            effect: Effect::ClusterKey { cluster },
        });

        state.apply_effects(4);
        assert!(!state.cluster_keys.contains_key(&cluster));
        state.apply_effects(5);
        assert!(state.cluster_keys.contains_key(&cluster));
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_worker_records_failures() {
        let mut state = ChainState::default();
        let contract = ContractId::new([3; 32]);
        state.worker_queue.push(ScheduledTask {
            block: 2,
            task: WorkerTask::Message {
                contract,
                caller: AccountId::default(),
                message: ContractMessage::NewBadge { name: "x".into() },
            },
        });

        state.run_worker(1);
        assert!(state.failures.is_empty());
        assert_eq!(state.worker_queue.len(), 1);

        state.run_worker(2);
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].error, ContractError::NotFound);
        assert_eq!(state.failures[0].message, "newBadge");
    }

    #[test]
    fn test_contract_address_depends_on_salt() {
        let a = contract_address(&AccountId::default(), &CodeHash::default(), &ClusterId::default(), b"1");
        let b = contract_address(&AccountId::default(), &CodeHash::default(), &ClusterId::default(), b"2");
        assert_ne!(a, b);
    }
}
