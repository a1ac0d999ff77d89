//! Call dispatch against devnet storage.
//!
//! `dispatch` mutates the state it is given; the caller runs it on a copy
//! and commits only on success. Sudo reverts its inner call the same way.

use std::collections::{BTreeSet, HashMap};

use crate::chain::call::{Call, ClusterPermission, CodeIndex, ResourceType};
use crate::chain::events::{ChainEvent, DispatchError};
use crate::chain::types::{AccountId, CodeHash};
use crate::contracts::ContractKind;
use crate::devnet::state::{
    contract_address, ChainState, Cluster, ContractRecord, Effect, Pending, ScheduledTask, WorkerTask,
};

const FAT_CONTRACTS: &str = "phalaFatContracts";
const REGISTRY: &str = "phalaRegistry";

/// Dispatch origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Signed(AccountId),
    Root,
}

/// Static chain parameters visible to dispatch.
pub struct DispatchEnv<'a> {
    pub block: u64,
    pub key_delay_blocks: u64,
    pub sudo_key: AccountId,
    pub code_book: &'a HashMap<CodeHash, ContractKind>,
}

fn signed(origin: Origin) -> Result<AccountId, DispatchError> {
    match origin {
        Origin::Signed(account) => Ok(account),
        Origin::Root => Err(DispatchError::BadOrigin),
    }
}

fn cluster_mut<'s>(
    state: &'s mut ChainState,
    cluster: &crate::chain::types::ClusterId,
) -> Result<&'s mut Cluster, DispatchError> {
    state
        .clusters
        .get_mut(cluster)
        .ok_or_else(|| DispatchError::module(FAT_CONTRACTS, "ClusterNotFound"))
}

fn ensure_permission(cluster: &Cluster, account: &AccountId) -> Result<(), DispatchError> {
    match &cluster.permission {
        ClusterPermission::OnlyOwner(owner) if owner != account => {
            Err(DispatchError::module(FAT_CONTRACTS, "ClusterPermissionDenied"))
        }
        _ => Ok(()),
    }
}

pub fn dispatch(
    state: &mut ChainState,
    env: &DispatchEnv<'_>,
    origin: Origin,
    call: &Call,
    events: &mut Vec<ChainEvent>,
) -> Result<(), DispatchError> {
    match call {
        Call::UploadResource {
            cluster,
            kind: ResourceType::InkCode,
            data,
        } => {
            let account = signed(origin)?;
            let entry = cluster_mut(state, cluster)?;
            ensure_permission(entry, &account)?;
            let hash = CodeHash::of(data);
            entry.resources.insert(hash);
            events.push(ChainEvent::ResourceUploaded {
                cluster: *cluster,
                hash,
            });
            Ok(())
        }

        Call::InstantiateContract {
            code: CodeIndex::WasmCode(code_hash),
            selector: _,
            salt,
            cluster,
        } => {
            let deployer = signed(origin)?;
            let entry = cluster_mut(state, cluster)?;
            ensure_permission(entry, &deployer)?;
            if !entry.resources.contains(code_hash) {
                return Err(DispatchError::module(FAT_CONTRACTS, "CodeNotFound"));
            }

            let contract = contract_address(&deployer, code_hash, cluster, salt);
            if state.contracts.contains_key(&contract) {
                return Err(DispatchError::module(FAT_CONTRACTS, "DuplicatedContract"));
            }
            state.contracts.insert(
                contract,
                ContractRecord {
                    code_hash: *code_hash,
                    cluster: *cluster,
                    deployer,
                },
            );

            let kind = env.code_book.get(code_hash).copied();
            state.pending.push(Pending {
                at_block: env.block + env.key_delay_blocks,
                effect: Effect::ContractRegistered {
                    cluster: *cluster,
                    contract,
                    has_key: kind.is_some(),
                },
            });
            if let Some(kind) = kind {
                state.worker_queue.push(ScheduledTask {
                    block: env.block,
                    task: WorkerTask::Instantiate {
                        contract,
                        kind,
                        deployer,
                    },
                });
            }

            events.push(ChainEvent::Instantiating {
                contract,
                cluster: *cluster,
                deployer,
            });
            Ok(())
        }

        Call::AddCluster {
            permission,
            workers,
        } => {
            let owner = signed(origin)?;
            if state.master_pubkey.is_none() {
                return Err(DispatchError::module(FAT_CONTRACTS, "MasterKeyUninitialized"));
            }
            if workers.is_empty() || workers.iter().any(|w| !state.workers.contains(w)) {
                return Err(DispatchError::module(FAT_CONTRACTS, "WorkerNotFound"));
            }

            let cluster = state.allocate_cluster_id();
            state.clusters.insert(
                cluster,
                Cluster {
                    owner,
                    permission: permission.clone(),
                    workers: workers.clone(),
                    resources: BTreeSet::new(),
                },
            );
            state.pending.push(Pending {
                at_block: env.block + env.key_delay_blocks,
                effect: Effect::ClusterKey { cluster },
            });
            events.push(ChainEvent::ClusterCreated { cluster });
            Ok(())
        }

        Call::RegisterGatekeeper { worker } => {
            if origin != Origin::Root {
                return Err(DispatchError::BadOrigin);
            }
            if !state.workers.contains(worker) {
                return Err(DispatchError::module(REGISTRY, "WorkerNotFound"));
            }
            if state.gatekeepers.contains(worker) {
                return Err(DispatchError::module(REGISTRY, "GatekeeperAlreadyRegistered"));
            }
            state.gatekeepers.push(*worker);
            if state.master_pubkey.is_none() {
                state.pending.push(Pending {
                    at_block: env.block + env.key_delay_blocks,
                    effect: Effect::MasterKey { gatekeeper: *worker },
                });
            }
            events.push(ChainEvent::GatekeeperAdded { worker: *worker });
            Ok(())
        }

        Call::Sudo(inner) => {
            let account = signed(origin)?;
            if account != env.sudo_key {
                return Err(DispatchError::module("sudo", "RequireSudo"));
            }
            let snapshot = state.clone();
            let mark = events.len();
            let result = dispatch(state, env, Origin::Root, inner, events);
            if result.is_err() {
                *state = snapshot;
                events.truncate(mark);
            }
            events.push(ChainEvent::Sudid { result });
            Ok(())
        }

        Call::ContractTx { contract, message } => {
            let caller = signed(origin)?;
            if !state.contracts.contains_key(contract) {
                return Err(DispatchError::module(FAT_CONTRACTS, "ContractNotFound"));
            }
            state.worker_queue.push(ScheduledTask {
                block: env.block,
                task: WorkerTask::Message {
                    contract: *contract,
                    caller,
                    message: message.clone(),
                },
            });
            events.push(ChainEvent::ContractMessageQueued {
                contract: *contract,
            });
            Ok(())
        }

        Call::BatchAll(calls) => {
            for call in calls {
                dispatch(state, env, origin, call, events)?;
            }
            events.push(ChainEvent::BatchCompleted);
            Ok(())
        }
    }
}
