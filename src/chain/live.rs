//! Live chain backend over subxt.
//!
//! # Responsibilities
//! - Connect to the first reachable configured endpoint
//! - Encode [`Call`] trees as dynamic runtime calls and sign them sr25519
//! - Seal contract messages for the contract's key before pushing them
//! - Map inclusion events back to [`ChainEvent`]
//! - Read registry storage raw and decode it with SCALE
//!
//! Pallet and storage names follow the Phala runtime metadata.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use parity_scale_codec::{Decode, Encode};
use serde_json::json;
use subxt::dynamic::{self, Value};
use subxt::tx::TxStatus;
use subxt::utils::AccountId32;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::chain::api::{ChainApi, ChainHead};
use crate::chain::call::{Call, ClusterPermission, CodeIndex, ResourceType, SignedCall};
use crate::chain::client::NodeClient;
use crate::chain::events::{ChainEvent, DispatchError, InclusionResult};
use crate::chain::types::{AccountId, ChainError, ChainResult, ClusterId, ContractId, WorkerPubkey};
use crate::config::schema::NetworkConfig;
use crate::contracts::abi;
use crate::contracts::envelope::{CommandPayload, InkCommand, Session};

/// Upper bound on the wait between submission and block inclusion.
const INCLUSION_TIMEOUT: Duration = Duration::from_secs(120);

/// Page size for `state_getKeysPaged`.
const KEYS_PAGE: u32 = 1000;

const REGISTRY: &str = "PhalaRegistry";
const FAT_CONTRACTS: &str = "PhalaFatContracts";

fn rpc(e: subxt::Error) -> ChainError {
    ChainError::Rpc(e.to_string())
}

/// [`ChainApi`] backed by a Substrate node.
pub struct LiveChain {
    api: OnlineClient<PolkadotConfig>,
    node: NodeClient,
    timeout_duration: Duration,
}

impl LiveChain {
    /// Connect to the configured chain, trying each endpoint in turn.
    pub async fn connect(config: &NetworkConfig) -> ChainResult<Self> {
        let node = NodeClient::new(config)?;
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        for (i, endpoint) in node.endpoints().iter().enumerate() {
            let connecting = OnlineClient::<PolkadotConfig>::from_insecure_url(endpoint.as_str());
            match timeout(timeout_duration, connecting).await {
                Ok(Ok(api)) => {
                    info!(endpoint_idx = i, "Chain: connected");
                    return Ok(Self {
                        api,
                        node,
                        timeout_duration,
                    });
                }
                Ok(Err(e)) => {
                    warn!(endpoint_idx = i, error = %e, "Chain connect failed, trying next endpoint");
                }
                Err(_) => {
                    warn!(endpoint_idx = i, "Chain connect timeout, trying next endpoint");
                }
            }
        }
        Err(ChainError::Rpc("All chain endpoints failed for connect".into()))
    }

    async fn bounded<T, F>(&self, fut: F) -> ChainResult<T>
    where
        F: Future<Output = Result<T, subxt::Error>>,
    {
        timeout(self.timeout_duration, fut)
            .await
            .map_err(|_| ChainError::Timeout(self.timeout_duration.as_secs()))?
            .map_err(rpc)
    }

    /// Raw storage value, `None` when the entry is absent.
    async fn fetch(&self, pallet: &str, entry: &str, keys: Vec<Value>) -> ChainResult<Option<Vec<u8>>> {
        let address = dynamic::storage(pallet, entry, keys);
        let key = self.api.storage().address_bytes(&address).map_err(rpc)?;
        let storage = self.bounded(self.api.storage().at_latest()).await?;
        self.bounded(storage.fetch_raw(key)).await
    }

    async fn fetch_decoded<T: Decode>(
        &self,
        pallet: &str,
        entry: &str,
        keys: Vec<Value>,
    ) -> ChainResult<Option<T>> {
        self.fetch(pallet, entry, keys)
            .await?
            .map(|raw| {
                T::decode(&mut raw.as_slice())
                    .map_err(|e| ChainError::Decode(format!("{}.{}: {}", pallet, entry, e)))
            })
            .transpose()
    }

    /// Keys of every `PhalaRegistry.Workers` entry.
    async fn worker_keys(&self) -> ChainResult<Vec<String>> {
        let address = dynamic::storage(REGISTRY, "Workers", Vec::<Value>::new());
        let prefix = format!("0x{}", hex::encode(self.api.storage().address_bytes(&address).map_err(rpc)?));

        let mut keys: Vec<String> = Vec::new();
        loop {
            let start = keys.last().cloned();
            let page: Vec<String> = self
                .node
                .call("state_getKeysPaged", json!([prefix, KEYS_PAGE, start]))
                .await?;
            let done = page.len() < KEYS_PAGE as usize;
            keys.extend(page);
            if done {
                return Ok(keys);
            }
        }
    }

    /// Contract keys for every `ContractTx` in `call`.
    async fn contract_keys(&self, call: &Call) -> ChainResult<HashMap<ContractId, [u8; 32]>> {
        let mut targets = Vec::new();
        collect_contract_targets(call, &mut targets);
        let mut keys = HashMap::new();
        for contract in targets {
            let key = self
                .contract_key(&contract)
                .await?
                .ok_or_else(|| ChainError::Rpc(format!("no key for contract {}", contract)))?;
            keys.insert(contract, key_bytes(&key)?);
        }
        Ok(keys)
    }
}

fn collect_contract_targets(call: &Call, out: &mut Vec<ContractId>) {
    match call {
        Call::ContractTx { contract, .. } => {
            if !out.contains(contract) {
                out.push(*contract);
            }
        }
        Call::Sudo(inner) => collect_contract_targets(inner, out),
        Call::BatchAll(calls) => calls.iter().for_each(|c| collect_contract_targets(c, out)),
        _ => {}
    }
}

fn key_bytes(raw: &[u8]) -> ChainResult<[u8; 32]> {
    raw.try_into()
        .map_err(|_| ChainError::Decode(format!("expected a 32-byte key, got {} bytes", raw.len())))
}

/// Message queue topic of a contract's command channel.
pub fn command_topic(contract: &ContractId) -> String {
    format!("phala/contract/{}/command", hex::encode(contract.as_bytes()))
}

/// A runtime call: pallet, call name and positional fields.
#[derive(Debug)]
struct CallPart {
    pallet: &'static str,
    call: &'static str,
    fields: Vec<Value>,
}

impl CallPart {
    fn new(pallet: &'static str, call: &'static str, fields: Vec<Value>) -> Self {
        Self { pallet, call, fields }
    }

    /// The call as a `RuntimeCall` value, for nesting in sudo or batches.
    fn into_runtime_call(self) -> Value {
        Value::unnamed_variant(self.pallet, [Value::unnamed_variant(self.call, self.fields)])
    }
}

/// Seals [`ContractMessage`](crate::contracts::ContractMessage)s into
/// command payloads.
struct CommandSealer<'a> {
    session: &'a Session,
    keys: &'a HashMap<ContractId, [u8; 32]>,
}

impl CommandSealer<'_> {
    fn seal(&self, contract: &ContractId, call_data: Vec<u8>) -> ChainResult<Vec<u8>> {
        let key = self
            .keys
            .get(contract)
            .ok_or_else(|| ChainError::Rpc(format!("no key for contract {}", contract)))?;
        let nonce: [u8; 32] = rand::random();
        let command = InkCommand::InkMessage {
            nonce: nonce.to_vec(),
            message: call_data,
        };
        let sealed = self.session.seal(key, &command.encode())?;
        Ok(CommandPayload::Encrypted(sealed).encode())
    }
}

fn bytes(data: &[u8]) -> Value {
    Value::from_bytes(data)
}

fn call_part(call: &Call, sealer: &CommandSealer<'_>) -> ChainResult<CallPart> {
    let part = match call {
        Call::UploadResource { cluster, kind, data } => {
            let kind = match kind {
                ResourceType::InkCode => Value::unnamed_variant("InkCode", Vec::<Value>::new()),
            };
            CallPart::new(
                FAT_CONTRACTS,
                "cluster_upload_resource",
                vec![bytes(cluster.as_bytes()), kind, bytes(data)],
            )
        }
        Call::InstantiateContract {
            code,
            selector,
            salt,
            cluster,
        } => {
            let code = match code {
                CodeIndex::WasmCode(hash) => {
                    Value::unnamed_variant("WasmCode", [bytes(hash.as_bytes())])
                }
            };
            CallPart::new(
                FAT_CONTRACTS,
                "instantiate_contract",
                vec![code, bytes(&selector.0), bytes(salt), bytes(cluster.as_bytes())],
            )
        }
        Call::AddCluster { permission, workers } => {
            let permission = match permission {
                ClusterPermission::Public => Value::unnamed_variant("Public", Vec::<Value>::new()),
                ClusterPermission::OnlyOwner(owner) => {
                    Value::unnamed_variant("OnlyOwner", [bytes(owner.as_bytes())])
                }
            };
            let workers = Value::unnamed_composite(workers.iter().map(|w| bytes(w.as_bytes())));
            CallPart::new(FAT_CONTRACTS, "add_cluster", vec![permission, workers])
        }
        Call::RegisterGatekeeper { worker } => {
            CallPart::new(REGISTRY, "register_gatekeeper", vec![bytes(worker.as_bytes())])
        }
        Call::Sudo(inner) => {
            CallPart::new("Sudo", "sudo", vec![call_part(inner, sealer)?.into_runtime_call()])
        }
        Call::BatchAll(calls) => {
            let calls = calls
                .iter()
                .map(|c| call_part(c, sealer).map(CallPart::into_runtime_call))
                .collect::<ChainResult<Vec<_>>>()?;
            CallPart::new("Utility", "batch_all", vec![Value::unnamed_composite(calls)])
        }
        Call::ContractTx { contract, message } => {
            let payload = sealer.seal(contract, abi::encode_message(message))?;
            CallPart::new(
                "PhalaMq",
                "push_message",
                vec![bytes(command_topic(contract).as_bytes()), bytes(&payload)],
            )
        }
    };
    Ok(part)
}

/// Map one emitted event. `describe` renders the event fields for failures.
fn map_event(
    pallet: &str,
    variant: &str,
    fields: &[u8],
    describe: impl FnOnce() -> String,
) -> Option<ChainEvent> {
    let id = |range: std::ops::Range<usize>| -> Option<[u8; 32]> {
        fields.get(range).and_then(|b| b.try_into().ok())
    };
    match (pallet, variant) {
        ("System", "ExtrinsicSuccess") => Some(ChainEvent::ExtrinsicSuccess),
        ("System", "ExtrinsicFailed") => Some(ChainEvent::ExtrinsicFailed {
            error: DispatchError::Other(describe()),
        }),
        ("Utility", "BatchCompleted") => Some(ChainEvent::BatchCompleted),
        ("Sudo", "Sudid") => {
            let result = match fields.first() {
                Some(0) => Ok(()),
                _ => Err(DispatchError::Other(describe())),
            };
            Some(ChainEvent::Sudid { result })
        }
        (FAT_CONTRACTS, "Instantiating") => Some(ChainEvent::Instantiating {
            contract: ContractId::new(id(0..32)?),
            cluster: ClusterId::new(id(32..64)?),
            deployer: AccountId::new(id(64..96)?),
        }),
        (FAT_CONTRACTS, "ClusterCreated") => Some(ChainEvent::ClusterCreated {
            cluster: ClusterId::new(id(0..32)?),
        }),
        (REGISTRY, "GatekeeperAdded") => Some(ChainEvent::GatekeeperAdded {
            worker: WorkerPubkey::new(id(0..32)?),
        }),
        _ => None,
    }
}

/// Worker pubkey at the tail of a `Workers` storage key.
fn worker_from_key(key: &str) -> ChainResult<WorkerPubkey> {
    let raw = hex::decode(key.trim_start_matches("0x"))
        .map_err(|e| ChainError::Decode(format!("storage key '{}': {}", key, e)))?;
    let tail = raw
        .len()
        .checked_sub(32)
        .and_then(|start| raw.get(start..))
        .ok_or_else(|| ChainError::Decode(format!("storage key '{}' too short", key)))?;
    Ok(WorkerPubkey::new(key_bytes(tail)?))
}

#[async_trait]
impl ChainHead for LiveChain {
    async fn block_number(&self) -> ChainResult<u64> {
        self.node.block_number().await
    }
}

#[async_trait]
impl ChainApi for LiveChain {
    async fn account_nonce(&self, account: &AccountId) -> ChainResult<u64> {
        self.bounded(self.api.tx().account_nonce(&AccountId32(account.0)))
            .await
    }

    async fn submit_and_watch(&self, xt: SignedCall) -> ChainResult<InclusionResult> {
        let label = xt.call.label();
        let keys = self.contract_keys(&xt.call).await?;
        let session = Session::generate()?;
        let sealer = CommandSealer {
            session: &session,
            keys: &keys,
        };
        let part = call_part(&xt.call, &sealer)?;
        let tx = dynamic::tx(part.pallet, part.call, part.fields);

        let mut progress = self
            .bounded(
                self.api
                    .tx()
                    .sign_and_submit_then_watch_default(&tx, xt.signer.keypair()),
            )
            .await?;
        debug!(call = %label, nonce = xt.nonce, "Extrinsic broadcast");

        let included = timeout(INCLUSION_TIMEOUT, async {
            while let Some(status) = progress.next().await {
                match status.map_err(rpc)? {
                    TxStatus::InBestBlock(block) | TxStatus::InFinalizedBlock(block) => {
                        return Ok(block);
                    }
                    TxStatus::Error { message }
                    | TxStatus::Invalid { message }
                    | TxStatus::Dropped { message } => {
                        return Err(ChainError::InvalidTransaction(message));
                    }
                    _ => continue,
                }
            }
            Err(ChainError::ConnectionClosed)
        })
        .await
        .map_err(|_| ChainError::Timeout(INCLUSION_TIMEOUT.as_secs()))??;

        let block = self.bounded(self.api.blocks().at(included.block_hash())).await?;
        let block_number: u64 = block.number().into();

        let emitted = self.bounded(included.fetch_events()).await?;
        let mut events = Vec::new();
        for event in emitted.iter() {
            let event = event.map_err(rpc)?;
            let describe = || {
                event
                    .field_values()
                    .map(|v| format!("{:?}", v))
                    .unwrap_or_else(|e| e.to_string())
            };
            if let Some(mapped) =
                map_event(event.pallet_name(), event.variant_name(), event.field_bytes(), describe)
            {
                events.push(mapped);
            }
        }

        Ok(InclusionResult {
            block_number,
            events,
        })
    }

    async fn workers(&self) -> ChainResult<Vec<WorkerPubkey>> {
        self.worker_keys()
            .await?
            .iter()
            .map(|key| worker_from_key(key))
            .collect()
    }

    async fn gatekeepers(&self) -> ChainResult<Vec<WorkerPubkey>> {
        let keys: Option<Vec<[u8; 32]>> = self.fetch_decoded(REGISTRY, "Gatekeeper", vec![]).await?;
        Ok(keys.unwrap_or_default().into_iter().map(WorkerPubkey::new).collect())
    }

    async fn gatekeeper_master_pubkey(&self) -> ChainResult<Option<Vec<u8>>> {
        self.fetch(REGISTRY, "GatekeeperMasterPubkey", vec![]).await
    }

    async fn cluster_key(&self, cluster: &ClusterId) -> ChainResult<Option<Vec<u8>>> {
        self.fetch(REGISTRY, "ClusterKeys", vec![bytes(cluster.as_bytes())])
            .await
    }

    async fn cluster_contracts(&self, cluster: &ClusterId) -> ChainResult<Vec<ContractId>> {
        let ids: Option<Vec<[u8; 32]>> = self
            .fetch_decoded(FAT_CONTRACTS, "ClusterContracts", vec![bytes(cluster.as_bytes())])
            .await?;
        Ok(ids.unwrap_or_default().into_iter().map(ContractId::new).collect())
    }

    async fn contract_key(&self, contract: &ContractId) -> ChainResult<Option<Vec<u8>>> {
        self.fetch(REGISTRY, "ContractKeys", vec![bytes(contract.as_bytes())])
            .await
    }
}

impl std::fmt::Debug for LiveChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChain")
            .field("node", &self.node)
            .field("timeout", &self.timeout_duration)
            .finish_non_exhaustive()
    }
}
