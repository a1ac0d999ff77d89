//! Chain calls and the extrinsic envelope.

use serde::{Deserialize, Serialize};

use crate::chain::types::{AccountId, ClusterId, CodeHash, ContractId, Selector, WorkerPubkey};
use crate::chain::wallet::Wallet;
use crate::contracts::ContractMessage;

/// Kind of resource uploaded to a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    InkCode,
}

/// Who may deploy into a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterPermission {
    Public,
    OnlyOwner(AccountId),
}

/// Code reference for instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeIndex {
    WasmCode(CodeHash),
}

/// A dispatchable chain call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Call {
    /// `phalaFatContracts.clusterUploadResource`
    UploadResource {
        cluster: ClusterId,
        kind: ResourceType,
        data: Vec<u8>,
    },
    /// `phalaFatContracts.instantiateContract`
    InstantiateContract {
        code: CodeIndex,
        selector: Selector,
        salt: Vec<u8>,
        cluster: ClusterId,
    },
    /// `phalaFatContracts.addCluster`
    AddCluster {
        permission: ClusterPermission,
        workers: Vec<WorkerPubkey>,
    },
    /// `phalaRegistry.registerGatekeeper` (root only)
    RegisterGatekeeper { worker: WorkerPubkey },
    /// `sudo.sudo`
    Sudo(Box<Call>),
    /// A message pushed to a deployed contract.
    ContractTx {
        contract: ContractId,
        message: ContractMessage,
    },
    /// `utility.batchAll`: all calls succeed or none do.
    BatchAll(Vec<Call>),
}

impl Call {
    pub fn batch_all(calls: Vec<Call>) -> Self {
        Self::BatchAll(calls)
    }

    pub fn sudo(call: Call) -> Self {
        Self::Sudo(Box::new(call))
    }

    pub fn contract_tx(contract: ContractId, message: ContractMessage) -> Self {
        Self::ContractTx { contract, message }
    }

    /// `section.method` label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::UploadResource { .. } => "phalaFatContracts.clusterUploadResource".into(),
            Self::InstantiateContract { .. } => "phalaFatContracts.instantiateContract".into(),
            Self::AddCluster { .. } => "phalaFatContracts.addCluster".into(),
            Self::RegisterGatekeeper { .. } => "phalaRegistry.registerGatekeeper".into(),
            Self::Sudo(inner) => format!("sudo.sudo({})", inner.label()),
            Self::ContractTx { message, .. } => format!("contract.{}", message.label()),
            Self::BatchAll(calls) => format!("utility.batchAll[{}]", calls.len()),
        }
    }
}

/// A call bound to its signer and nonce, ready for submission.
#[derive(Debug, Clone)]
pub struct SignedCall {
    pub call: Call,
    pub signer: Wallet,
    pub nonce: u64,
}
