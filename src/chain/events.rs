//! Events emitted by included extrinsics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::types::{AccountId, ClusterId, CodeHash, ContractId, WorkerPubkey};

/// Reason a dispatch failed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchError {
    BadOrigin,
    Module { pallet: String, error: String },
    Other(String),
}

impl DispatchError {
    pub fn module(pallet: &str, error: &str) -> Self {
        Self::Module {
            pallet: pallet.to_string(),
            error: error.to_string(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadOrigin => write!(f, "BadOrigin"),
            Self::Module { pallet, error } => write!(f, "{}.{}", pallet, error),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// A chain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    ExtrinsicSuccess,
    ExtrinsicFailed {
        error: DispatchError,
    },
    BatchCompleted,
    Sudid {
        result: Result<(), DispatchError>,
    },
    ResourceUploaded {
        cluster: ClusterId,
        hash: CodeHash,
    },
    Instantiating {
        contract: ContractId,
        cluster: ClusterId,
        deployer: AccountId,
    },
    ClusterCreated {
        cluster: ClusterId,
    },
    GatekeeperAdded {
        worker: WorkerPubkey,
    },
    ContractMessageQueued {
        contract: ContractId,
    },
}

impl ChainEvent {
    /// Pallet that emitted the event.
    pub fn section(&self) -> &'static str {
        match self {
            Self::ExtrinsicSuccess | Self::ExtrinsicFailed { .. } => "system",
            Self::BatchCompleted => "utility",
            Self::Sudid { .. } => "sudo",
            Self::GatekeeperAdded { .. } => "phalaRegistry",
            Self::ResourceUploaded { .. }
            | Self::Instantiating { .. }
            | Self::ClusterCreated { .. }
            | Self::ContractMessageQueued { .. } => "phalaFatContracts",
        }
    }

    /// Event name within its pallet.
    pub fn method(&self) -> &'static str {
        match self {
            Self::ExtrinsicSuccess => "ExtrinsicSuccess",
            Self::ExtrinsicFailed { .. } => "ExtrinsicFailed",
            Self::BatchCompleted => "BatchCompleted",
            Self::Sudid { .. } => "Sudid",
            Self::ResourceUploaded { .. } => "ResourceUploaded",
            Self::Instantiating { .. } => "Instantiating",
            Self::ClusterCreated { .. } => "ClusterCreated",
            Self::GatekeeperAdded { .. } => "GatekeeperAdded",
            Self::ContractMessageQueued { .. } => "ContractMessageQueued",
        }
    }
}

/// Result of an included extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionResult {
    /// Block the extrinsic was included in.
    pub block_number: u64,
    /// Events emitted by the extrinsic, in emission order.
    pub events: Vec<ChainEvent>,
}

impl InclusionResult {
    /// First failure reported by the extrinsic, if any.
    ///
    /// A failed `Sudid` counts: sudo itself succeeds even when the wrapped
    /// call fails.
    pub fn dispatch_error(&self) -> Option<&DispatchError> {
        self.events.iter().find_map(|ev| match ev {
            ChainEvent::ExtrinsicFailed { error } => Some(error),
            ChainEvent::Sudid { result: Err(error) } => Some(error),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.dispatch_error().is_none()
    }

    /// Contract ids of `Instantiating` events, in emission order.
    pub fn instantiated_contracts(&self) -> Vec<ContractId> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                ChainEvent::Instantiating { contract, .. } => Some(*contract),
                _ => None,
            })
            .collect()
    }

    /// The cluster announced by `ClusterCreated`, if present.
    pub fn created_cluster(&self) -> Option<ClusterId> {
        self.events.iter().find_map(|ev| match ev {
            ChainEvent::ClusterCreated { cluster } => Some(*cluster),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_detection() {
        let ok = InclusionResult {
            block_number: 1,
            events: vec![ChainEvent::BatchCompleted, ChainEvent::ExtrinsicSuccess],
        };
        assert!(ok.is_success());

        let failed = InclusionResult {
            block_number: 1,
            events: vec![ChainEvent::ExtrinsicFailed {
                error: DispatchError::module("phalaFatContracts", "CodeNotFound"),
            }],
        };
        assert_eq!(
            failed.dispatch_error().map(|e| e.to_string()),
            Some("phalaFatContracts.CodeNotFound".to_string())
        );

        let sudo_failed = InclusionResult {
            block_number: 1,
            events: vec![
                ChainEvent::Sudid {
                    result: Err(DispatchError::BadOrigin),
                },
                ChainEvent::ExtrinsicSuccess,
            ],
        };
        assert_eq!(sudo_failed.dispatch_error(), Some(&DispatchError::BadOrigin));
    }

    #[test]
    fn test_instantiated_contracts_keep_order() {
        let ids: Vec<_> = (1u8..=3).map(|i| ContractId::new([i; 32])).collect();
        let result = InclusionResult {
            block_number: 7,
            events: ids
                .iter()
                .flat_map(|id| {
                    [
                        ChainEvent::ResourceUploaded {
                            cluster: ClusterId::default(),
                            hash: CodeHash::default(),
                        },
                        ChainEvent::Instantiating {
                            contract: *id,
                            cluster: ClusterId::default(),
                            deployer: AccountId::default(),
                        },
                    ]
                })
                .collect(),
        };
        assert_eq!(result.instantiated_contracts(), ids);
        assert_eq!(result.events[1].section(), "phalaFatContracts");
        assert_eq!(result.events[1].method(), "Instantiating");
    }
}
