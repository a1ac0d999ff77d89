//! Worker access seams and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::types::{ChainError, ContractId};
use crate::contracts::envelope::EnvelopeError;
use crate::contracts::{ContractError, ContractQuery, QueryOutput};
use crate::worker::certificate::Certificate;

/// Status reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerInfo {
    /// Hex identity public key, without `0x`.
    pub public_key: String,
    /// Next block the worker will process.
    pub blocknum: u64,
    /// Highest header the worker has synced.
    pub headernum: u64,
}

impl WorkerInfo {
    /// Whether the worker has fully processed block `number`.
    pub fn has_processed(&self, number: u64) -> bool {
        self.blocknum > number
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Worker answered with an error status.
    #[error("Worker RPC error: {0}")]
    Rpc(String),

    /// Response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The certificate does not match its claimed signer.
    #[error("Invalid certificate")]
    InvalidCertificate,

    /// No contract with this id on the worker.
    #[error("Contract {0} not found on worker")]
    ContractNotFound(ContractId),

    /// The contract rejected the query.
    #[error("Contract returned error: {0}")]
    Contract(#[from] ContractError),

    /// The query or its response could not be sealed or opened.
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Chain state the query depends on was unavailable.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

#[async_trait]
pub trait WorkerApi: Send + Sync {
    async fn get_info(&self) -> WorkerResult<WorkerInfo>;
}

/// Read-only contract queries executed by a worker.
#[async_trait]
pub trait ContractQuerier: Send + Sync {
    async fn query(
        &self,
        cert: &Certificate,
        contract: &ContractId,
        query: ContractQuery,
    ) -> WorkerResult<QueryOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_processed() {
        let info = WorkerInfo {
            blocknum: 10,
            ..Default::default()
        };
        assert!(info.has_processed(9));
        assert!(!info.has_processed(10));
    }

    #[test]
    fn test_contract_error_conversion() {
        let err: WorkerError = ContractError::NotFound.into();
        assert_eq!(err.to_string(), "Contract returned error: not found");
    }
}
