//! Top-level error type.
//!
//! Subsystem errors convert in with `?`. Nothing is retried internally; every
//! error bubbles up to `main`, which logs it and exits nonzero.

use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::chain::events::DispatchError;
use crate::chain::types::ChainError;
use crate::config::loader::ConfigError;
use crate::worker::WorkerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The chain included the extrinsic but reported a dispatch failure.
    #[error("Transaction failed: {detail}")]
    TransactionFailed { call: String, detail: DispatchError },

    /// An expected asynchronous state never materialized.
    #[error(
        "Timed out after {}ms waiting for {} (last observed: {})",
        .timeout_ms,
        .what,
        .last.as_deref().unwrap_or("nothing")
    )]
    PollTimeout {
        what: String,
        timeout_ms: u64,
        last: Option<String>,
    },

    /// On-chain results do not line up with what was requested.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// An end-to-end scenario check failed.
    #[error("Scenario check failed: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, Error>;
