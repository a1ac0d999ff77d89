//! Compiled contract artifacts.
//!
//! # Data Flow
//! ```text
//! <dir>/<stem>/<stem>.wasm + <dir>/<stem>/metadata.json
//!     → loader.rs (read, parse constructor selector, verify code hash)
//!     → ArtifactSet (ordered FatBadges, EasyOracle, AdvancedJudger)
//!     → deploy (upload + instantiate, then assign_address once)
//! ```
//!
//! # Invariants
//! - An artifact's address is assigned at most once, after the chain
//!   reported its `Instantiating` event

pub mod loader;

use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;

use crate::chain::types::{CodeHash, ContractId, Selector};
use crate::contracts::ContractKind;

pub use loader::{load_artifacts, load_code_list};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metadata for {name}: {reason}")]
    Metadata { name: String, reason: String },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Code hash mismatch for {name}: metadata says {expected}, wasm hashes to {actual}")]
    CodeHashMismatch {
        name: String,
        expected: CodeHash,
        actual: CodeHash,
    },

    #[error("{name} already deployed at {address}")]
    AlreadyDeployed { name: String, address: ContractId },

    #[error("{0} has not been deployed")]
    NotDeployed(String),

    #[error("Unknown contract: {0}")]
    Unknown(String),
}

/// One compiled contract.
#[derive(Debug)]
pub struct ContractArtifact {
    pub kind: ContractKind,
    pub wasm: Vec<u8>,
    pub metadata: serde_json::Value,
    /// Selector of the `new` constructor.
    pub constructor: Selector,
    pub code_hash: CodeHash,
    address: OnceLock<ContractId>,
}

impl ContractArtifact {
    /// Build an artifact from its wasm blob and ABI metadata.
    pub fn from_parts(
        kind: ContractKind,
        wasm: Vec<u8>,
        metadata: serde_json::Value,
    ) -> Result<Self, ArtifactError> {
        let invalid = |reason: &str| ArtifactError::Metadata {
            name: kind.name().to_string(),
            reason: reason.to_string(),
        };

        let constructor = metadata
            .pointer("/V3/spec/constructors")
            .and_then(|c| c.as_array())
            .ok_or_else(|| invalid("missing V3.spec.constructors"))?
            .iter()
            .find(|c| c.get("label").and_then(|l| l.as_str()) == Some("new"))
            .and_then(|c| c.get("selector"))
            .and_then(|s| s.as_str())
            .ok_or_else(|| invalid("no `new` constructor selector"))?
            .parse::<Selector>()
            .map_err(|_| invalid("constructor selector is not 4-byte hex"))?;

        let expected = metadata
            .pointer("/source/hash")
            .and_then(|h| h.as_str())
            .ok_or_else(|| invalid("missing source.hash"))?
            .parse::<CodeHash>()
            .map_err(|_| invalid("source.hash is not 32-byte hex"))?;

        let actual = CodeHash::of(&wasm);
        if actual != expected {
            return Err(ArtifactError::CodeHashMismatch {
                name: kind.name().to_string(),
                expected,
                actual,
            });
        }

        Ok(Self {
            kind,
            wasm,
            metadata,
            constructor,
            code_hash: actual,
            address: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Record the on-chain address. Fails if one was already recorded.
    pub fn assign_address(&self, address: ContractId) -> Result<(), ArtifactError> {
        self.address.set(address).map_err(|_| ArtifactError::AlreadyDeployed {
            name: self.name().to_string(),
            address: self.address.get().copied().unwrap_or(address),
        })
    }

    pub fn address(&self) -> Option<ContractId> {
        self.address.get().copied()
    }

    /// The address, or `NotDeployed`.
    pub fn deployed_address(&self) -> Result<ContractId, ArtifactError> {
        self.address()
            .ok_or_else(|| ArtifactError::NotDeployed(self.name().to_string()))
    }
}

/// All artifacts of one run, in deployment order.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<ContractArtifact>,
}

impl ArtifactSet {
    pub fn new(artifacts: Vec<ContractArtifact>) -> Self {
        Self { artifacts }
    }

    pub fn get(&self, kind: ContractKind) -> Option<&ContractArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractArtifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
