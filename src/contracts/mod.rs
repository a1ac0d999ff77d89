//! Badge contract ABI.
//!
//! # Contracts
//! ```text
//! FatBadges       badge registry: badges, issuers, redeem codes
//! EasyOracle      attests a Gist claim, redeems it into a FatBadges badge
//! AdvancedJudger  checks a submitted oracle, redeems into a FatBadges badge
//! ```
//!
//! Messages travel on-chain inside `ContractTx` calls and run on the worker
//! once it processes their block. Queries go straight to the worker.
//!
//! On a live network both are ink! call data (abi.rs) sealed for the
//! contract's key (envelope.rs).

pub mod abi;
pub mod attestation;
pub mod envelope;
pub mod gist;
pub mod messages;

pub use attestation::{Attestation, GistQuote, GoodSubmission, Verifier};
pub use messages::{BadgeInfo, ContractError, ContractMessage, ContractQuery, QueryOutput};

/// The contracts this tool deploys, in deployment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    FatBadges,
    EasyOracle,
    AdvancedJudger,
}

impl ContractKind {
    pub const ALL: [ContractKind; 3] = [
        ContractKind::FatBadges,
        ContractKind::EasyOracle,
        ContractKind::AdvancedJudger,
    ];

    /// Contract name as it appears in the ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FatBadges => "FatBadges",
            Self::EasyOracle => "EasyOracle",
            Self::AdvancedJudger => "AdvancedJudger",
        }
    }

    /// Build directory / file stem of the compiled artifact.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::FatBadges => "fat_badges",
            Self::EasyOracle => "easy_oracle",
            Self::AdvancedJudger => "advanced_judger",
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
