//! Messages, queries and results exchanged with the badge contracts.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::types::{AccountId, ContractId};
use crate::contracts::attestation::{Attestation, Verifier};

/// The basic information of a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BadgeInfo {
    /// Badge ID
    pub id: u32,
    /// The admin to manage the badge
    pub admin: AccountId,
    /// Name of the badge
    pub name: String,
    /// Total available redeem code
    pub num_code: u32,
    /// The number of issued badges
    pub num_issued: u32,
}

/// State-changing contract messages, delivered through `ContractTx` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "camelCase")]
pub enum ContractMessage {
    // FatBadges
    NewBadge { name: String },
    AddIssuer { id: u32, issuer: AccountId },
    RemoveIssuer { id: u32, issuer: AccountId },
    AddCode { id: u32, code: Vec<String> },
    Issue { id: u32, dest: AccountId },

    // EasyOracle / AdvancedJudger
    ConfigIssuer { contract: ContractId, badge_id: u32 },
    Redeem { attestation: Attestation },
}

impl ContractMessage {
    /// ABI label of the message, as used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewBadge { .. } => "newBadge",
            Self::AddIssuer { .. } => "addIssuer",
            Self::RemoveIssuer { .. } => "removeIssuer",
            Self::AddCode { .. } => "addCode",
            Self::Issue { .. } => "issuable::issue",
            Self::ConfigIssuer { .. } => "configIssuer",
            Self::Redeem { .. } => "redeem",
        }
    }
}

/// Read-only contract queries, answered by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "camelCase")]
pub enum ContractQuery {
    // FatBadges
    GetTotalBadges,
    GetBadgeInfo { id: u32 },
    IsBadgeIssuer { id: u32, issuer: AccountId },
    Get { id: u32 },

    // EasyOracle
    AttestGist { url: String },

    // SubmittableOracle trait
    Admin,
    Verifier,
    Attest { arg: String },

    // AdvancedJudger
    CheckContract { contract: ContractId, url: String },

    /// Account id of the contract instance itself.
    GetId,
}

/// Successful query output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum QueryOutput {
    U32(u32),
    Bool(bool),
    Text(String),
    Account(AccountId),
    BadgeInfo(BadgeInfo),
    Attestation(Attestation),
    Verifier(Verifier),
}

impl QueryOutput {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_badge_info(self) -> Option<BadgeInfo> {
        match self {
            Self::BadgeInfo(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_attestation(self) -> Option<Attestation> {
        match self {
            Self::Attestation(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the variant, for mismatch reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::U32(_) => "u32",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Account(_) => "account",
            Self::BadgeInfo(_) => "badgeInfo",
            Self::Attestation(_) => "attestation",
            Self::Verifier(_) => "verifier",
        }
    }
}

/// Errors returned by the contracts themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ContractError {
    #[error("bad origin")]
    BadOrigin,
    #[error("badge not found")]
    BadgeNotFound,
    #[error("caller is not an issuer")]
    NotAnIssuer,
    #[error("not found")]
    NotFound,
    #[error("run out of redeem code")]
    RunOutOfCode,
    #[error("duplicated")]
    Duplicated,
    #[error("badge contract not set up")]
    BadgeContractNotSetUp,
    #[error("invalid url")]
    InvalidUrl,
    #[error("request failed")]
    RequestFailed,
    #[error("no claim found")]
    NoClaimFound,
    #[error("invalid address length")]
    InvalidAddressLength,
    #[error("invalid address")]
    InvalidAddress,
    #[error("no permission")]
    NoPermission,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("username already in use")]
    UsernameAlreadyInUse,
    #[error("account already in use")]
    AccountAlreadyInUse,
    #[error("failed to issue badge")]
    FailedToIssueBadge,
    #[error("failed to verify")]
    FailedToVerify,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("already submitted")]
    AlreadySubmitted,
    /// The contract has no such message or query.
    #[error("unsupported message")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_labels() {
        let msg = ContractMessage::NewBadge { name: "x".into() };
        assert_eq!(msg.label(), "newBadge");
        let msg = ContractMessage::ConfigIssuer {
            contract: ContractId::default(),
            badge_id: 1,
        };
        assert_eq!(msg.label(), "configIssuer");
    }

    #[test]
    fn test_query_output_accessors() {
        assert_eq!(QueryOutput::U32(2).as_u32(), Some(2));
        assert_eq!(QueryOutput::Bool(true).as_u32(), None);
        assert_eq!(QueryOutput::Text("code1".into()).as_text(), Some("code1"));
        assert_eq!(QueryOutput::Bool(false).kind(), "bool");
    }

    #[test]
    fn test_message_json_shape() {
        let msg = ContractMessage::AddCode {
            id: 0,
            code: vec!["easy1".into()],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["message"], "addCode");
        assert_eq!(json["code"][0], "easy1");
    }
}
