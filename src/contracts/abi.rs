//! ink! call data for the badge contracts.
//!
//! Call data is the message selector followed by the SCALE-encoded
//! arguments. Fallible queries return `Result<T, Error>` where `Error` is
//! the contract's own error enum, encoded by variant index.

use parity_scale_codec::{Decode, Encode};

use crate::chain::types::{AccountId, Selector};
use crate::contracts::attestation::{Attestation, Verifier};
use crate::contracts::messages::{BadgeInfo, ContractError, ContractMessage, ContractQuery, QueryOutput};
use crate::worker::api::{WorkerError, WorkerResult};

const FAT_BADGES_ERRORS: &[ContractError] = &[
    ContractError::BadOrigin,
    ContractError::BadgeNotFound,
    ContractError::NotAnIssuer,
    ContractError::NotFound,
    ContractError::RunOutOfCode,
    ContractError::Duplicated,
];

const EASY_ORACLE_ERRORS: &[ContractError] = &[
    ContractError::BadOrigin,
    ContractError::BadgeContractNotSetUp,
    ContractError::InvalidUrl,
    ContractError::RequestFailed,
    ContractError::NoClaimFound,
    ContractError::InvalidAddressLength,
    ContractError::InvalidAddress,
    ContractError::NoPermission,
    ContractError::InvalidSignature,
    ContractError::UsernameAlreadyInUse,
    ContractError::AccountAlreadyInUse,
    ContractError::FailedToIssueBadge,
];

const ADVANCED_JUDGER_ERRORS: &[ContractError] = &[
    ContractError::BadOrigin,
    ContractError::BadgeContractNotSetUp,
    ContractError::FailedToIssueBadge,
    ContractError::FailedToVerify,
    ContractError::InvalidParameter,
    ContractError::AlreadySubmitted,
];

/// ink! label of a message, as hashed into its selector.
pub fn message_label(message: &ContractMessage) -> &'static str {
    match message {
        ContractMessage::NewBadge { .. } => "new_badge",
        ContractMessage::AddIssuer { .. } => "add_issuer",
        ContractMessage::RemoveIssuer { .. } => "remove_issuer",
        ContractMessage::AddCode { .. } => "add_code",
        ContractMessage::Issue { .. } => "Issuable::issue",
        ContractMessage::ConfigIssuer { .. } => "config_issuer",
        ContractMessage::Redeem { .. } => "redeem",
    }
}

pub fn query_label(query: &ContractQuery) -> &'static str {
    match query {
        ContractQuery::GetTotalBadges => "get_total_badges",
        ContractQuery::GetBadgeInfo { .. } => "get_badge_info",
        ContractQuery::IsBadgeIssuer { .. } => "is_badge_issuer",
        ContractQuery::Get { .. } => "get",
        ContractQuery::AttestGist { .. } => "attest_gist",
        ContractQuery::Admin => "SubmittableOracle::admin",
        ContractQuery::Verifier => "SubmittableOracle::verifier",
        ContractQuery::Attest { .. } => "SubmittableOracle::attest",
        ContractQuery::CheckContract { .. } => "check_contract",
        ContractQuery::GetId => "get_id",
    }
}

fn call_data(label: &str, args: impl Encode) -> Vec<u8> {
    let mut data = Selector::of_label(label).0.to_vec();
    args.encode_to(&mut data);
    data
}

/// Call data of a state-changing message.
pub fn encode_message(message: &ContractMessage) -> Vec<u8> {
    let label = message_label(message);
    match message {
        ContractMessage::NewBadge { name } => call_data(label, name),
        ContractMessage::AddIssuer { id, issuer } | ContractMessage::RemoveIssuer { id, issuer } => {
            call_data(label, (id, issuer))
        }
        ContractMessage::AddCode { id, code } => call_data(label, (id, code)),
        ContractMessage::Issue { id, dest } => call_data(label, (id, dest)),
        ContractMessage::ConfigIssuer { contract, badge_id } => {
            call_data(label, (AccountId::from(*contract), badge_id))
        }
        ContractMessage::Redeem { attestation } => call_data(label, attestation),
    }
}

/// Call data of a read-only query.
pub fn encode_query(query: &ContractQuery) -> Vec<u8> {
    let label = query_label(query);
    match query {
        ContractQuery::GetTotalBadges
        | ContractQuery::Admin
        | ContractQuery::Verifier
        | ContractQuery::GetId => call_data(label, ()),
        ContractQuery::GetBadgeInfo { id } | ContractQuery::Get { id } => call_data(label, id),
        ContractQuery::IsBadgeIssuer { id, issuer } => call_data(label, (id, issuer)),
        ContractQuery::AttestGist { url } => call_data(label, url),
        ContractQuery::Attest { arg } => call_data(label, arg),
        ContractQuery::CheckContract { contract, url } => {
            call_data(label, (AccountId::from(*contract), url))
        }
    }
}

/// Decode the raw return value of `query`.
pub fn decode_output(query: &ContractQuery, output: &[u8]) -> WorkerResult<QueryOutput> {
    let mut input = output;
    let decoded = match query {
        ContractQuery::GetTotalBadges => QueryOutput::U32(decode(&mut input)?),
        ContractQuery::IsBadgeIssuer { .. } => QueryOutput::Bool(decode(&mut input)?),
        ContractQuery::Admin | ContractQuery::GetId => QueryOutput::Account(decode(&mut input)?),
        ContractQuery::Verifier => QueryOutput::Verifier(decode::<Verifier>(&mut input)?),
        ContractQuery::GetBadgeInfo { .. } => {
            QueryOutput::BadgeInfo(decode_fallible::<BadgeInfo>(&mut input, FAT_BADGES_ERRORS)?)
        }
        ContractQuery::Get { .. } => {
            QueryOutput::Text(decode_fallible(&mut input, FAT_BADGES_ERRORS)?)
        }
        ContractQuery::AttestGist { .. } => {
            QueryOutput::Attestation(decode_fallible(&mut input, EASY_ORACLE_ERRORS)?)
        }
        ContractQuery::CheckContract { .. } => {
            QueryOutput::Attestation(decode_fallible(&mut input, ADVANCED_JUDGER_ERRORS)?)
        }
        ContractQuery::Attest { .. } => {
            match decode::<Result<Attestation, Vec<u8>>>(&mut input)? {
                Ok(attestation) => QueryOutput::Attestation(attestation),
                Err(reason) => {
                    return Err(WorkerError::Rpc(format!(
                        "attest rejected: {}",
                        String::from_utf8_lossy(&reason)
                    )))
                }
            }
        }
    };
    Ok(decoded)
}

fn decode<T: Decode>(input: &mut &[u8]) -> WorkerResult<T> {
    T::decode(input).map_err(|e| WorkerError::Decode(e.to_string()))
}

fn decode_fallible<T: Decode>(input: &mut &[u8], errors: &[ContractError]) -> WorkerResult<T> {
    match decode::<u8>(input)? {
        0 => decode(input),
        1 => {
            let index = decode::<u8>(input)?;
            let error = errors
                .get(index as usize)
                .copied()
                .ok_or_else(|| WorkerError::Decode(format!("unknown contract error {}", index)))?;
            Err(WorkerError::Contract(error))
        }
        other => Err(WorkerError::Decode(format!("invalid result tag {}", other))),
    }
}
