//! Gist ownership oracle.
//!
//! `attest_gist` fetches a raw Gist, extracts the owner claim and signs a
//! [`GistQuote`]. `redeem` links the Github user to the attested account and
//! issues the configured badge. Each username and each account links once.

use std::collections::HashSet;

use super::{issue_badge, MessageContext, QueryContext};
use crate::chain::types::{AccountId, ContractId};
use crate::contracts::attestation::{self, Attestation, Generator, GistQuote, Verifier};
use crate::contracts::gist::{extract_claim, parse_gist_url};
use crate::contracts::{ContractError, ContractMessage, ContractQuery, QueryOutput};

const ATTESTATION_SALT: &[u8] = b"gist-attestation-key";

#[derive(Debug, Clone)]
pub struct EasyOracle {
    admin: AccountId,
    badge_contract_options: Option<(ContractId, u32)>,
    attestation_verifier: Verifier,
    attestation_generator: Generator,
    linked_users: HashSet<String>,
    linked_accounts: HashSet<AccountId>,
}

impl EasyOracle {
    pub fn new(self_id: ContractId, admin: AccountId) -> Self {
        let (generator, verifier) = attestation::create(&self_id, ATTESTATION_SALT);
        Self {
            admin,
            badge_contract_options: None,
            attestation_verifier: verifier,
            attestation_generator: generator,
            linked_users: HashSet::new(),
            linked_accounts: HashSet::new(),
        }
    }

    pub(super) fn handle(
        &mut self,
        mut ctx: MessageContext<'_>,
        message: ContractMessage,
    ) -> Result<(), ContractError> {
        match message {
            ContractMessage::ConfigIssuer { contract, badge_id } => {
                if ctx.caller != self.admin {
                    return Err(ContractError::BadOrigin);
                }
                self.badge_contract_options = Some((contract, badge_id));
                Ok(())
            }
            ContractMessage::Redeem { attestation } => self.redeem(&mut ctx, attestation),
            _ => Err(ContractError::Unsupported),
        }
    }

    pub(super) fn query(
        &self,
        ctx: &QueryContext<'_>,
        query: ContractQuery,
    ) -> Result<QueryOutput, ContractError> {
        match query {
            ContractQuery::AttestGist { url } | ContractQuery::Attest { arg: url } => {
                self.attest_gist(ctx, &url).map(QueryOutput::Attestation)
            }
            ContractQuery::Admin => Ok(QueryOutput::Account(self.admin)),
            ContractQuery::Verifier => Ok(QueryOutput::Verifier(self.attestation_verifier.clone())),
            ContractQuery::GetId => Ok(QueryOutput::Account(ctx.self_id.into())),
            _ => Err(ContractError::Unsupported),
        }
    }

    fn redeem(
        &mut self,
        ctx: &mut MessageContext<'_>,
        attestation: Attestation,
    ) -> Result<(), ContractError> {
        let quote: GistQuote = self
            .attestation_verifier
            .verify_as(&attestation)
            .ok_or(ContractError::InvalidSignature)?;

        if quote.account_id != ctx.caller {
            return Err(ContractError::NoPermission);
        }
        if self.linked_users.contains(&quote.username) {
            return Err(ContractError::UsernameAlreadyInUse);
        }
        if self.linked_accounts.contains(&quote.account_id) {
            return Err(ContractError::AccountAlreadyInUse);
        }

        let (badges, id) = self
            .badge_contract_options
            .ok_or(ContractError::BadgeContractNotSetUp)?;
        issue_badge(ctx, &badges, id, quote.account_id)
            .map_err(|_| ContractError::FailedToIssueBadge)?;

        self.linked_users.insert(quote.username);
        self.linked_accounts.insert(quote.account_id);
        Ok(())
    }

    fn attest_gist(&self, ctx: &QueryContext<'_>, url: &str) -> Result<Attestation, ContractError> {
        let gist_url = parse_gist_url(url)?;
        let (status, body) = ctx.http.get(url);
        if status != 200 {
            return Err(ContractError::RequestFailed);
        }
        let account_id = extract_claim(body)?;
        Ok(self.attestation_generator.sign(&GistQuote {
            username: gist_url.username,
            account_id,
        }))
    }
}
