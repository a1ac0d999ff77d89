//! Judge for submitted oracle contracts.
//!
//! `check_contract` calls the submitted oracle's `attest`, checks the result
//! against the oracle's own verifier and signs a [`GoodSubmission`] for the
//! oracle's admin, who redeems it once per contract.

use std::collections::HashSet;

use super::{issue_badge, MessageContext, QueryContext};
use crate::chain::types::{AccountId, ContractId};
use crate::contracts::attestation::{self, Attestation, Generator, GoodSubmission, Verifier};
use crate::contracts::{ContractError, ContractMessage, ContractQuery, QueryOutput};

const ATTESTATION_SALT: &[u8] = b"adv-challenge-attestation-key";

#[derive(Debug, Clone)]
pub struct AdvancedJudger {
    admin: AccountId,
    badge_contract_options: Option<(ContractId, u32)>,
    attestation_verifier: Verifier,
    attestation_generator: Generator,
    passed_contracts: HashSet<ContractId>,
}

impl AdvancedJudger {
    pub fn new(self_id: ContractId, admin: AccountId) -> Self {
        let (generator, verifier) = attestation::create(&self_id, ATTESTATION_SALT);
        Self {
            admin,
            badge_contract_options: None,
            attestation_verifier: verifier,
            attestation_generator: generator,
            passed_contracts: HashSet::new(),
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
            ContractQuery::CheckContract { contract, url } => {
                self.check_contract(ctx, contract, url).map(QueryOutput::Attestation)
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
        let data: GoodSubmission = self
            .attestation_verifier
            .verify_as(&attestation)
            .ok_or(ContractError::FailedToVerify)?;

        if data.admin != ctx.caller {
            return Err(ContractError::BadOrigin);
        }
        if !self.passed_contracts.insert(data.contract) {
            return Err(ContractError::AlreadySubmitted);
        }

        let (badges, id) = self
            .badge_contract_options
            .ok_or(ContractError::BadgeContractNotSetUp)?;
        issue_badge(ctx, &badges, id, data.admin).map_err(|_| ContractError::FailedToIssueBadge)
    }

    fn check_contract(
        &self,
        ctx: &QueryContext<'_>,
        contract: ContractId,
        url: String,
    ) -> Result<Attestation, ContractError> {
        let attestation = ctx
            .query_contract(&contract, ContractQuery::Attest { arg: url })
            .ok()
            .and_then(QueryOutput::into_attestation)
            .ok_or(ContractError::FailedToVerify)?;

        let verifier = match ctx.query_contract(&contract, ContractQuery::Verifier) {
            Ok(QueryOutput::Verifier(v)) => v,
            _ => return Err(ContractError::FailedToVerify),
        };
        if !verifier.verify(&attestation) {
            return Err(ContractError::FailedToVerify);
        }

        let admin = match ctx.query_contract(&contract, ContractQuery::Admin) {
            Ok(QueryOutput::Account(admin)) => admin,
            _ => return Err(ContractError::InvalidParameter),
        };
        Ok(self
            .attestation_generator
            .sign(&GoodSubmission { admin, contract }))
    }
}
