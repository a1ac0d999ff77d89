//! Badge registry: badges, issuers and redeem codes.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{MessageContext, QueryContext};
use crate::chain::types::AccountId;
use crate::contracts::{BadgeInfo, ContractError, ContractMessage, ContractQuery, QueryOutput};

#[derive(Debug, Clone)]
pub struct FatBadges {
    admin: AccountId,
    total_badges: u32,
    badge_info: BTreeMap<u32, BadgeInfo>,
    badge_issuers: HashSet<(u32, AccountId)>,
    badge_code: HashMap<(u32, u32), String>,
    /// (badge, holder) → index into the badge's codes.
    badge_assignments: HashMap<(u32, AccountId), u32>,
}

impl FatBadges {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            total_badges: 0,
            badge_info: BTreeMap::new(),
            badge_issuers: HashSet::new(),
            badge_code: HashMap::new(),
            badge_assignments: HashMap::new(),
        }
    }

    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub(super) fn handle(
        &mut self,
        ctx: MessageContext<'_>,
        message: ContractMessage,
    ) -> Result<(), ContractError> {
        let caller = ctx.caller;
        match message {
            ContractMessage::NewBadge { name } => self.new_badge(caller, name).map(|_| ()),
            ContractMessage::AddIssuer { id, issuer } => {
                self.ensure_badge_admin(caller, id)?;
                self.badge_issuers.insert((id, issuer));
                Ok(())
            }
            ContractMessage::RemoveIssuer { id, issuer } => {
                self.ensure_badge_admin(caller, id)?;
                self.badge_issuers.remove(&(id, issuer));
                Ok(())
            }
            ContractMessage::AddCode { id, code } => self.add_code(caller, id, code),
            ContractMessage::Issue { id, dest } => self.issue(caller, id, dest),
            ContractMessage::ConfigIssuer { .. } | ContractMessage::Redeem { .. } => {
                Err(ContractError::Unsupported)
            }
        }
    }

    pub(super) fn query(
        &self,
        ctx: &QueryContext<'_>,
        query: ContractQuery,
    ) -> Result<QueryOutput, ContractError> {
        match query {
            ContractQuery::GetTotalBadges => Ok(QueryOutput::U32(self.total_badges)),
            ContractQuery::GetBadgeInfo { id } => self
                .badge_info
                .get(&id)
                .cloned()
                .map(QueryOutput::BadgeInfo)
                .ok_or(ContractError::BadgeNotFound),
            ContractQuery::IsBadgeIssuer { id, issuer } => {
                Ok(QueryOutput::Bool(self.badge_issuers.contains(&(id, issuer))))
            }
            ContractQuery::Get { id } => self.get(ctx.caller, id).map(QueryOutput::Text),
            ContractQuery::Admin => Ok(QueryOutput::Account(self.admin)),
            ContractQuery::GetId => Ok(QueryOutput::Account(ctx.self_id.into())),
            _ => Err(ContractError::Unsupported),
        }
    }

    fn new_badge(&mut self, caller: AccountId, name: String) -> Result<u32, ContractError> {
        let id = self.total_badges;
        self.badge_info.insert(
            id,
            BadgeInfo {
                id,
                admin: caller,
                name,
                num_code: 0,
                num_issued: 0,
            },
        );
        self.total_badges += 1;
        Ok(id)
    }

    fn add_code(&mut self, caller: AccountId, id: u32, code: Vec<String>) -> Result<(), ContractError> {
        let mut badge = self.ensure_badge_admin(caller, id)?;
        let start = badge.num_code;
        badge.num_code += code.len() as u32;
        for (i, entry) in code.into_iter().enumerate() {
            self.badge_code.insert((id, start + i as u32), entry);
        }
        self.badge_info.insert(id, badge);
        Ok(())
    }

    fn issue(&mut self, caller: AccountId, id: u32, dest: AccountId) -> Result<(), ContractError> {
        let mut badge = self.ensure_badge(id)?;
        if !self.badge_issuers.contains(&(id, caller)) && caller != badge.admin {
            return Err(ContractError::NotAnIssuer);
        }
        if badge.num_issued >= badge.num_code {
            return Err(ContractError::RunOutOfCode);
        }
        if self.badge_assignments.contains_key(&(id, dest)) {
            return Err(ContractError::Duplicated);
        }
        self.badge_assignments.insert((id, dest), badge.num_issued);
        badge.num_issued += 1;
        self.badge_info.insert(id, badge);
        Ok(())
    }

    fn get(&self, caller: AccountId, id: u32) -> Result<String, ContractError> {
        let idx = self
            .badge_assignments
            .get(&(id, caller))
            .ok_or(ContractError::NotFound)?;
        // assignments only point at existing codes
        self.badge_code
            .get(&(id, *idx))
            .cloned()
            .ok_or(ContractError::NotFound)
    }

    fn ensure_badge(&self, id: u32) -> Result<BadgeInfo, ContractError> {
        self.badge_info.get(&id).cloned().ok_or(ContractError::BadgeNotFound)
    }

    fn ensure_badge_admin(&self, caller: AccountId, id: u32) -> Result<BadgeInfo, ContractError> {
        let badge = self.ensure_badge(id)?;
        if badge.admin != caller {
            return Err(ContractError::BadOrigin);
        }
        Ok(badge)
    }
}
