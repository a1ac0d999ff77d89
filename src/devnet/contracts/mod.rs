//! Native contract runtimes executed by the devnet worker.
//!
//! Messages run transactionally: an `Err` result restores every instance
//! touched by the message, cross-contract calls included.

mod advanced_judger;
mod easy_oracle;
mod fat_badges;

use std::collections::HashMap;

use crate::chain::types::{AccountId, ContractId};
use crate::contracts::{ContractError, ContractKind, ContractMessage, ContractQuery, QueryOutput};
use crate::devnet::fixtures::HttpFixtures;

pub use advanced_judger::AdvancedJudger;
pub use easy_oracle::EasyOracle;
pub use fat_badges::FatBadges;

/// Instances known to the worker, by address.
pub type Instances = HashMap<ContractId, ContractInstance>;

/// Execution context of a state-changing message.
pub struct MessageContext<'a> {
    pub caller: AccountId,
    pub self_id: ContractId,
    /// Every other instance, the executing one removed.
    pub others: &'a mut Instances,
}

/// Execution context of a read-only query.
pub struct QueryContext<'a> {
    pub caller: AccountId,
    pub self_id: ContractId,
    pub instances: &'a Instances,
    pub http: &'a HttpFixtures,
}

impl QueryContext<'_> {
    /// Query another contract with this contract as the caller.
    pub fn query_contract(
        &self,
        contract: &ContractId,
        query: ContractQuery,
    ) -> Result<QueryOutput, ContractError> {
        query_instance(self.instances, self.http, contract, self.self_id.into(), query)
    }
}

#[derive(Debug, Clone)]
pub enum ContractInstance {
    FatBadges(FatBadges),
    EasyOracle(EasyOracle),
    AdvancedJudger(AdvancedJudger),
}

impl ContractInstance {
    /// Run the `new` constructor of `kind`.
    pub fn instantiate(kind: ContractKind, self_id: ContractId, deployer: AccountId) -> Self {
        match kind {
            ContractKind::FatBadges => Self::FatBadges(FatBadges::new(deployer)),
            ContractKind::EasyOracle => Self::EasyOracle(EasyOracle::new(self_id, deployer)),
            ContractKind::AdvancedJudger => {
                Self::AdvancedJudger(AdvancedJudger::new(self_id, deployer))
            }
        }
    }

    pub fn kind(&self) -> ContractKind {
        match self {
            Self::FatBadges(_) => ContractKind::FatBadges,
            Self::EasyOracle(_) => ContractKind::EasyOracle,
            Self::AdvancedJudger(_) => ContractKind::AdvancedJudger,
        }
    }

    fn handle(&mut self, ctx: MessageContext<'_>, message: ContractMessage) -> Result<(), ContractError> {
        match self {
            Self::FatBadges(c) => c.handle(ctx, message),
            Self::EasyOracle(c) => c.handle(ctx, message),
            Self::AdvancedJudger(c) => c.handle(ctx, message),
        }
    }

    fn query(&self, ctx: &QueryContext<'_>, query: ContractQuery) -> Result<QueryOutput, ContractError> {
        match self {
            Self::FatBadges(c) => c.query(ctx, query),
            Self::EasyOracle(c) => c.query(ctx, query),
            Self::AdvancedJudger(c) => c.query(ctx, query),
        }
    }
}

/// Execute `message` on `contract`, rolling back all instances on error.
pub fn execute_message(
    instances: &mut Instances,
    contract: &ContractId,
    caller: AccountId,
    message: ContractMessage,
) -> Result<(), ContractError> {
    let snapshot = instances.clone();
    let result = dispatch(instances, contract, caller, message);
    if result.is_err() {
        *instances = snapshot;
    }
    result
}

fn dispatch(
    instances: &mut Instances,
    contract: &ContractId,
    caller: AccountId,
    message: ContractMessage,
) -> Result<(), ContractError> {
    let mut instance = instances.remove(contract).ok_or(ContractError::NotFound)?;
    let ctx = MessageContext {
        caller,
        self_id: *contract,
        others: instances,
    };
    let result = instance.handle(ctx, message);
    instances.insert(*contract, instance);
    result
}

/// Answer `query` on `contract` as `caller`.
pub fn query_instance(
    instances: &Instances,
    http: &HttpFixtures,
    contract: &ContractId,
    caller: AccountId,
    query: ContractQuery,
) -> Result<QueryOutput, ContractError> {
    let instance = instances.get(contract).ok_or(ContractError::NotFound)?;
    let ctx = QueryContext {
        caller,
        self_id: *contract,
        instances,
        http,
    };
    instance.query(&ctx, query)
}

/// Cross-contract `issuable::issue` on a badge contract.
fn issue_badge(
    ctx: &mut MessageContext<'_>,
    badges: &ContractId,
    id: u32,
    dest: AccountId,
) -> Result<(), ContractError> {
    dispatch(
        ctx.others,
        badges,
        ctx.self_id.into(),
        ContractMessage::Issue { id, dest },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    #[test]
    fn test_failed_message_leaves_state_untouched() {
        let badges = ContractId::new([9; 32]);
        let admin = account(1);
        let mut instances = Instances::new();
        instances.insert(
            badges,
            ContractInstance::instantiate(ContractKind::FatBadges, badges, admin),
        );

        execute_message(&mut instances, &badges, admin, ContractMessage::NewBadge { name: "b".into() })
            .unwrap();
        execute_message(
            &mut instances,
            &badges,
            admin,
            ContractMessage::AddCode { id: 0, code: vec!["c1".into()] },
        )
        .unwrap();

        // not an issuer
        let err = execute_message(
            &mut instances,
            &badges,
            account(2),
            ContractMessage::Issue { id: 0, dest: account(3) },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NotAnIssuer);

        let info = query_instance(
            &instances,
            &HttpFixtures::default(),
            &badges,
            admin,
            ContractQuery::GetBadgeInfo { id: 0 },
        )
        .unwrap()
        .into_badge_info()
        .unwrap();
        assert_eq!(info.num_issued, 0);
    }

    #[test]
    fn test_unknown_contract() {
        let mut instances = Instances::new();
        let err = execute_message(
            &mut instances,
            &ContractId::default(),
            account(1),
            ContractMessage::NewBadge { name: "b".into() },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NotFound);
    }
}
