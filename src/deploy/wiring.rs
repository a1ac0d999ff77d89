//! Badge wiring and the post-deploy consistency check.

use tracing::info;

use crate::chain::{Call, Wallet};
use crate::contracts::{BadgeInfo, ContractMessage, ContractQuery, QueryOutput};
use crate::deploy::{DeployContext, DeployedContracts};
use crate::error::{Error, Result};
use crate::worker::Certificate;

/// Badge id created first; issued by EasyOracle.
pub const EASY_BADGE_ID: u32 = 0;
/// Badge id created second; issued by AdvancedJudger.
pub const ADV_BADGE_ID: u32 = 1;

pub const EASY_BADGE_NAME: &str = "fat-easy-challenge";
pub const ADV_BADGE_NAME: &str = "fat-adv-challenge";

/// Redeem codes loaded into each badge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringPlan {
    pub easy_codes: Vec<String>,
    pub adv_codes: Vec<String>,
}

impl WiringPlan {
    /// The batch that creates both badges and hands them to their issuers.
    pub fn calls(&self, contracts: &DeployedContracts) -> Vec<Call> {
        let badges = contracts.fat_badges;
        let tx = |message| Call::contract_tx(badges, message);
        vec![
            tx(ContractMessage::NewBadge {
                name: EASY_BADGE_NAME.into(),
            }),
            tx(ContractMessage::NewBadge {
                name: ADV_BADGE_NAME.into(),
            }),
            tx(ContractMessage::AddCode {
                id: EASY_BADGE_ID,
                code: self.easy_codes.clone(),
            }),
            tx(ContractMessage::AddCode {
                id: ADV_BADGE_ID,
                code: self.adv_codes.clone(),
            }),
            tx(ContractMessage::AddIssuer {
                id: EASY_BADGE_ID,
                issuer: contracts.easy_oracle.into(),
            }),
            tx(ContractMessage::AddIssuer {
                id: ADV_BADGE_ID,
                issuer: contracts.advanced_judger.into(),
            }),
            Call::contract_tx(
                contracts.easy_oracle,
                ContractMessage::ConfigIssuer {
                    contract: badges,
                    badge_id: EASY_BADGE_ID,
                },
            ),
            Call::contract_tx(
                contracts.advanced_judger,
                ContractMessage::ConfigIssuer {
                    contract: badges,
                    badge_id: ADV_BADGE_ID,
                },
            ),
        ]
    }
}

/// Submit the wiring batch as `admin`. The badge admin becomes `admin`.
pub async fn wire_contracts(
    ctx: &DeployContext,
    admin: &Wallet,
    contracts: &DeployedContracts,
    plan: &WiringPlan,
) -> Result<()> {
    info!(
        admin = %admin.display_name(),
        easy_codes = plan.easy_codes.len(),
        adv_codes = plan.adv_codes.len(),
        "Badges: configuring"
    );
    ctx.txqueue
        .submit(Call::batch_all(plan.calls(contracts)), admin, true)
        .await?;
    info!("Badges: configured");
    Ok(())
}

/// Check that exactly the two expected badges exist. Run after a block
/// barrier so the worker has executed the wiring batch.
pub async fn verify_badges(
    ctx: &DeployContext,
    cert: &Certificate,
    contracts: &DeployedContracts,
) -> Result<(BadgeInfo, BadgeInfo)> {
    let total = ctx
        .query(cert, &contracts.fat_badges, ContractQuery::GetTotalBadges)
        .await?;
    match total.as_u32() {
        Some(2) => {}
        _ => {
            return Err(Error::Consistency(format!(
                "expected 2 badges, found {:?}",
                total
            )))
        }
    }

    let easy = badge_info(ctx, cert, contracts, EASY_BADGE_ID, EASY_BADGE_NAME).await?;
    let adv = badge_info(ctx, cert, contracts, ADV_BADGE_ID, ADV_BADGE_NAME).await?;
    info!(badge = ?easy, "Badges: easy");
    info!(badge = ?adv, "Badges: adv");
    Ok((easy, adv))
}

async fn badge_info(
    ctx: &DeployContext,
    cert: &Certificate,
    contracts: &DeployedContracts,
    id: u32,
    name: &str,
) -> Result<BadgeInfo> {
    let output = ctx
        .query(cert, &contracts.fat_badges, ContractQuery::GetBadgeInfo { id })
        .await?;
    let kind = output.kind();
    let info = output
        .into_badge_info()
        .ok_or_else(|| Error::Consistency(format!("badge {}: unexpected {} output", id, kind)))?;
    if info.name != name {
        return Err(Error::Consistency(format!(
            "badge {} is named {:?}, expected {:?}",
            id, info.name, name
        )));
    }
    Ok(info)
}

/// Text output of a query, or a scenario error naming `what`.
pub(crate) fn expect_text(output: QueryOutput, what: &str) -> Result<String> {
    match output {
        QueryOutput::Text(text) => Ok(text),
        other => Err(Error::Scenario(format!("{}: expected text, got {}", what, other.kind()))),
    }
}
