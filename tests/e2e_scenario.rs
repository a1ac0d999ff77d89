//! The full badge scenario on a fresh devnet.

use badge_deployer::chain::ClusterId;
use badge_deployer::config::ScenarioConfig;
use badge_deployer::contracts::{ContractError, ContractQuery, QueryOutput};
use badge_deployer::deploy::{ADV_BADGE_ID, EASY_BADGE_ID};
use badge_deployer::scenario::{self, ScenarioAccounts};
use badge_deployer::worker::{Certificate, WorkerError};
use badge_deployer::Error;

mod common;

fn accounts() -> ScenarioAccounts {
    ScenarioAccounts {
        alice: common::alice(),
        bob: common::bob(),
    }
}

fn scenario_config() -> ScenarioConfig {
    ScenarioConfig {
        gist_url: common::GIST_URL.into(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_redeems_both_badges() {
    let (_dir, artifacts) = common::artifacts();
    let devnet = common::scenario_devnet(&artifacts);
    let ctx = common::context(devnet.clone(), artifacts);
    let accounts = accounts();

    let report = scenario::run(&ctx, &accounts, &scenario_config()).await.unwrap();
    assert_eq!(report.cluster, ClusterId::default());
    assert_eq!(report.connected_worker, hex::encode(devnet.worker_pubkey().as_bytes()));
    assert_eq!(report.easy_code, "easy1");
    assert_eq!(report.adv_code, "adv1");
    assert!(devnet.message_failures().await.is_empty());

    let badges = report.contracts.fat_badges;
    let cert_alice = Certificate::sign(&accounts.alice);
    let cert_bob = Certificate::sign(&accounts.bob);
    assert_eq!(
        ctx.query(&cert_bob, &badges, ContractQuery::GetTotalBadges)
            .await
            .unwrap(),
        QueryOutput::U32(2)
    );

    // each account owns exactly the badge it redeemed
    for (cert, id) in [(&cert_alice, ADV_BADGE_ID), (&cert_bob, EASY_BADGE_ID)] {
        let err = ctx
            .query(cert, &badges, ContractQuery::Get { id })
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Worker(WorkerError::Contract(ContractError::NotFound))),
            "{:?}",
            err
        );
    }

    let info = ctx
        .query(&cert_bob, &badges, ContractQuery::GetBadgeInfo { id: EASY_BADGE_ID })
        .await
        .unwrap()
        .into_badge_info()
        .unwrap();
    assert_eq!((info.num_code, info.num_issued), (2, 1));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_fails_without_gist_claim() {
    let (_dir, artifacts) = common::artifacts();
    // no HTTP fixture: the oracle's fetch gets a 404
    let devnet = badge_deployer::devnet::DevnetBuilder::new(common::devnet_config())
        .artifacts(&artifacts)
        .build()
        .unwrap();
    let ctx = common::context(devnet, artifacts);

    let err = scenario::run(&ctx, &accounts(), &scenario_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Scenario(_)), "{:?}", err);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_fails_when_claim_names_another_account() {
    let (_dir, artifacts) = common::artifacts();
    let devnet = badge_deployer::devnet::DevnetBuilder::new(common::devnet_config())
        .artifacts(&artifacts)
        .http_response(
            common::GIST_URL,
            200,
            badge_deployer::contracts::gist::claim_for(&common::bob().account()),
        )
        .build()
        .unwrap();
    let ctx = common::context(devnet.clone(), artifacts);

    // Alice's redeem reverts in the worker, so her badge code never appears
    let err = scenario::run(&ctx, &accounts(), &scenario_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Scenario(_)), "{:?}", err);

    let failures = devnet.message_failures().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].message, "redeem");
    assert_eq!(failures[0].error, ContractError::NoPermission);
}
