//! Deployment orchestration.
//!
//! # Flow
//! ```text
//! setup.rs      connected worker, worker lookup → gatekeeper → cluster
//! contracts.rs  upload + instantiate (one batch) → addresses → keys
//! wiring.rs     badges, codes, issuers (one batch) → verify_badges
//! barrier.rs    wait until the worker caught up with the chain head
//! ```
//!
//! Every step submits strictly and then polls for the asynchronous side
//! effect it caused. A step that finds its effect already present skips
//! the submission.

pub mod barrier;
pub mod context;
pub mod contracts;
pub mod setup;
pub mod wiring;

pub use barrier::block_barrier;
pub use context::DeployContext;
pub use contracts::{connect_contracts, deploy_contracts, DeployedContracts, InstantiationRequest};
pub use setup::{connected_worker, deploy_cluster, setup_gatekeeper, worker_pubkey};
pub use wiring::{
    verify_badges, wire_contracts, WiringPlan, ADV_BADGE_ID, ADV_BADGE_NAME, EASY_BADGE_ID,
    EASY_BADGE_NAME,
};
