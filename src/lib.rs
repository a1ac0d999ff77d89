//! Badge contract deployer.
//!
//! Deploys the FatBadges, EasyOracle and AdvancedJudger contracts to a Phala
//! cluster, wires them together and drives the end-to-end badge scenario.

pub mod artifacts;
pub mod chain;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod devnet;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod scenario;
pub mod worker;

pub use config::DeployConfig;
pub use deploy::DeployContext;
pub use error::{Error, Result};
