//! In-process devnet.
//!
//! # Data Flow
//! ```text
//! SignedCall → node.rs (nonce check, wait for the next block)
//!     → dispatch.rs (apply on a draft state; commit or ExtrinsicFailed)
//!     → state.rs (pending registry effects, worker task queue)
//!
//! Any read → catch up: effects due at head, worker tasks up to head - lag
//!     → contracts/ (native FatBadges, EasyOracle, AdvancedJudger)
//! ```
//!
//! # Design Decisions
//! - Block height is a function of elapsed `tokio::time`, so tests can pause
//!   and auto-advance the clock
//! - Keys and registry entries appear `key_delay_blocks` after inclusion;
//!   nothing is visible in the inclusion block itself
//! - The state lock is never held across a sleep

pub mod builder;
pub mod contracts;
pub mod dispatch;
pub mod fixtures;
pub mod node;
pub mod state;

pub use builder::{DevnetBuilder, DEV_ACCOUNTS};
pub use fixtures::HttpFixtures;
pub use node::Devnet;
pub use state::MessageFailure;
