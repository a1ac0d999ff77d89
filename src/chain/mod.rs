//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Call tree (call.rs)
//!     → wallet.rs (signer identity, nonce)
//!     → transaction.rs (TxQueue: sign, submit once, await inclusion)
//!     → api.rs (ChainApi backend: devnet, or live.rs over subxt)
//!     → events.rs (InclusionResult, dispatch errors, event extraction)
//!
//! live.rs:   signed submission and registry storage on a live node
//! client.rs: raw JSON-RPC to a live node (chain head, key pages)
//! ```
//!
//! # Constraints
//! - One extrinsic in flight per queue; no silent resubmission
//! - Never log secret URIs
//! - Every remote RPC call has a timeout

pub mod api;
pub mod call;
pub mod client;
pub mod events;
pub mod live;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use api::{ChainApi, ChainHead};
pub use call::{Call, ClusterPermission, CodeIndex, ResourceType, SignedCall};
pub use client::NodeClient;
pub use events::{ChainEvent, DispatchError, InclusionResult};
pub use live::LiveChain;
pub use transaction::TxQueue;
pub use types::{AccountId, ChainError, ClusterId, CodeHash, ContractId, Selector, WorkerPubkey};
pub use wallet::Wallet;
