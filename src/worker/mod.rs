//! Trusted-execution worker subsystem.
//!
//! # Data Flow
//! ```text
//! Wallet → certificate.rs (signed query credential, session key)
//!     → ContractQuerier (contract queries executed by the worker)
//!
//! pruntime.rs: HTTP prpc client (GetInfo, ContractQuery) for a live worker
//! prpc.rs:     protobuf request and response bodies
//! channel.rs:  ContractQuerier sealing queries for the contract key
//! ```

pub mod api;
pub mod certificate;
pub mod channel;
pub mod prpc;
pub mod pruntime;

pub use api::{ContractQuerier, WorkerApi, WorkerError, WorkerInfo, WorkerResult};
pub use certificate::Certificate;
pub use channel::ContractChannel;
pub use pruntime::PruntimeClient;
