//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Asynchronous chain/worker side effect expected:
//!     → poll.rs (retry_until: check, accept, sleep, deadline)
//!     → backoff.rs (interval for the next check, bounded, jittered)
//! ```
//!
//! # Design Decisions
//! - Every wait has a deadline; a missed deadline is fatal (`PollTimeout`)
//! - Check errors are not retried
//! - Backoff is opt-in (`max_interval > interval`); fixed intervals are exact

pub mod backoff;
pub mod poll;

pub use poll::{check_until, check_until_eq, retry_until, PollPolicy};
