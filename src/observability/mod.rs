//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (call, block, contract, ...)
//!     → spans tagging a whole run with its run id
//!
//! Consumers:
//!     → logging.rs (EnvFilter + fmt layer to stdout)
//! ```

pub mod logging;
