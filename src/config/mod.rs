//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env + environment overrides (CHAIN, PRUNTIME, PRIVKEY, ...)
//!     → validation.rs (semantic checks)
//!     → DeployConfig (validated, immutable)
//!     → read once by main to build the DeployContext
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::DeployConfig;
pub use schema::NetworkConfig;
pub use schema::PollingConfig;
pub use schema::ScenarioConfig;
