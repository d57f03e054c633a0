//! # Ledger Container
//!
//! The versioned ledger state and the configuration the node is built from.
//!
//! - [`LedgerState`] owns the registry, the marketplace and the audit log and
//!   exposes one command-apply function over them.
//! - [`LedgerConfig`] carries runtime parameters with environment overrides.

pub mod config;
pub mod state;

pub use config::{load_config, ConfigError, LedgerConfig};
pub use state::LedgerState;
