//! # Shared Types Crate
//!
//! Value objects, entities, commands and errors shared by the identity
//! registry, the task marketplace, the audit log, the ledger runtime and the
//! event projector.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Caller Identity from Context**: Command payloads never carry the
//!   caller; the ledger supplies it through [`CommandContext`].
//! - **One Error Taxonomy**: Every rejection is a [`LedgerError`] with an
//!   [`ErrorCategory`].

pub mod commands;
pub mod entities;
pub mod errors;

pub use commands::*;
pub use entities::*;
pub use errors::*;
