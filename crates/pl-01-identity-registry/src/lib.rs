//! # PL-01 Identity Registry - Authorization-Gated Registry Subsystem
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Keeps the owner-managed allow-list of authorized actors (producers or
//! drones) and the registry of entities (products or drone profiles) bound to
//! them. Authorization is checked at write time only: revoking an actor never
//! invalidates what it registered while authorized.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Only the owner changes the allow-list | `domain/registry.rs` - `require_owner()` |
//! | INVARIANT-2 | Actor keys are unique; removal deactivates | `domain/registry.rs` - `remove_authorized()` |
//! | INVARIANT-3 | Entity keys are unique for all time | `domain/registry.rs` - `register_entity()` |
//! | INVARIANT-4 | Every entity owner was an actor when registered | `domain/invariants.rs` - `check_all_invariants()` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use pl_01_identity_registry::prelude::*;
//!
//! let mut registry = IdentityRegistry::new(owner);
//! registry.add_authorized(&ctx, producer, "Test Producer".into())?;
//! registry.register_entity(&ctx, "0000000000001".into(), EntityKind::Product,
//!     "Test Product".into(), producer)?;
//! assert_eq!(registry.lookup(&"0000000000001".into())?.owner, producer);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod domain;
pub mod ports;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::invariants::{check_all_invariants, InvariantViolation};
    pub use crate::domain::limits;
    pub use crate::domain::registry::{IdentityRegistry, Verification};
    pub use crate::ports::inbound::IdentityRegistryApi;
    pub use shared_types::{Actor, Address, EntityKey, EntityKind, LedgerError, RegisteredEntity};
}

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Identity Registry";
