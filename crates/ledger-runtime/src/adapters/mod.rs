//! # Adapter Implementations
//!
//! Concrete implementations of the subsystems' outbound ports:
//!
//! - [`RegistryDirectory`] lets the marketplace consult the allow-list.
//! - [`MarketplaceAssignments`] lets the audit log read assignment state.
//! - [`LedgerEventSource`] gives the projector ordered access to the ledger's
//!   event log.

pub mod directory;
pub mod event_source;

pub use directory::{MarketplaceAssignments, RegistryDirectory};
pub use event_source::LedgerEventSource;
