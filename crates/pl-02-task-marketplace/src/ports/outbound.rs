//! # Driven Ports (SPI - Outbound)
//!
//! The marketplace does not own the allow-list. It asks the identity
//! registry through this port.

use shared_types::Address;

/// Read-only view of actor legitimacy.
pub trait ActorDirectory {
    /// The system owner.
    fn owner(&self) -> Address;

    /// Whether `key` currently holds authorization.
    fn is_authorized(&self, key: &Address) -> bool;
}
