//! # Cross-Subsystem Lookups
//!
//! Borrowing adapters built for the duration of one command. They read a
//! sibling field of [`LedgerState`](crate::container::LedgerState) while the
//! subsystem being driven holds the mutable borrow of its own field.

use pl_01_identity_registry::domain::registry::IdentityRegistry;
use pl_01_identity_registry::ports::inbound::IdentityRegistryApi;
use pl_02_task_marketplace::domain::marketplace::TaskMarketplace;
use pl_02_task_marketplace::ports::inbound::TaskMarketplaceApi;
use pl_02_task_marketplace::ports::outbound::ActorDirectory;
use pl_03_audit_log::ports::outbound::AssignmentLookup;
use shared_types::{Address, LedgerError, TaskId};

/// [`ActorDirectory`] backed by the identity registry.
pub struct RegistryDirectory<'a> {
    registry: &'a IdentityRegistry,
}

impl<'a> RegistryDirectory<'a> {
    /// Wrap a registry.
    #[must_use]
    pub fn new(registry: &'a IdentityRegistry) -> Self {
        Self { registry }
    }
}

impl ActorDirectory for RegistryDirectory<'_> {
    fn owner(&self) -> Address {
        self.registry.owner()
    }

    fn is_authorized(&self, key: &Address) -> bool {
        self.registry.is_authorized(key)
    }
}

/// [`AssignmentLookup`] backed by the task marketplace.
pub struct MarketplaceAssignments<'a> {
    marketplace: &'a TaskMarketplace,
}

impl<'a> MarketplaceAssignments<'a> {
    /// Wrap a marketplace.
    #[must_use]
    pub fn new(marketplace: &'a TaskMarketplace) -> Self {
        Self { marketplace }
    }
}

impl AssignmentLookup for MarketplaceAssignments<'_> {
    fn assignee(&self, task_id: TaskId) -> Result<Option<Address>, LedgerError> {
        Ok(self.marketplace.get_task(task_id)?.assigned_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_02_task_marketplace::domain::policy::MarketplacePolicy;
    use shared_types::CommandContext;

    fn owner() -> Address {
        Address::derive("owner")
    }

    #[test]
    fn test_registry_directory() {
        let mut registry = IdentityRegistry::new(owner());
        let drone = Address::derive("drone-1");
        registry
            .add_authorized(&CommandContext::new(owner(), 0, 1), drone, "Drone1".into())
            .unwrap();

        let directory = RegistryDirectory::new(&registry);
        assert_eq!(directory.owner(), owner());
        assert!(directory.is_authorized(&drone));
        assert!(!directory.is_authorized(&Address::derive("drone-2")));
    }

    #[test]
    fn test_marketplace_assignments() {
        let registry = IdentityRegistry::new(owner());
        let directory = RegistryDirectory::new(&registry);
        let mut marketplace = TaskMarketplace::new(MarketplacePolicy::open());
        let ctx = CommandContext::new(owner(), 100, 1);
        marketplace
            .post_task(&ctx, &directory, "Inspect Tank A-12".into(), 200)
            .unwrap();

        let assignments = MarketplaceAssignments::new(&marketplace);
        assert_eq!(assignments.assignee(0), Ok(None));
        assert_eq!(assignments.assignee(1), Err(LedgerError::TaskNotFound(1)));
    }
}
