//! # Ledger State
//!
//! One versioned value holding every piece of authoritative state, and the
//! single function that moves it forward:
//!
//! ```text
//! apply(state, ctx, command) -> Ok(event)   state advanced
//!                            -> Err(error)  state untouched
//! ```
//!
//! Each subsystem validates before it writes, and a command only ever
//! reaches one subsystem, so a rejected command leaves the whole state equal
//! to what it was.

use pl_01_identity_registry::domain::registry::{IdentityRegistry, Verification};
use pl_01_identity_registry::ports::inbound::IdentityRegistryApi;
use pl_02_task_marketplace::domain::marketplace::TaskMarketplace;
use pl_02_task_marketplace::domain::policy::MarketplacePolicy;
use pl_02_task_marketplace::ports::inbound::TaskMarketplaceApi;
use pl_03_audit_log::domain::audit_log::AuditLog;
use pl_03_audit_log::ports::inbound::AuditLogApi;
use serde::{Deserialize, Serialize};
use shared_bus::LedgerEvent;
use shared_types::{
    Address, Command, CommandContext, EntityKey, InspectionLog, LedgerError, RegisteredEntity,
    Task, TaskId,
};

use crate::adapters::{MarketplaceAssignments, RegistryDirectory};

/// Registry, marketplace and audit log at one point in the command order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    registry: IdentityRegistry,
    marketplace: TaskMarketplace,
    audit: AuditLog,
}

impl LedgerState {
    /// Empty state with a fixed owner and marketplace variant.
    #[must_use]
    pub fn new(owner: Address, policy: MarketplacePolicy) -> Self {
        Self {
            registry: IdentityRegistry::new(owner),
            marketplace: TaskMarketplace::new(policy),
            audit: AuditLog::new(),
        }
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// The subsystem's rejection; `self` is unchanged in that case.
    pub fn apply(
        &mut self,
        ctx: &CommandContext,
        command: &Command,
    ) -> Result<LedgerEvent, LedgerError> {
        match command.clone() {
            Command::AddAuthorized { key, name } => self.registry.add_authorized(ctx, key, name),
            Command::RemoveAuthorized { key } => self.registry.remove_authorized(ctx, key),
            Command::RegisterEntity {
                key,
                kind,
                metadata,
                owner,
            } => self
                .registry
                .register_entity(ctx, key, kind, metadata, owner),
            Command::PostTask {
                description,
                deadline,
            } => {
                let directory = RegistryDirectory::new(&self.registry);
                self.marketplace
                    .post_task(ctx, &directory, description, deadline)
            }
            Command::Bid { task_id } => {
                let directory = RegistryDirectory::new(&self.registry);
                self.marketplace.bid(ctx, &directory, task_id)
            }
            Command::Assign { task_id } => {
                let directory = RegistryDirectory::new(&self.registry);
                self.marketplace.assign(ctx, &directory, task_id)
            }
            Command::LogResult { task_id, digest } => {
                let assignments = MarketplaceAssignments::new(&self.marketplace);
                self.audit.log_result(ctx, &assignments, task_id, digest)
            }
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The distinguished owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.registry.owner()
    }

    /// Point lookup of a registered entity.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown key.
    pub fn lookup(&self, key: &EntityKey) -> Result<&RegisteredEntity, LedgerError> {
        self.registry.lookup(key)
    }

    /// Authenticity check.
    #[must_use]
    pub fn verify(&self, key: &EntityKey) -> Verification {
        self.registry.verify(key)
    }

    /// Point read of a task.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` for an unknown id.
    pub fn get_task(&self, task_id: TaskId) -> Result<&Task, LedgerError> {
        self.marketplace.get_task(task_id)
    }

    /// Point read of a logged result.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing is logged for the task.
    pub fn get_log(&self, task_id: TaskId) -> Result<&InspectionLog, LedgerError> {
        self.audit.get_log(task_id)
    }

    /// Tasks ever posted.
    #[must_use]
    pub fn task_count(&self) -> u64 {
        self.marketplace.task_count()
    }

    /// Whether `key` currently holds authorization.
    #[must_use]
    pub fn is_authorized(&self, key: &Address) -> bool {
        self.registry.is_authorized(key)
    }

    /// The identity registry.
    #[must_use]
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// The task marketplace.
    #[must_use]
    pub fn marketplace(&self) -> &TaskMarketplace {
        &self.marketplace
    }

    /// The audit log.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}
