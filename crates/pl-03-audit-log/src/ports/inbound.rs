//! # Driving Ports (API - Inbound)

use shared_bus::LedgerEvent;
use shared_types::{CommandContext, Digest, InspectionLog, LedgerError, TaskId};

use super::outbound::AssignmentLookup;

/// Primary API of the audit log. There is no update or delete.
pub trait AuditLogApi {
    /// Record the result of `task_id`.
    ///
    /// Checks run in this order: `TaskNotFound`, `TaskNotAssigned`,
    /// `Unauthorized` (caller is not the assignee), `AlreadyLogged`,
    /// `InvalidInput` (all-zero digest).
    ///
    /// # Errors
    ///
    /// Any of the above; the log is unchanged on error.
    fn log_result(
        &mut self,
        ctx: &CommandContext,
        assignments: &dyn AssignmentLookup,
        task_id: TaskId,
        digest: Digest,
    ) -> Result<LedgerEvent, LedgerError>;

    /// The entry for `task_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing was logged.
    fn get_log(&self, task_id: TaskId) -> Result<&InspectionLog, LedgerError>;
}
