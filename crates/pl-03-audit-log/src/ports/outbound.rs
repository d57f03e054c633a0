//! # Driven Ports (SPI - Outbound)

use shared_types::{Address, LedgerError, TaskId};

/// Assignment state owned by the task marketplace.
pub trait AssignmentLookup {
    /// The actor assigned to `task_id`, if any.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` for an unknown task.
    fn assignee(&self, task_id: TaskId) -> Result<Option<Address>, LedgerError>;
}
