//! # Driving Ports (API - Inbound)

use shared_bus::LedgerEvent;
use shared_types::{CommandContext, LedgerError, Task, TaskId, Timestamp};

use super::outbound::ActorDirectory;

/// Primary API of the task marketplace.
///
/// Every command either performs the full transition and returns its event,
/// or returns an error with the marketplace unchanged.
pub trait TaskMarketplaceApi {
    /// Create an open task with the next dense id.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the posting policy excludes the caller
    /// - `InvalidInput` for an empty or oversized description
    /// - `InvalidDeadline` unless `deadline > ctx.timestamp`
    fn post_task(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        description: String,
        deadline: Timestamp,
    ) -> Result<LedgerEvent, LedgerError>;

    /// The caller bids on `task_id`.
    ///
    /// # Errors
    ///
    /// `TaskNotFound`, `TaskClosed`, `DuplicateBid`, and `NotAuthorizedActor`
    /// when the policy requires authorized bidders.
    fn bid(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        task_id: TaskId,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Assign `task_id` to its earliest bidder.
    ///
    /// # Errors
    ///
    /// `TaskNotFound`, `Unauthorized` unless the caller is the owner or the
    /// task's poster, `TaskClosed` if already assigned, `NoBidders`.
    fn assign(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        task_id: TaskId,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Point read of a task.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` for an unknown id.
    fn get_task(&self, task_id: TaskId) -> Result<&Task, LedgerError>;

    /// Number of tasks ever posted; also the next id.
    fn task_count(&self) -> u64;
}
