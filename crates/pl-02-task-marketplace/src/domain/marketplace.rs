//! # Task Marketplace
//!
//! Per-task state machine: `Open -> Assigned` (terminal). Tasks live in a
//! `Vec` indexed by id, so ids are dense from 0 by construction.

use serde::{Deserialize, Serialize};
use shared_bus::LedgerEvent;
use shared_types::{CommandContext, LedgerError, Task, TaskId, TaskState, Timestamp};
use tracing::debug;

use super::limits::MAX_DESCRIPTION_LEN;
use super::policy::{MarketplacePolicy, PostingPolicy};
use crate::ports::inbound::TaskMarketplaceApi;
use crate::ports::outbound::ActorDirectory;

/// Task table plus the policy it runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMarketplace {
    policy: MarketplacePolicy,
    tasks: Vec<Task>,
}

impl TaskMarketplace {
    /// Empty marketplace under `policy`.
    #[must_use]
    pub fn new(policy: MarketplacePolicy) -> Self {
        Self {
            policy,
            tasks: Vec::new(),
        }
    }

    /// The policy this marketplace enforces.
    #[must_use]
    pub fn policy(&self) -> MarketplacePolicy {
        self.policy
    }

    /// All tasks in id order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn task_mut(&mut self, task_id: TaskId) -> Result<&mut Task, LedgerError> {
        usize::try_from(task_id)
            .ok()
            .and_then(|idx| self.tasks.get_mut(idx))
            .ok_or(LedgerError::TaskNotFound(task_id))
    }
}

impl TaskMarketplaceApi for TaskMarketplace {
    fn post_task(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        description: String,
        deadline: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        if self.policy.posting == PostingPolicy::OwnerOnly && ctx.caller != directory.owner() {
            return Err(LedgerError::unauthorized(ctx.caller, "post tasks"));
        }
        if description.trim().is_empty() {
            return Err(LedgerError::invalid("description", "empty"));
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::invalid(
                "description",
                format!(
                    "{} bytes exceeds limit of {MAX_DESCRIPTION_LEN}",
                    description.len()
                ),
            ));
        }
        if deadline <= ctx.timestamp {
            return Err(LedgerError::InvalidDeadline {
                deadline,
                now: ctx.timestamp,
            });
        }

        let id = self.task_count();
        self.tasks.push(Task {
            id,
            description: description.clone(),
            deadline,
            poster: ctx.caller,
            bidders: Vec::new(),
            assigned_to: None,
        });
        debug!(task_id = id, deadline, poster = %ctx.caller, "Task posted");
        Ok(LedgerEvent::TaskPosted {
            id,
            description,
            deadline,
        })
    }

    fn bid(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        task_id: TaskId,
    ) -> Result<LedgerEvent, LedgerError> {
        let require_authorized = self.policy.require_authorized_bidders;
        let bidder = ctx.caller;
        let task = self.task_mut(task_id)?;

        if task.state() != TaskState::Open {
            return Err(LedgerError::TaskClosed(task_id));
        }
        if task.bidders.contains(&bidder) {
            return Err(LedgerError::DuplicateBid { task_id, bidder });
        }
        if require_authorized && !directory.is_authorized(&bidder) {
            return Err(LedgerError::NotAuthorizedActor(bidder));
        }

        task.bidders.push(bidder);
        debug!(task_id, bidder = %bidder, position = task.bidders.len(), "Bid accepted");
        Ok(LedgerEvent::TaskBid {
            id: task_id,
            bidder,
        })
    }

    fn assign(
        &mut self,
        ctx: &CommandContext,
        directory: &dyn ActorDirectory,
        task_id: TaskId,
    ) -> Result<LedgerEvent, LedgerError> {
        let owner = directory.owner();
        let task = self.task_mut(task_id)?;

        if ctx.caller != owner && ctx.caller != task.poster {
            return Err(LedgerError::unauthorized(
                ctx.caller,
                format!("assign task {task_id}"),
            ));
        }
        if task.state() != TaskState::Open {
            return Err(LedgerError::TaskClosed(task_id));
        }
        // Bids are appended in sequence order, so the head is the earliest.
        let assignee = *task
            .bidders
            .first()
            .ok_or(LedgerError::NoBidders(task_id))?;

        task.assigned_to = Some(assignee);
        debug!(task_id, assignee = %assignee, "Task assigned");
        Ok(LedgerEvent::TaskAssigned {
            id: task_id,
            assignee,
        })
    }

    fn get_task(&self, task_id: TaskId) -> Result<&Task, LedgerError> {
        usize::try_from(task_id)
            .ok()
            .and_then(|idx| self.tasks.get(idx))
            .ok_or(LedgerError::TaskNotFound(task_id))
    }

    fn task_count(&self) -> u64 {
        self.tasks.len() as u64
    }
}
