//! # Ledger Client
//!
//! Async façade a single identity uses to talk to the ledger. Submission is
//! synchronous validation plus queueing; confirmation is polled.
//!
//! Dropping a [`LedgerClient::wait_for_confirmation`] future stops waiting
//! and nothing else: the command stays in the pool and reaches the same
//! outcome it would have reached anyway.

use pl_01_identity_registry::domain::registry::Verification;
use shared_bus::{EventFilter, SequencedEvent};
use shared_types::{
    Address, BlockHeight, Command, EntityKey, InspectionLog, LedgerError, RegisteredEntity,
    SequenceNumber, Task, TaskId,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::chain::{CommandId, CommandStatus, SharedLedger};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Errors surfaced to a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected at submission, or failed when its block was sealed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Still not final when the caller stopped waiting.
    #[error("command {id} not confirmed in time (last status {last:?})")]
    Timeout { id: CommandId, last: CommandStatus },

    /// The block holding the command was reverted.
    #[error("command {id} was dropped with block {height}")]
    Dropped { id: CommandId, height: BlockHeight },
}

/// A command that reached finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Submission id.
    pub id: CommandId,
    /// Final block that executed it.
    pub height: BlockHeight,
    /// Sequence of its event.
    pub sequence: SequenceNumber,
}

/// Client bound to one caller identity.
#[derive(Clone)]
pub struct LedgerClient {
    ledger: SharedLedger,
    caller: Address,
    poll_interval: Duration,
}

impl LedgerClient {
    /// Client acting as `caller`.
    #[must_use]
    pub fn new(ledger: SharedLedger, caller: Address) -> Self {
        Self {
            ledger,
            caller,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the status poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Identity this client signs as.
    #[must_use]
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Validate and queue a command.
    ///
    /// # Errors
    ///
    /// The command's rejection at the pending tip.
    pub fn submit(&self, command: Command) -> Result<CommandId, ClientError> {
        Ok(self.ledger.write().submit(self.caller, command)?)
    }

    /// Current status of a submission.
    ///
    /// # Errors
    ///
    /// `UnknownCommand` for an id this ledger never issued.
    pub fn status(&self, id: &CommandId) -> Result<CommandStatus, ClientError> {
        Ok(self.ledger.read().status(id)?)
    }

    /// Poll until the command is final, failed or dropped.
    ///
    /// # Errors
    ///
    /// - `Ledger` when the command failed at inclusion
    /// - `Dropped` when its block was reverted
    /// - `Timeout` when `timeout` elapses first
    #[instrument(skip(self), fields(caller = %self.caller))]
    pub async fn wait_for_confirmation(
        &self,
        id: CommandId,
        timeout: Duration,
    ) -> Result<Confirmation, ClientError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.status(&id)?;
            match status {
                CommandStatus::Finalized { height, sequence } => {
                    debug!(%id, height, sequence, "Command confirmed");
                    return Ok(Confirmation {
                        id,
                        height,
                        sequence,
                    });
                }
                CommandStatus::Failed { error, .. } => return Err(ClientError::Ledger(error)),
                CommandStatus::Dropped { height } => {
                    return Err(ClientError::Dropped { id, height })
                }
                CommandStatus::Pending | CommandStatus::Included { .. } => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ClientError::Timeout { id, last: status });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Submit and wait for finality.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit) and
    /// [`wait_for_confirmation`](Self::wait_for_confirmation).
    pub async fn execute(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<Confirmation, ClientError> {
        let id = self.submit(command)?;
        self.wait_for_confirmation(id, timeout).await
    }

    // =========================================================================
    // CONFIRMED QUERIES
    // =========================================================================

    /// The distinguished owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.ledger.read().owner()
    }

    /// Confirmed entity lookup.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown key.
    pub fn lookup(&self, key: &EntityKey) -> Result<RegisteredEntity, ClientError> {
        Ok(self.ledger.read().lookup(key)?)
    }

    /// Confirmed authenticity check.
    #[must_use]
    pub fn verify(&self, key: &EntityKey) -> Verification {
        self.ledger.read().verify(key)
    }

    /// Confirmed task.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` for an unknown id.
    pub fn get_task(&self, task_id: TaskId) -> Result<Task, ClientError> {
        Ok(self.ledger.read().get_task(task_id)?)
    }

    /// Confirmed log entry.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing is logged.
    pub fn get_log(&self, task_id: TaskId) -> Result<InspectionLog, ClientError> {
        Ok(self.ledger.read().get_log(task_id)?)
    }

    /// Confirmed task count.
    #[must_use]
    pub fn task_count(&self) -> u64 {
        self.ledger.read().task_count()
    }

    /// Event history by range and filter.
    #[must_use]
    pub fn events_from(&self, from: SequenceNumber, filter: &EventFilter) -> Vec<SequencedEvent> {
        self.ledger.read().events_from(from, filter)
    }

    /// The shared ledger behind this client.
    #[must_use]
    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }
}
