//! # Error Types
//!
//! The rejection taxonomy shared by every subsystem. All errors are raised
//! before any state is touched, so a rejected command never leaves partial
//! state behind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Address, BlockHeight, EntityKey, TaskId};

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caller lacks the required role (owner, authorized actor, assignee).
    Authorization,
    /// Unknown key or id.
    NotFound,
    /// Duplicate registration, bid after close, double log, empty assignment.
    StateConflict,
    /// Malformed or out-of-range input.
    Validation,
}

/// Every way a command or query can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LedgerError {
    /// Caller does not hold the role this operation requires.
    #[error("unauthorized: {caller} may not {operation}")]
    Unauthorized { caller: Address, operation: String },

    /// The actor is already active on the allow-list.
    #[error("actor {0} is already authorized")]
    AlreadyAuthorized(Address),

    /// Unknown actor or entity key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor exists but does not currently hold authorization.
    #[error("actor {0} is not an authorized actor")]
    NotAuthorizedActor(Address),

    /// An entity is already registered under this key.
    #[error("entity key {0} is already registered")]
    DuplicateKey(EntityKey),

    /// Deadline is not strictly after the current block time.
    #[error("invalid deadline {deadline}: must be after {now}")]
    InvalidDeadline { deadline: u64, now: u64 },

    /// No task with this id.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// The task is no longer accepting bids or assignment.
    #[error("task {0} is closed")]
    TaskClosed(TaskId),

    /// The actor has already bid on this task.
    #[error("actor {bidder} already bid on task {task_id}")]
    DuplicateBid { task_id: TaskId, bidder: Address },

    /// Assignment requested for a task without bids.
    #[error("task {0} has no bidders")]
    NoBidders(TaskId),

    /// A result was submitted for a task that has not been assigned.
    #[error("task {0} is not assigned")]
    TaskNotAssigned(TaskId),

    /// A result already exists for this task.
    #[error("result for task {0} is already logged")]
    AlreadyLogged(TaskId),

    /// Malformed input (empty key, bad hex, oversized field).
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Unknown submission id.
    #[error("unknown command {0}")]
    UnknownCommand(String),

    /// An attempt to rewrite blocks that already reached finality.
    #[error("block {height} is finalized and cannot be reverted")]
    FinalizedHistory { height: BlockHeight },
}

impl LedgerError {
    /// Maps the error onto the four-way taxonomy.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::NotAuthorizedActor(_) => {
                ErrorCategory::Authorization
            }
            Self::NotFound(_) | Self::TaskNotFound(_) | Self::UnknownCommand(_) => {
                ErrorCategory::NotFound
            }
            Self::AlreadyAuthorized(_)
            | Self::DuplicateKey(_)
            | Self::TaskClosed(_)
            | Self::DuplicateBid { .. }
            | Self::NoBidders(_)
            | Self::TaskNotAssigned(_)
            | Self::AlreadyLogged(_)
            | Self::FinalizedHistory { .. } => ErrorCategory::StateConflict,
            Self::InvalidDeadline { .. } | Self::InvalidInput { .. } => ErrorCategory::Validation,
        }
    }

    /// Shorthand for an [`LedgerError::Unauthorized`] rejection.
    pub fn unauthorized(caller: Address, operation: impl Into<String>) -> Self {
        Self::Unauthorized {
            caller,
            operation: operation.into(),
        }
    }

    /// Shorthand for an [`LedgerError::InvalidInput`] rejection.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let a = Address::ZERO;
        assert_eq!(
            LedgerError::unauthorized(a, "add actor").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            LedgerError::NotAuthorizedActor(a).category(),
            ErrorCategory::Authorization
        );
        assert_eq!(LedgerError::TaskNotFound(3).category(), ErrorCategory::NotFound);
        assert_eq!(
            LedgerError::DuplicateKey(EntityKey::from("0000000000001")).category(),
            ErrorCategory::StateConflict
        );
        assert_eq!(LedgerError::NoBidders(0).category(), ErrorCategory::StateConflict);
        assert_eq!(LedgerError::AlreadyLogged(0).category(), ErrorCategory::StateConflict);
        assert_eq!(
            LedgerError::InvalidDeadline { deadline: 1, now: 2 }.category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::TaskClosed(7);
        assert_eq!(err.to_string(), "task 7 is closed");
    }
}
