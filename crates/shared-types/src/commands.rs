//! # Commands
//!
//! The typed operations a client can submit to the ledger. Payloads carry no
//! caller field: identity comes from [`CommandContext::caller`].

use serde::{Deserialize, Serialize};

use crate::entities::{Address, Digest, EntityKey, EntityKind, SequenceNumber, TaskId, Timestamp};

/// Execution context supplied by the ledger for a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    /// Identity that signed the command.
    pub caller: Address,
    /// Block time at which the command executes.
    pub timestamp: Timestamp,
    /// Sequence number the resulting event will carry.
    pub sequence: SequenceNumber,
}

impl CommandContext {
    /// Creates a context.
    #[must_use]
    pub const fn new(caller: Address, timestamp: Timestamp, sequence: SequenceNumber) -> Self {
        Self {
            caller,
            timestamp,
            sequence,
        }
    }

    /// Same context with a different caller.
    #[must_use]
    pub const fn with_caller(self, caller: Address) -> Self {
        Self { caller, ..self }
    }
}

/// A state-changing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Owner adds an actor to the allow-list.
    AddAuthorized { key: Address, name: String },
    /// Owner deactivates an actor.
    RemoveAuthorized { key: Address },
    /// Register a product or drone profile under an authorized actor.
    RegisterEntity {
        key: EntityKey,
        kind: EntityKind,
        metadata: String,
        owner: Address,
    },
    /// Post a task open for bids.
    PostTask {
        description: String,
        deadline: Timestamp,
    },
    /// The caller bids on a task.
    Bid { task_id: TaskId },
    /// Assign a task to its earliest bidder.
    Assign { task_id: TaskId },
    /// The assignee records the task's result.
    LogResult { task_id: TaskId, digest: Digest },
}

impl Command {
    /// Short operation name for logs and metrics labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddAuthorized { .. } => "add_authorized",
            Self::RemoveAuthorized { .. } => "remove_authorized",
            Self::RegisterEntity { .. } => "register_entity",
            Self::PostTask { .. } => "post_task",
            Self::Bid { .. } => "bid",
            Self::Assign { .. } => "assign",
            Self::LogResult { .. } => "log_result",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Bid { task_id: 0 }.name(), "bid");
        assert_eq!(
            Command::LogResult {
                task_id: 0,
                digest: Digest::ZERO
            }
            .name(),
            "log_result"
        );
    }

    #[test]
    fn test_command_serde_tagging() {
        let cmd = Command::Assign { task_id: 4 };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "assign");
        assert_eq!(json["task_id"], 4);
    }

    #[test]
    fn test_context_with_caller() {
        let ctx = CommandContext::new(Address::ZERO, 10, 1);
        let other = Address::derive("other");
        assert_eq!(ctx.with_caller(other).caller, other);
        assert_eq!(ctx.with_caller(other).timestamp, 10);
    }
}
