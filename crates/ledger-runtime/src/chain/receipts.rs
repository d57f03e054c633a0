//! Submission ids and their lifecycle.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, LedgerError, SequenceNumber};
use std::fmt;
use uuid::Uuid;

/// Handle returned by a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw bytes, used in block hashing.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a submitted command stands.
///
/// ```text
/// Pending ──▶ Included ──▶ Finalized
///    │           │
///    │           └──▶ Dropped   (block reverted)
///    └──▶ Failed                (invalid at inclusion)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    /// Accepted into the pool, not yet in a block.
    Pending,
    /// Executed in a block that may still be reverted.
    Included {
        height: BlockHeight,
        sequence: SequenceNumber,
    },
    /// Executed in a final block. Durable.
    Finalized {
        height: BlockHeight,
        sequence: SequenceNumber,
    },
    /// Valid at submission but rejected when its block was sealed.
    Failed {
        height: BlockHeight,
        error: LedgerError,
    },
    /// Its block was reverted. The command has no effect and may be
    /// resubmitted.
    Dropped { height: BlockHeight },
}

impl CommandStatus {
    /// Whether the status can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finalized { .. } | Self::Failed { .. } | Self::Dropped { .. }
        )
    }
}
