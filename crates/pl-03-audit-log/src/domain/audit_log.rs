//! # Audit Log
//!
//! One immutable inspection result per assigned task, written only by the
//! assignee.

use serde::{Deserialize, Serialize};
use shared_bus::LedgerEvent;
use shared_types::{CommandContext, Digest, InspectionLog, LedgerError, TaskId};
use std::collections::BTreeMap;
use tracing::debug;

use crate::ports::inbound::AuditLogApi;
use crate::ports::outbound::AssignmentLookup;

/// Write-once map from task id to inspection result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: BTreeMap<TaskId, InspectionLog>,
}

impl AuditLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logged results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in task id order.
    pub fn entries(&self) -> impl Iterator<Item = &InspectionLog> {
        self.entries.values()
    }
}

impl AuditLogApi for AuditLog {
    fn log_result(
        &mut self,
        ctx: &CommandContext,
        assignments: &dyn AssignmentLookup,
        task_id: TaskId,
        digest: Digest,
    ) -> Result<LedgerEvent, LedgerError> {
        let assignee = assignments
            .assignee(task_id)?
            .ok_or(LedgerError::TaskNotAssigned(task_id))?;
        if ctx.caller != assignee {
            return Err(LedgerError::unauthorized(
                ctx.caller,
                format!("log the result of task {task_id}"),
            ));
        }
        if self.entries.contains_key(&task_id) {
            return Err(LedgerError::AlreadyLogged(task_id));
        }
        if digest == Digest::ZERO {
            return Err(LedgerError::invalid("digest", "all-zero digest"));
        }

        self.entries.insert(
            task_id,
            InspectionLog {
                task_id,
                digest,
                logged_by: ctx.caller,
                logged_at: ctx.timestamp,
            },
        );
        debug!(task_id, digest = %digest, by = %ctx.caller, "Result logged");
        Ok(LedgerEvent::ResultLogged {
            id: task_id,
            digest,
            by: ctx.caller,
        })
    }

    fn get_log(&self, task_id: TaskId) -> Result<&InspectionLog, LedgerError> {
        self.entries
            .get(&task_id)
            .ok_or_else(|| LedgerError::NotFound(format!("log for task {task_id}")))
    }
}
