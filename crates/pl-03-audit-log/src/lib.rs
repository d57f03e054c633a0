//! # PL-03 Audit Log - Write-Once Inspection Results
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! Stores exactly one result digest per assigned task. Only the assignee can
//! write it and nothing can change it afterwards. Assignment state is read
//! from the marketplace through [`AssignmentLookup`](ports::AssignmentLookup).
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | An entry exists only for an assigned task | `domain/audit_log.rs` - `log_result()` |
//! | INVARIANT-2 | Only the assignee writes the entry | `domain/audit_log.rs` - `log_result()` |
//! | INVARIANT-3 | Write-once: no overwrite path exists | `domain/audit_log.rs` - `log_result()` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod domain;
pub mod ports;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::audit_log::AuditLog;
    pub use crate::ports::inbound::AuditLogApi;
    pub use crate::ports::outbound::AssignmentLookup;
    pub use shared_types::{Digest, InspectionLog, LedgerError, TaskId};
}

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 3;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Audit Log";
