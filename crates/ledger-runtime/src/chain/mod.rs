//! # In-Memory Chain
//!
//! The authoritative store the subsystems run on: a pending pool, a sequence
//! of sealed blocks, an append-only hash-chained event log and a finality
//! horizon.
//!
//! ```text
//! submit ──▶ pending pool ──seal_block()──▶ block h ──(head - h >= depth)──▶ final
//!   │ dry-run on the                          │                                │
//!   │ pending tip                             ▼                                ▼
//!   ▼                                    event log                    confirmed state
//! Err(LedgerError)                 (projector input)               (answers queries)
//! ```

pub mod ledger;
pub mod receipts;

pub use ledger::{InMemoryLedger, SealedBlock};
pub use receipts::{CommandId, CommandStatus};

use parking_lot::RwLock;
use std::sync::Arc;

/// The ledger as shared between clients, the block producer and the
/// projector's event source.
pub type SharedLedger = Arc<RwLock<InMemoryLedger>>;
