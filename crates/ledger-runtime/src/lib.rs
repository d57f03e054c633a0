//! # Ledger Runtime Library
//!
//! The authoritative store for the provenance ledger and the wiring that
//! runs it. The `ledger-node` binary in `main.rs` is the entry point; this
//! library exposes the pieces for tests and embedding.
//!
//! ## Layers
//!
//! - **container**: [`LedgerState`](container::LedgerState) with its
//!   command-apply function, and [`LedgerConfig`](container::LedgerConfig)
//! - **chain**: pending pool, blocks, finality, receipts, event log
//! - **adapters**: outbound port implementations joining the subsystems
//! - **client** / **node**: async access and task orchestration
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | A rejected command leaves state unchanged | `container/state.rs` - `apply()` |
//! | INVARIANT-2 | Sequence numbers are dense and follow execution order | `chain/ledger.rs` - `seal()` |
//! | INVARIANT-3 | Queries see finalized blocks only | `chain/ledger.rs` - `finalized_state` |
//! | INVARIANT-4 | Finalized blocks are never reverted | `chain/ledger.rs` - `revert_blocks()` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod chain;
pub mod client;
pub mod container;
pub mod demo;
pub mod node;
pub mod time;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::chain::{CommandId, CommandStatus, InMemoryLedger, SealedBlock, SharedLedger};
    pub use crate::client::{ClientError, Confirmation, LedgerClient};
    pub use crate::container::{load_config, LedgerConfig, LedgerState};
    pub use crate::node::{LedgerNode, NodeError};
    pub use crate::time::{ManualClock, SystemTimeSource, TimeSource};
}
