//! # PL-02 Task Marketplace - Post, Bid, Assign
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Posts tasks, collects bids in arrival order and assigns each task to
//! exactly one actor: the earliest accepted bidder. Actor legitimacy comes
//! from the identity registry through the [`ActorDirectory`](ports::ActorDirectory)
//! port.
//!
//! ## State Machine
//!
//! ```text
//! post_task ──▶ [Open] ──bid*──▶ [Open] ──assign──▶ [Assigned] (terminal)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Task ids are 0,1,2,... with no gaps | `domain/marketplace.rs` - `post_task()` |
//! | INVARIANT-2 | Bids only while `Open`, no duplicates | `domain/marketplace.rs` - `bid()` |
//! | INVARIANT-3 | Assignment picks the first bidder, once | `domain/marketplace.rs` - `assign()` |
//! | INVARIANT-4 | Deadline strictly after block time | `domain/marketplace.rs` - `post_task()` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod domain;
pub mod ports;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::limits;
    pub use crate::domain::marketplace::TaskMarketplace;
    pub use crate::domain::policy::{MarketplacePolicy, PostingPolicy};
    pub use crate::ports::inbound::TaskMarketplaceApi;
    pub use crate::ports::outbound::ActorDirectory;
    pub use shared_types::{LedgerError, Task, TaskId, TaskState};
}

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Task Marketplace";
