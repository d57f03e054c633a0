//! # PL-04 Event Projector - Off-Ledger Read Model
//!
//! **Subsystem ID:** 4
//!
//! ## Purpose
//!
//! The ledger answers point lookups only. This subsystem replays its ordered
//! event stream into a queryable read model: actors with status, entities in
//! registration order, tasks with status, and logs.
//!
//! ## Architecture
//!
//! ```text
//!   Event Bus ──live──┐
//!                     ▼
//!              ┌──────────────┐   sync()    ┌──────────────┐
//!              │ EventProjector│ ◀────────── │ EventSource  │ (ledger event log)
//!              │ cursor+model │             └──────────────┘
//!              └──────┬───────┘
//!                     │ checkpoint()
//!                     ▼
//!              CheckpointStore (memory / JSON file)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Replaying an applied event changes nothing | `domain/projector.rs` - `ingest()` |
//! | INVARIANT-2 | Events apply strictly in sequence order | `domain/projector.rs` - `drain_pending()` |
//! | INVARIANT-3 | A diverged suffix is discarded and rebuilt, never merged | `domain/projector.rs` - `sync()` |
//! | INVARIANT-4 | Every applied event chains to the cursor hash | `domain/projector.rs` - `append_checked()` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{InMemoryCheckpointStore, JsonFileCheckpointStore};
    pub use crate::domain::errors::{ProjectorError, ProjectorResult};
    pub use crate::domain::projector::{
        Checkpoint, Cursor, EventProjector, IngestOutcome, SyncReport,
    };
    pub use crate::domain::read_model::{
        ActorView, EntityView, LogView, ReadModel, TaskStatus, TaskView,
    };
    pub use crate::ports::inbound::ProjectorApi;
    pub use crate::ports::outbound::{CheckpointStore, EventSource};
    pub use crate::service::{wait_for_sequence, ProjectorConfig, ProjectorService, SharedProjector};
}

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 4;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Event Projector";
