//! # Shared Bus - Ledger Event Stream
//!
//! Event types emitted by the registry, marketplace and audit log, the
//! sequencing envelope the ledger wraps them in, and an in-memory broadcast
//! bus for live delivery.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐   seal_block()   ┌──────────────┐   subscribe()   ┌──────────────┐
//! │    Ledger    │ ───────────────▶ │  Event Bus   │ ──────────────▶ │  Projector   │
//! │ (event log)  │                  │ (broadcast)  │                 │ (read model) │
//! └──────────────┘                  └──────────────┘                 └──────────────┘
//!        ▲                                                                  │
//!        └──────────────── events_from(sequence) backfill ──────────────────┘
//! ```
//!
//! The bus is a latency optimisation only. The ledger's event log is the
//! authority; the bus may drop events for slow subscribers, and ordering is
//! always resolved by [`SequencedEvent::sequence`], never by receipt time.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{
    EventFilter, EventKey, EventKind, LedgerEvent, SequencedEvent, GENESIS_EVENT_HASH,
};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
