//! # Ledger Event Source
//!
//! Implements the projector's [`EventSource`] port over the shared ledger.
//! Each call takes the read lock briefly; the projector never holds it while
//! folding events.

use pl_04_event_projector::ports::outbound::EventSource;
use shared_bus::{EventFilter, SequencedEvent};
use shared_types::SequenceNumber;
use std::sync::Arc;

use crate::chain::SharedLedger;

/// Projector input backed by the ledger's event log.
#[derive(Clone)]
pub struct LedgerEventSource {
    ledger: SharedLedger,
}

impl LedgerEventSource {
    /// Wrap a shared ledger.
    #[must_use]
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    /// Convenience for wiring: boxed as the port trait object.
    #[must_use]
    pub fn shared(ledger: SharedLedger) -> Arc<dyn EventSource> {
        Arc::new(Self::new(ledger))
    }
}

impl EventSource for LedgerEventSource {
    fn latest_sequence(&self) -> SequenceNumber {
        self.ledger.read().latest_sequence()
    }

    fn event_at(&self, sequence: SequenceNumber) -> Option<SequencedEvent> {
        self.ledger.read().event_at(sequence).cloned()
    }

    fn events_from(&self, from: SequenceNumber) -> Vec<SequencedEvent> {
        self.ledger.read().events_from(from, &EventFilter::all())
    }
}
