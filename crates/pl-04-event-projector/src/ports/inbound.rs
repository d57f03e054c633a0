//! # Driving Ports (API - Inbound)

use shared_bus::SequencedEvent;

use super::outbound::EventSource;
use crate::domain::errors::ProjectorResult;
use crate::domain::projector::{Cursor, IngestOutcome, SyncReport};
use crate::domain::read_model::ReadModel;

/// Primary API of the event projector.
pub trait ProjectorApi {
    /// Offer one event from a live feed. Ordering is decided by its sequence
    /// number, never by arrival.
    ///
    /// # Errors
    ///
    /// `CorruptEvent` if the event's hash does not verify.
    fn ingest(&mut self, event: SequencedEvent) -> ProjectorResult<IngestOutcome>;

    /// Reconcile with the authoritative log: roll back a diverged suffix,
    /// then apply everything after the cursor.
    ///
    /// # Errors
    ///
    /// `CorruptEvent`, `BrokenChain` or `MissingEvent` if the source itself
    /// is inconsistent. The cursor stays at the last good event.
    fn sync(&mut self, source: &dyn EventSource) -> ProjectorResult<SyncReport>;

    /// Position of the last applied event.
    fn cursor(&self) -> Cursor;

    /// The projected state at the cursor.
    fn read_model(&self) -> &ReadModel;
}
