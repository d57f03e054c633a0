//! # Driven Ports (SPI - Outbound)

use shared_bus::SequencedEvent;
use shared_types::SequenceNumber;

use crate::domain::errors::ProjectorResult;
use crate::domain::projector::Checkpoint;

/// The authoritative, ordered event log.
pub trait EventSource: Send + Sync {
    /// Sequence of the newest event, 0 when empty.
    fn latest_sequence(&self) -> SequenceNumber;

    /// The event at `sequence`, if it exists.
    fn event_at(&self, sequence: SequenceNumber) -> Option<SequencedEvent>;

    /// All events with sequence `>= from`, in order.
    fn events_from(&self, from: SequenceNumber) -> Vec<SequencedEvent>;
}

/// Durable storage for the projector's checkpoint.
pub trait CheckpointStore: Send {
    /// The last saved checkpoint, `None` on first start.
    ///
    /// # Errors
    ///
    /// I/O or format errors from the backing store.
    fn load(&self) -> ProjectorResult<Option<Checkpoint>>;

    /// Replace the saved checkpoint.
    ///
    /// # Errors
    ///
    /// I/O or format errors from the backing store.
    fn save(&mut self, checkpoint: &Checkpoint) -> ProjectorResult<()>;
}
