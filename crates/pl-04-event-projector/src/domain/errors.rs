//! Projector error types.

use shared_types::SequenceNumber;
use thiserror::Error;

/// Projection failures. Each leaves the read model at the last good cursor.
#[derive(Debug, Error)]
pub enum ProjectorError {
    /// The event's stored hash does not match its contents.
    #[error("event {sequence} failed hash verification")]
    CorruptEvent { sequence: SequenceNumber },

    /// The source returned an event that does not chain to its predecessor.
    #[error("event {sequence} does not chain to the event before it")]
    BrokenChain { sequence: SequenceNumber },

    /// The source skipped a sequence number.
    #[error("event source is missing sequence {expected}, next available is {found}")]
    MissingEvent {
        expected: SequenceNumber,
        found: SequenceNumber,
    },

    /// Checkpoint could not be read or written.
    #[error("checkpoint I/O error: {0}")]
    CheckpointIo(#[from] std::io::Error),

    /// Checkpoint contents could not be parsed or encoded.
    #[error("checkpoint format error: {0}")]
    CheckpointFormat(#[from] serde_json::Error),
}

/// Result type for projector operations.
pub type ProjectorResult<T> = Result<T, ProjectorError>;
