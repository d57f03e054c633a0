//! # Event Projector
//!
//! Folds sequenced events into a [`ReadModel`] behind a cursor.
//!
//! The projector remembers the hash of every event it applied. With that it
//! classifies each incoming event:
//!
//! | Incoming | Condition | Action |
//! |----------|-----------|--------|
//! | `seq <= cursor` | same hash as applied | duplicate, ignored |
//! | `seq <= cursor` | different hash | divergence, needs sync |
//! | `seq == cursor + 1` | chains to cursor hash | applied, buffer drained |
//! | `seq == cursor + 1` | does not chain | divergence, needs sync |
//! | `seq > cursor + 1` | | buffered until the gap closes |
//!
//! [`sync`](EventProjector::sync) reconciles against the authoritative
//! source: it finds the newest sequence where its applied hash still matches
//! the source, rebuilds the model from zero up to that point if anything
//! after it changed, then applies the rest of the source in order.

use serde::{Deserialize, Serialize};
use shared_bus::{SequencedEvent, GENESIS_EVENT_HASH};
use shared_types::{Digest, SequenceNumber};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::errors::{ProjectorError, ProjectorResult};
use super::read_model::ReadModel;
use crate::ports::inbound::ProjectorApi;
use crate::ports::outbound::EventSource;

/// Position of the last applied event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Sequence of the last applied event, 0 when nothing was applied.
    pub sequence: SequenceNumber,
    /// Hash of that event.
    pub hash: Digest,
}

impl Cursor {
    /// Before the first event.
    pub const GENESIS: Self = Self {
        sequence: 0,
        hash: GENESIS_EVENT_HASH,
    };
}

/// Persistable projector state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The read model at the cursor.
    pub model: ReadModel,
    /// Hashes of applied events; index `i` holds sequence `i + 1`.
    pub hashes: Vec<Digest>,
}

impl Checkpoint {
    /// Cursor this checkpoint was taken at.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        cursor_of(&self.hashes)
    }
}

/// What [`EventProjector::ingest`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Applied, together with this many events total (buffered ones included).
    Applied(usize),
    /// Already applied with the same hash.
    Duplicate,
    /// Ahead of the cursor; held until `expected` arrives.
    Buffered { expected: SequenceNumber },
    /// Conflicts with what was applied at or before `sequence`.
    Diverged { sequence: SequenceNumber },
}

impl IngestOutcome {
    /// Whether the caller should reconcile with the source.
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        matches!(self, Self::Buffered { .. } | Self::Diverged { .. })
    }
}

/// Result of [`EventProjector::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Events applied after the common ancestor (rebuild replay excluded).
    pub applied: usize,
    /// Set when the suffix after this sequence was discarded and rebuilt.
    pub rolled_back_to: Option<SequenceNumber>,
}

/// Cursor-tracking fold over the event stream.
#[derive(Debug, Default)]
pub struct EventProjector {
    model: ReadModel,
    hashes: Vec<Digest>,
    pending: BTreeMap<SequenceNumber, SequencedEvent>,
    rebuilds: u64,
}

impl EventProjector {
    /// Projector at genesis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a saved checkpoint.
    #[must_use]
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            model: checkpoint.model,
            hashes: checkpoint.hashes,
            pending: BTreeMap::new(),
            rebuilds: 0,
        }
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            model: self.model.clone(),
            hashes: self.hashes.clone(),
        }
    }

    /// Number of rollbacks performed since creation.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Number of out-of-order events waiting for a gap to close.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discard everything and return to genesis.
    pub fn reset(&mut self) {
        self.model = ReadModel::new();
        self.hashes.clear();
        self.pending.clear();
    }

    fn hash_at(&self, sequence: SequenceNumber) -> Option<Digest> {
        let idx = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.hashes.get(idx).copied()
    }

    fn append(&mut self, event: &SequencedEvent) {
        self.model.apply(event);
        self.hashes.push(event.hash);
    }

    fn append_checked(&mut self, event: &SequencedEvent) -> ProjectorResult<()> {
        if !event.verify_hash() {
            return Err(ProjectorError::CorruptEvent {
                sequence: event.sequence,
            });
        }
        if event.prev_hash != self.cursor().hash {
            return Err(ProjectorError::BrokenChain {
                sequence: event.sequence,
            });
        }
        self.append(event);
        Ok(())
    }

    fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let cursor = self.cursor();
            // Anything at or below the cursor is stale.
            self.pending = self.pending.split_off(&(cursor.sequence + 1));
            let Some(next) = self.pending.remove(&(cursor.sequence + 1)) else {
                return applied;
            };
            if next.prev_hash != cursor.hash {
                debug!(
                    sequence = next.sequence,
                    "[pl-04] Buffered event no longer chains, dropping buffer"
                );
                self.pending.clear();
                return applied;
            }
            self.append(&next);
            applied += 1;
        }
    }

    /// Newest sequence at which the applied hash still matches the source.
    fn common_ancestor(&self, source: &dyn EventSource) -> SequenceNumber {
        let mut sequence = self.cursor().sequence.min(source.latest_sequence());
        while sequence > 0 {
            let matches = source
                .event_at(sequence)
                .is_some_and(|e| Some(e.hash) == self.hash_at(sequence));
            if matches {
                break;
            }
            sequence -= 1;
        }
        sequence
    }

    fn rebuild_to(
        &mut self,
        source: &dyn EventSource,
        ancestor: SequenceNumber,
    ) -> ProjectorResult<()> {
        let discarded = self.cursor().sequence - ancestor;
        self.reset();
        self.rebuilds += 1;
        for event in source
            .events_from(1)
            .iter()
            .take_while(|e| e.sequence <= ancestor)
        {
            self.append_checked(event)?;
        }
        info!(
            ancestor,
            discarded, "[pl-04] Read model rebuilt after divergence"
        );
        Ok(())
    }
}

fn cursor_of(hashes: &[Digest]) -> Cursor {
    match hashes.last() {
        Some(hash) => Cursor {
            sequence: hashes.len() as SequenceNumber,
            hash: *hash,
        },
        None => Cursor::GENESIS,
    }
}

impl ProjectorApi for EventProjector {
    fn ingest(&mut self, event: SequencedEvent) -> ProjectorResult<IngestOutcome> {
        if event.sequence == 0 || !event.verify_hash() {
            return Err(ProjectorError::CorruptEvent {
                sequence: event.sequence,
            });
        }
        let cursor = self.cursor();

        if event.sequence <= cursor.sequence {
            return Ok(if self.hash_at(event.sequence) == Some(event.hash) {
                IngestOutcome::Duplicate
            } else {
                IngestOutcome::Diverged {
                    sequence: event.sequence,
                }
            });
        }
        if event.sequence > cursor.sequence + 1 {
            self.pending.insert(event.sequence, event);
            return Ok(IngestOutcome::Buffered {
                expected: cursor.sequence + 1,
            });
        }
        if event.prev_hash != cursor.hash {
            return Ok(IngestOutcome::Diverged {
                sequence: event.sequence,
            });
        }

        self.append(&event);
        Ok(IngestOutcome::Applied(1 + self.drain_pending()))
    }

    fn sync(&mut self, source: &dyn EventSource) -> ProjectorResult<SyncReport> {
        let mut report = SyncReport::default();

        let ancestor = self.common_ancestor(source);
        if ancestor < self.cursor().sequence {
            self.rebuild_to(source, ancestor)?;
            report.rolled_back_to = Some(ancestor);
        }

        let mut expected = self.cursor().sequence + 1;
        for event in source.events_from(expected) {
            if event.sequence != expected {
                return Err(ProjectorError::MissingEvent {
                    expected,
                    found: event.sequence,
                });
            }
            self.append_checked(&event)?;
            expected += 1;
            report.applied += 1;
        }

        let cursor = self.cursor().sequence;
        self.pending.retain(|sequence, _| *sequence > cursor);
        Ok(report)
    }

    fn cursor(&self) -> Cursor {
        cursor_of(&self.hashes)
    }

    fn read_model(&self) -> &ReadModel {
        &self.model
    }
}
