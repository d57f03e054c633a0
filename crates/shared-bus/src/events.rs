//! # Ledger Events
//!
//! The seven state-change events emitted by the identity registry, the task
//! marketplace and the audit log, plus the sequencing envelope the ledger
//! wraps them in.
//!
//! ## Ordering
//!
//! Every accepted command produces exactly one event. The ledger assigns it a
//! sequence number (1-based, dense) and chains it to the previous event by
//! hash:
//!
//! ```text
//! hash(n) = sha256(hash(n-1) || n || height || timestamp || json(event))
//! ```
//!
//! A consumer that remembers `(sequence, hash)` of the last event it applied
//! can tell a duplicate (same sequence, same hash), a gap (sequence jumps
//! ahead) and a reorganisation (same sequence, different hash) apart.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use shared_types::entities::{
    Address, BlockHeight, Digest, EntityKey, EntityKind, SequenceNumber, TaskId, Timestamp,
};

/// Hash of the (virtual) event preceding sequence 1.
pub const GENESIS_EVENT_HASH: Digest = Digest::ZERO;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    // =========================================================================
    // IDENTITY REGISTRY
    // =========================================================================
    /// An actor was added to (or restored on) the allow-list.
    ActorAuthorized { key: Address, name: String },

    /// An actor's authorization was revoked.
    ActorRemoved { key: Address },

    /// A product or drone profile was registered.
    EntityRegistered {
        key: EntityKey,
        kind: EntityKind,
        metadata: String,
        owner: Address,
    },

    // =========================================================================
    // TASK MARKETPLACE
    // =========================================================================
    /// A task was posted and is open for bids.
    TaskPosted {
        id: TaskId,
        description: String,
        deadline: Timestamp,
    },

    /// A bid was accepted.
    TaskBid { id: TaskId, bidder: Address },

    /// A task was assigned to its earliest bidder.
    TaskAssigned { id: TaskId, assignee: Address },

    // =========================================================================
    // AUDIT LOG
    // =========================================================================
    /// The assignee recorded the task's result.
    ResultLogged {
        id: TaskId,
        digest: Digest,
        by: Address,
    },
}

impl LedgerEvent {
    /// Get the kind of this event (for filtering).
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ActorAuthorized { .. } => EventKind::ActorAuthorized,
            Self::ActorRemoved { .. } => EventKind::ActorRemoved,
            Self::EntityRegistered { .. } => EventKind::EntityRegistered,
            Self::TaskPosted { .. } => EventKind::TaskPosted,
            Self::TaskBid { .. } => EventKind::TaskBid,
            Self::TaskAssigned { .. } => EventKind::TaskAssigned,
            Self::ResultLogged { .. } => EventKind::ResultLogged,
        }
    }

    /// Keys this event is about, for key-based filtering.
    #[must_use]
    pub fn keys(&self) -> Vec<EventKey> {
        match self {
            Self::ActorAuthorized { key, .. } | Self::ActorRemoved { key } => {
                vec![EventKey::Actor(*key)]
            }
            Self::EntityRegistered { key, owner, .. } => {
                vec![EventKey::Entity(key.clone()), EventKey::Actor(*owner)]
            }
            Self::TaskPosted { id, .. } => vec![EventKey::Task(*id)],
            Self::TaskBid { id, bidder } => vec![EventKey::Task(*id), EventKey::Actor(*bidder)],
            Self::TaskAssigned { id, assignee } => {
                vec![EventKey::Task(*id), EventKey::Actor(*assignee)]
            }
            Self::ResultLogged { id, by, .. } => vec![EventKey::Task(*id), EventKey::Actor(*by)],
        }
    }
}

/// Event kinds for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ActorAuthorized,
    ActorRemoved,
    EntityRegistered,
    TaskPosted,
    TaskBid,
    TaskAssigned,
    ResultLogged,
}

/// A key an event can be filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKey {
    /// An actor address.
    Actor(Address),
    /// A registered entity key.
    Entity(EntityKey),
    /// A task id.
    Task(TaskId),
}

/// An event with its position in the global order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// Global sequence number (1-based, dense).
    pub sequence: SequenceNumber,
    /// Height of the block that included the command.
    pub height: BlockHeight,
    /// Block time.
    pub timestamp: Timestamp,
    /// Hash of the preceding event.
    pub prev_hash: Digest,
    /// Hash of this event, chained to `prev_hash`.
    pub hash: Digest,
    /// The event itself.
    pub event: LedgerEvent,
}

impl SequencedEvent {
    /// Wrap an event, computing its chained hash.
    #[must_use]
    pub fn seal(
        sequence: SequenceNumber,
        height: BlockHeight,
        timestamp: Timestamp,
        prev_hash: Digest,
        event: LedgerEvent,
    ) -> Self {
        let hash = Self::compute_hash(sequence, height, timestamp, &prev_hash, &event);
        Self {
            sequence,
            height,
            timestamp,
            prev_hash,
            hash,
            event,
        }
    }

    /// Recompute the hash and compare with the stored one.
    #[must_use]
    pub fn verify_hash(&self) -> bool {
        Self::compute_hash(
            self.sequence,
            self.height,
            self.timestamp,
            &self.prev_hash,
            &self.event,
        ) == self.hash
    }

    fn compute_hash(
        sequence: SequenceNumber,
        height: BlockHeight,
        timestamp: Timestamp,
        prev_hash: &Digest,
        event: &LedgerEvent,
    ) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(prev_hash.as_bytes());
        hasher.update(sequence.to_be_bytes());
        hasher.update(height.to_be_bytes());
        hasher.update(timestamp.to_be_bytes());
        // Serializing a plain data enum cannot fail; an empty body still
        // yields a distinct hash through the sequence and parent.
        hasher.update(serde_json::to_vec(event).unwrap_or_default());
        Digest::new(hasher.finalize().into())
    }
}

/// Filter for subscribing to specific events.
///
/// Empty lists match everything; kinds and keys combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
    /// Keys to include (any match). Empty means all keys.
    pub keys: Vec<EventKey>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds,
            keys: Vec::new(),
        }
    }

    /// Create a filter for events about a key.
    #[must_use]
    pub fn key(key: EventKey) -> Self {
        Self {
            kinds: Vec::new(),
            keys: vec![key],
        }
    }

    /// Narrow this filter to events about a key.
    #[must_use]
    pub fn with_key(mut self, key: EventKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let kind_match = self.kinds.is_empty() || self.kinds.contains(&event.kind());
        let key_match =
            self.keys.is_empty() || event.keys().iter().any(|key| self.keys.contains(key));
        kind_match && key_match
    }
}
