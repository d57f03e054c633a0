//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `Actor`
//! - **Registry**: `EntityKey`, `EntityKind`, `RegisteredEntity`
//! - **Marketplace**: `TaskId`, `Task`, `TaskState`
//! - **Audit**: `Digest`, `InspectionLog`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Sequential task identifier, dense from 0.
pub type TaskId = u64;

/// Position of an accepted command (and its event) in the global order.
pub type SequenceNumber = u64;

/// Height of a sealed block.
pub type BlockHeight = u64;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 20-byte account address.
///
/// Serialized as a `0x`-prefixed lowercase hex string so it can be used as a
/// JSON map key in projections and checkpoints.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives a deterministic address from a label.
    ///
    /// Used for demo accounts and fixtures: the first 20 bytes of
    /// `sha256(label)`.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        let hash = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| LedgerError::InvalidInput {
            field: "address".to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| LedgerError::InvalidInput {
            field: "address".to_string(),
            reason: "expected 20 bytes".to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An authorized identity (producer or drone).
///
/// Removal deactivates the actor; the record is kept so past registrations
/// stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identity key.
    pub key: Address,
    /// Display name given by the owner.
    pub name: String,
    /// Whether the actor currently holds authorization.
    pub authorized: bool,
}

// =============================================================================
// CLUSTER B: REGISTRY
// =============================================================================

/// Unique key of a registered entity: a barcode, or a drone's address in
/// hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(pub String);

impl EntityKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<Address> for EntityKey {
    fn from(addr: Address) -> Self {
        Self(addr.to_string())
    }
}

/// What a registered entity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A product identified by its barcode.
    Product,
    /// A drone profile keyed by the drone's address.
    DroneProfile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => f.write_str("product"),
            Self::DroneProfile => f.write_str("drone"),
        }
    }
}

/// A registered object bound permanently to one owning actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredEntity {
    /// Unique key (never reused).
    pub key: EntityKey,
    /// Product or drone profile.
    pub kind: EntityKind,
    /// Descriptive metadata (product name, drone description).
    pub metadata: String,
    /// The owning actor.
    pub owner: Address,
    /// Who submitted the registration (the owner of the system or the actor).
    pub registered_by: Address,
}

// =============================================================================
// CLUSTER C: MARKETPLACE
// =============================================================================

/// Task lifecycle. `Assigned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Accepting bids.
    Open,
    /// An actor has been selected; no more bids.
    Assigned,
}

/// A unit of work posted to the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Dense sequential id.
    pub id: TaskId,
    /// Free-form description.
    pub description: String,
    /// Unix deadline in seconds.
    pub deadline: Timestamp,
    /// Who posted the task.
    pub poster: Address,
    /// Bidders in acceptance order, without duplicates.
    pub bidders: Vec<Address>,
    /// The selected actor once assigned.
    pub assigned_to: Option<Address>,
}

impl Task {
    /// Lifecycle state, derived from the assignment.
    #[must_use]
    pub fn state(&self) -> TaskState {
        if self.assigned_to.is_some() {
            TaskState::Assigned
        } else {
            TaskState::Open
        }
    }
}

// =============================================================================
// CLUSTER D: AUDIT
// =============================================================================

/// An opaque 32-byte content fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The zero digest.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a digest from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// SHA-256 of arbitrary content.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Digest {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| LedgerError::InvalidInput {
            field: "digest".to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| LedgerError::InvalidInput {
            field: "digest".to_string(),
            reason: "expected 32 bytes".to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The single immutable result recorded for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionLog {
    /// The task this result belongs to.
    pub task_id: TaskId,
    /// Content fingerprint of the result.
    pub digest: Digest,
    /// The assigned actor that wrote it.
    pub logged_by: Address,
    /// Block time of the write.
    pub logged_at: Timestamp,
}
