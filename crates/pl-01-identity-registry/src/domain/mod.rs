//! # Domain Layer (Inner Hexagon)
//!
//! Pure registry logic. No I/O, no async.

pub mod invariants;
pub mod registry;

/// Input size limits enforced on every write.
pub mod limits {
    /// Maximum length of an actor display name, in bytes.
    pub const MAX_NAME_LEN: usize = 128;
    /// Maximum length of an entity key, in bytes.
    pub const MAX_KEY_LEN: usize = 128;
    /// Maximum length of entity metadata, in bytes.
    pub const MAX_METADATA_LEN: usize = 1024;
}

pub use invariants::*;
pub use registry::*;
