//! # Domain Layer (Inner Hexagon)
//!
//! Task table, lifecycle transitions and deployment policy.

pub mod marketplace;
pub mod policy;

/// Input size limits enforced on every write.
pub mod limits {
    /// Maximum length of a task description, in bytes.
    pub const MAX_DESCRIPTION_LEN: usize = 512;
}

pub use marketplace::*;
pub use policy::*;
