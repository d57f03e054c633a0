//! # Adapters Layer
//!
//! Checkpoint store implementations.

pub mod checkpoint;

pub use checkpoint::*;
