//! # Domain Layer (Inner Hexagon)
//!
//! The read model, the cursor and the fold/rollback logic. No I/O.

pub mod errors;
pub mod projector;
pub mod read_model;

pub use errors::*;
pub use projector::*;
pub use read_model::*;
