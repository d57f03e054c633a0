//! # Domain Layer (Inner Hexagon)

pub mod audit_log;

pub use audit_log::*;
