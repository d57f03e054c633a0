//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `IdentityRegistryApi`
//!
//! The registry has no driven ports: it depends on nothing.

pub mod inbound;

pub use inbound::*;
