//! # Ports Layer
//!
//! - `inbound`: driving the projector
//! - `outbound`: the event source and the checkpoint store

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
