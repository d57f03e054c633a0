//! # Ports Layer
//!
//! - `inbound`: the marketplace command and query API
//! - `outbound`: what the marketplace needs to know about actors

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
