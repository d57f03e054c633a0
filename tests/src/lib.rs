//! # Provenance-Ledger Test Suite
//!
//! Cross-crate scenarios that need the registry, the marketplace, the audit
//! log, the ledger runtime and the projector together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # Command-level flows and access-control properties
//!     └── projection.rs  # Running node, event stream and read model
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pl-tests
//! cargo test -p pl-tests integration::scenarios::
//! ```

#![allow(dead_code)]

pub mod integration;
