//! # Integration Tests
//!
//! Shared fixtures for the scenario and projection suites.

pub mod projection;
pub mod scenarios;

use ledger_runtime::chain::InMemoryLedger;
use ledger_runtime::time::ManualClock;
use pl_02_task_marketplace::domain::policy::MarketplacePolicy;
use shared_types::{Address, Command, Timestamp};
use std::sync::Arc;

/// Block time every fixture starts at.
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

/// The system owner used across fixtures.
pub fn owner() -> Address {
    Address::derive("owner")
}

/// Deterministic drone identity.
pub fn drone(n: u32) -> Address {
    Address::derive(&format!("drone-{n}"))
}

/// Deterministic producer identity.
pub fn producer(n: u32) -> Address {
    Address::derive(&format!("producer-{n}"))
}

/// Owner-side command adding `key` to the allow-list.
pub fn authorize(key: Address, name: &str) -> Command {
    Command::AddAuthorized {
        key,
        name: name.to_string(),
    }
}

/// Ledger on a stopped clock.
pub fn ledger(policy: MarketplacePolicy, finality_depth: u64) -> (InMemoryLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(GENESIS_TIME));
    let ledger = InMemoryLedger::new(owner(), policy, finality_depth, clock.clone());
    (ledger, clock)
}

/// Submit as `caller` and seal immediately; panics if either step fails.
pub fn commit(ledger: &mut InMemoryLedger, caller: Address, command: Command) {
    let name = command.name();
    let id = ledger
        .submit(caller, command)
        .unwrap_or_else(|e| panic!("{name} rejected: {e}"));
    ledger.seal_block();
    let status = ledger.status(&id).unwrap_or_else(|e| panic!("{name}: {e}"));
    assert!(
        !matches!(status, ledger_runtime::chain::CommandStatus::Failed { .. }),
        "{name} failed at inclusion: {status:?}"
    );
}
