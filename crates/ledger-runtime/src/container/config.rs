//! # Ledger Configuration
//!
//! Runtime parameters for the ledger node. Every field has a default; the
//! `PL_*` environment variables override them in [`load_config`].

use pl_02_task_marketplace::domain::policy::{MarketplacePolicy, PostingPolicy};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::{Address, BlockHeight};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Label the default owner address is derived from.
pub const DEFAULT_OWNER_LABEL: &str = "owner";

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// The distinguished owner, fixed at creation.
    pub owner: Address,
    /// Blocks a block must be buried under before it is final.
    pub finality_depth: BlockHeight,
    /// Interval between sealing attempts.
    pub block_interval: Duration,
    /// Deployment variant of the marketplace.
    pub marketplace: MarketplacePolicy,
    /// Where the projector keeps its checkpoint. In memory when `None`.
    pub checkpoint_path: Option<PathBuf>,
    /// Interval between projector reconciliations.
    pub projector_poll: Duration,
    /// Event bus buffer per subscriber.
    pub bus_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: Address::derive(DEFAULT_OWNER_LABEL),
            finality_depth: 0,
            block_interval: Duration::from_millis(1000),
            marketplace: MarketplacePolicy::default(),
            checkpoint_path: None,
            projector_poll: Duration::from_millis(500),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Reject values the runtime cannot start with.
    ///
    /// # Errors
    ///
    /// Zero intervals, a zero owner or a zero bus capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_zero() {
            return Err(ConfigError::ZeroOwner);
        }
        if self.block_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("block_interval"));
        }
        if self.projector_poll.is_zero() {
            return Err(ConfigError::ZeroInterval("projector_poll"));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The owner must be a real address.
    #[error("owner address must not be zero")]
    ZeroOwner,
    /// Timers cannot run at a zero period.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    /// The broadcast channel needs room for at least one event.
    #[error("bus capacity must be greater than zero")]
    ZeroCapacity,
}

/// Build the configuration from defaults and the process environment.
#[must_use]
pub fn load_config() -> LedgerConfig {
    load_config_from(|name| std::env::var(name).ok())
}

/// Build the configuration from defaults and an arbitrary variable lookup.
pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> LedgerConfig {
    let mut config = LedgerConfig::default();

    if let Some(raw) = lookup("PL_OWNER") {
        match raw.parse::<Address>() {
            Ok(owner) if !owner.is_zero() => {
                config.owner = owner;
                info!("Loaded owner {} from environment", owner);
            }
            Ok(_) => warn!("PL_OWNER must not be the zero address"),
            Err(e) => warn!("Ignoring PL_OWNER: {}", e),
        }
    }

    if let Some(depth) = parse_var::<u64>(&lookup, "PL_FINALITY_DEPTH") {
        config.finality_depth = depth;
    }
    if let Some(ms) = parse_millis(&lookup, "PL_BLOCK_INTERVAL_MS") {
        config.block_interval = ms;
    }
    if let Some(ms) = parse_millis(&lookup, "PL_PROJECTOR_POLL_MS") {
        config.projector_poll = ms;
    }
    if let Some(posting) = parse_var::<PostingPolicy>(&lookup, "PL_POSTING_POLICY") {
        config.marketplace.posting = posting;
    }
    if let Some(required) = parse_var::<bool>(&lookup, "PL_REQUIRE_AUTHORIZED_BIDDERS") {
        config.marketplace.require_authorized_bidders = required;
    }
    if let Some(path) = lookup("PL_CHECKPOINT_PATH").filter(|p| !p.trim().is_empty()) {
        config.checkpoint_path = Some(PathBuf::from(path));
    }

    config
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

fn parse_millis(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<Duration> {
    match parse_var::<u64>(lookup, name)? {
        0 => {
            warn!("Ignoring {}=0: interval must be positive", name);
            None
        }
        ms => Some(Duration::from_millis(ms)),
    }
}
