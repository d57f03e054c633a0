//! Prometheus metrics for Provenance-Ledger.
//!
//! All metrics follow the naming convention: `pl_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // COMMAND METRICS (ledger)
    // =========================================================================

    /// Commands accepted into the pending pool
    pub static ref COMMANDS_SUBMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_ledger_commands_submitted_total", "Commands accepted at submission"),
        &["command"]
    ).expect("metric creation failed");

    /// Commands rejected at submission
    pub static ref COMMANDS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("pl_ledger_commands_rejected_total", "Commands rejected at submission"),
        &["command", "category"]
    ).expect("metric creation failed");

    /// Commands executed in a sealed block
    pub static ref COMMANDS_INCLUDED: IntCounter = IntCounter::new(
        "pl_ledger_commands_included_total",
        "Commands executed successfully in a sealed block"
    ).expect("metric creation failed");

    /// Commands that became invalid between submission and inclusion
    pub static ref COMMANDS_FAILED: IntCounter = IntCounter::new(
        "pl_ledger_commands_failed_total",
        "Commands that failed when their block was sealed"
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCK METRICS (ledger)
    // =========================================================================

    /// Blocks sealed
    pub static ref BLOCKS_SEALED: IntCounter = IntCounter::new(
        "pl_ledger_blocks_sealed_total",
        "Total number of blocks sealed"
    ).expect("metric creation failed");

    /// Blocks reverted
    pub static ref BLOCKS_REVERTED: IntCounter = IntCounter::new(
        "pl_ledger_blocks_reverted_total",
        "Total number of unfinalized blocks reverted"
    ).expect("metric creation failed");

    /// Current head height
    pub static ref CHAIN_HEIGHT: IntGauge = IntGauge::new(
        "pl_ledger_chain_height",
        "Height of the current head block"
    ).expect("metric creation failed");

    /// Current finalized height
    pub static ref FINALIZED_HEIGHT: IntGauge = IntGauge::new(
        "pl_ledger_finalized_height",
        "Height of the last finalized block"
    ).expect("metric creation failed");

    // =========================================================================
    // PROJECTOR METRICS (Subsystem 4)
    // =========================================================================

    /// Events folded into the read model
    pub static ref EVENTS_PROJECTED: IntCounter = IntCounter::new(
        "pl_projector_events_projected_total",
        "Events applied to the read model"
    ).expect("metric creation failed");

    /// Rollbacks and full rebuilds
    pub static ref PROJECTOR_REBUILDS: IntCounter = IntCounter::new(
        "pl_projector_rebuilds_total",
        "Read model rebuilds after a gap or reorganisation"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
///
/// # Errors
///
/// `MetricsInit` if a collector conflicts with an unrelated registration.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Commands
        Box::new(COMMANDS_SUBMITTED.clone()),
        Box::new(COMMANDS_REJECTED.clone()),
        Box::new(COMMANDS_INCLUDED.clone()),
        Box::new(COMMANDS_FAILED.clone()),
        // Blocks
        Box::new(BLOCKS_SEALED.clone()),
        Box::new(BLOCKS_REVERTED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(FINALIZED_HEIGHT.clone()),
        // Projector
        Box::new(EVENTS_PROJECTED.clone()),
        Box::new(PROJECTOR_REBUILDS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// `MetricsInit` if encoding fails.
pub fn metrics_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
