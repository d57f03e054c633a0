//! # PL Telemetry
//!
//! Logging and metrics bootstrap shared by the Provenance-Ledger binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! pl_telemetry::BLOCKS_SEALED.inc();
//! println!("{}", pl_telemetry::metrics_text()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PL_SERVICE_NAME` | `provenance-ledger` | Service name in logs |
//! | `PL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `PL_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    metrics_text, register_metrics, BLOCKS_REVERTED, BLOCKS_SEALED, CHAIN_HEIGHT,
    COMMANDS_FAILED, COMMANDS_INCLUDED, COMMANDS_REJECTED, COMMANDS_SUBMITTED, EVENTS_PROJECTED,
    FINALIZED_HEIGHT, PROJECTOR_REBUILDS, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install logging.
///
/// # Errors
///
/// See [`register_metrics`] and [`init_logging`].
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
