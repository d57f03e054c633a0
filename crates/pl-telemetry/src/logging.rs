//! `tracing` subscriber installation.

use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Install the global `fmt` subscriber described by `config`.
///
/// # Errors
///
/// `Config` for an unparsable filter directive, `LoggingInit` if a global
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level '{}': {e}", config.log_level)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let installed = if config.json_logs {
        builder
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
