//! # Ledger Node - Main Entry Point
//!
//! Runs the provenance ledger: block producer, event bus and projector in
//! one process. `ledger-node demo barcode|drone` runs a scripted flow
//! against a fresh node and prints the projected lists as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::info;

use ledger_runtime::container::load_config;
use ledger_runtime::demo;
use ledger_runtime::node::LedgerNode;
use ledger_runtime::time::{SystemTimeSource, TimeSource};
use pl_telemetry::{init_telemetry, metrics_text, TelemetryConfig};

/// Provenance ledger node
#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Authorization-gated registry and task marketplace on an ordered ledger")]
struct Cli {
    /// Blocks a block must be buried under before it is final
    #[arg(long, global = true)]
    finality_depth: Option<u64>,

    /// Milliseconds between sealing attempts
    #[arg(long, global = true)]
    block_interval_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run until Ctrl+C (default)
    Run,
    /// Run a scripted flow and print the projection
    Demo {
        #[arg(value_enum)]
        flow: DemoFlow,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DemoFlow {
    /// Producer registers a barcode; duplicates are refused
    Barcode,
    /// Two drones bid on an inspection; the first one logs the result
    Drone,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    telemetry.json_logs |= cli.json_logs;
    init_telemetry(&telemetry).context("initializing telemetry")?;

    let mut config = load_config();
    if let Some(depth) = cli.finality_depth {
        config.finality_depth = depth;
    }
    if let Some(ms) = cli.block_interval_ms {
        config.block_interval = Duration::from_millis(ms);
    }

    let node = LedgerNode::start(config).context("starting ledger node")?;

    match cli.command.unwrap_or(Mode::Run) {
        Mode::Run => {
            info!("Node is running. Press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
        }
        Mode::Demo { flow } => {
            let lists = match flow {
                DemoFlow::Barcode => demo::barcode_flow(&node).await,
                DemoFlow::Drone => demo::drone_flow(&node, SystemTimeSource::new().now()).await,
            }
            .with_context(|| format!("{flow:?} demo"))?;
            println!("{}", serde_json::to_string_pretty(&lists)?);
        }
    }

    node.shutdown().await;
    info!("Final metrics:\n{}", metrics_text()?);
    Ok(())
}
