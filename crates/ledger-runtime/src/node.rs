//! # Ledger Node
//!
//! Wires the ledger, the event bus and the projector into one running
//! process.
//!
//! ```text
//!  LedgerClient ──submit──▶ InMemoryLedger ◀──produce_block()── block producer task
//!                                │                                   │ publish
//!                                │ events_from() backfill            ▼
//!                                └──────────────────▶ projector task ◀── InMemoryEventBus
//! ```
//!
//! Both tasks stop when the shutdown channel flips; the projector saves a
//! final checkpoint on the way out.

use parking_lot::RwLock;
use pl_04_event_projector::adapters::{InMemoryCheckpointStore, JsonFileCheckpointStore};
use pl_04_event_projector::domain::errors::ProjectorError;
use pl_04_event_projector::ports::outbound::CheckpointStore;
use pl_04_event_projector::service::{ProjectorConfig, ProjectorService, SharedProjector};
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
use shared_types::Address;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::adapters::LedgerEventSource;
use crate::chain::{InMemoryLedger, SealedBlock, SharedLedger};
use crate::client::LedgerClient;
use crate::container::{ConfigError, LedgerConfig};
use crate::time::{SystemTimeSource, TimeSource};

/// Applied events between projector checkpoints.
const CHECKPOINT_EVERY: u64 = 100;

/// Node startup errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The configuration cannot be run.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The projector could not load its checkpoint.
    #[error("projector: {0}")]
    Projector(#[from] ProjectorError),
}

/// A running ledger with its block producer and projector.
pub struct LedgerNode {
    config: LedgerConfig,
    ledger: SharedLedger,
    bus: Arc<InMemoryEventBus>,
    projector: SharedProjector,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl LedgerNode {
    /// Start on the wall clock. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Invalid configuration or an unreadable checkpoint.
    pub fn start(config: LedgerConfig) -> Result<Self, NodeError> {
        Self::start_with_clock(config, Arc::new(SystemTimeSource::new()))
    }

    /// Start on an arbitrary clock.
    ///
    /// # Errors
    ///
    /// Invalid configuration or an unreadable checkpoint.
    pub fn start_with_clock(
        config: LedgerConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        info!(
            owner = %config.owner,
            finality_depth = config.finality_depth,
            posting = %config.marketplace.posting,
            "Starting provenance ledger node"
        );

        let ledger: SharedLedger = Arc::new(RwLock::new(InMemoryLedger::new(
            config.owner,
            config.marketplace,
            config.finality_depth,
            clock,
        )));
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let store: Box<dyn CheckpointStore> = match &config.checkpoint_path {
            Some(path) => {
                info!("[pl-04] Checkpointing to {}", path.display());
                Box::new(JsonFileCheckpointStore::new(path))
            }
            None => Box::new(InMemoryCheckpointStore::new()),
        };
        let service = ProjectorService::new(
            LedgerEventSource::shared(Arc::clone(&ledger)),
            store,
            ProjectorConfig {
                poll_interval: config.projector_poll,
                checkpoint_every: CHECKPOINT_EVERY,
            },
        )?;
        let projector = service.handle();

        let mut tasks = Vec::with_capacity(2);
        tasks.push(tokio::spawn(
            service.run(bus.subscribe(EventFilter::all()), shutdown_rx.clone()),
        ));
        tasks.push(tokio::spawn(run_block_producer(
            Arc::clone(&ledger),
            Arc::clone(&bus),
            config.block_interval,
            shutdown_rx,
        )));

        Ok(Self {
            config,
            ledger,
            bus,
            projector,
            shutdown_tx,
            tasks,
        })
    }

    /// Client signing as `caller`.
    #[must_use]
    pub fn client(&self, caller: Address) -> LedgerClient {
        LedgerClient::new(Arc::clone(&self.ledger), caller)
    }

    /// Read handle on the projection.
    #[must_use]
    pub fn projector(&self) -> SharedProjector {
        Arc::clone(&self.projector)
    }

    /// The shared ledger.
    #[must_use]
    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    /// The live event bus.
    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Configuration the node runs with.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Seal the pending pool now instead of waiting for the producer.
    pub async fn seal_now(&self) -> Option<SealedBlock> {
        let block = self.ledger.write().seal_block()?;
        publish_block(&self.bus, &block).await;
        Some(block)
    }

    /// Stop both tasks and wait for them.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Node task ended abnormally: {}", e);
            }
        }
        info!("Shutdown complete");
    }
}

async fn publish_block(bus: &InMemoryEventBus, block: &SealedBlock) {
    for event in &block.events {
        bus.publish(event.clone()).await;
    }
}

/// Seal on every tick while there is work, publishing each block's events.
#[instrument(skip_all, name = "block_producer")]
async fn run_block_producer(
    ledger: SharedLedger,
    bus: Arc<InMemoryEventBus>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("[ledger] Block producer started, interval {:?}", interval);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("[ledger] Shutdown signal received");
                    break;
                }
            }
            _ = ticker.tick() => {
                let block = ledger.write().produce_block();
                if let Some(block) = block {
                    debug!(
                        height = block.height,
                        events = block.events.len(),
                        "[ledger] Publishing block"
                    );
                    publish_block(&bus, &block).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use pl_04_event_projector::ports::inbound::ProjectorApi;
    use pl_04_event_projector::service::wait_for_sequence;
    use shared_types::{Command, Digest};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config(finality_depth: u64) -> LedgerConfig {
        LedgerConfig {
            finality_depth,
            block_interval: Duration::from_millis(10),
            projector_poll: Duration::from_millis(20),
            ..LedgerConfig::default()
        }
    }

    fn drone(n: u8) -> Address {
        Address::derive(&format!("drone-{n}"))
    }

    #[tokio::test]
    async fn test_node_runs_inspection_flow() {
        let node =
            LedgerNode::start_with_clock(fast_config(1), Arc::new(ManualClock::new(1_000)))
                .unwrap();
        let owner = node.client(node.config().owner);

        for n in 1..=2 {
            owner
                .execute(
                    Command::AddAuthorized {
                        key: drone(n),
                        name: format!("Drone{n}"),
                    },
                    TIMEOUT,
                )
                .await
                .unwrap();
        }
        owner
            .execute(
                Command::PostTask {
                    description: "Inspect Tank A-12".into(),
                    deadline: 2_000,
                },
                TIMEOUT,
            )
            .await
            .unwrap();
        node.client(drone(1))
            .execute(Command::Bid { task_id: 0 }, TIMEOUT)
            .await
            .unwrap();
        node.client(drone(2))
            .execute(Command::Bid { task_id: 0 }, TIMEOUT)
            .await
            .unwrap();
        owner
            .execute(Command::Assign { task_id: 0 }, TIMEOUT)
            .await
            .unwrap();
        let digest = Digest::of(b"tank ok");
        let logged = node
            .client(drone(1))
            .execute(Command::LogResult { task_id: 0, digest }, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(owner.get_task(0).unwrap().assigned_to, Some(drone(1)));
        assert_eq!(owner.get_log(0).unwrap().digest, digest);

        let projector = node.projector();
        assert!(wait_for_sequence(&projector, logged.sequence, TIMEOUT).await);
        {
            let view = projector.read();
            let model = view.read_model();
            assert_eq!(model.actors().len(), 2);
            assert_eq!(model.task(0).unwrap().assignee, Some(drone(1)));
            assert_eq!(model.log(0).unwrap().digest, digest);
        }

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_projector_rebuilds_after_revert() {
        let config = LedgerConfig {
            finality_depth: 10,
            block_interval: Duration::from_secs(3_600),
            projector_poll: Duration::from_millis(20),
            ..LedgerConfig::default()
        };
        let node = LedgerNode::start_with_clock(config, Arc::new(ManualClock::new(1_000))).unwrap();
        let owner = node.client(node.config().owner);

        owner
            .submit(Command::AddAuthorized {
                key: drone(1),
                name: "Drone1".into(),
            })
            .unwrap();
        node.seal_now().await.unwrap();
        owner
            .submit(Command::AddAuthorized {
                key: drone(2),
                name: "Drone2".into(),
            })
            .unwrap();
        node.seal_now().await.unwrap();

        let projector = node.projector();
        assert!(wait_for_sequence(&projector, 2, TIMEOUT).await);

        node.ledger().write().revert_blocks(1).unwrap();
        owner
            .submit(Command::AddAuthorized {
                key: drone(3),
                name: "Drone3".into(),
            })
            .unwrap();
        node.seal_now().await.unwrap();

        let deadline = tokio::time::Instant::now() + TIMEOUT;
        loop {
            let actor = projector.read().read_model().actor(&drone(3)).cloned();
            if actor.is_some() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "projection never converged");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        {
            let view = projector.read();
            assert!(view.read_model().actor(&drone(2)).is_none());
            assert_eq!(view.cursor().sequence, 2);
            assert!(view.rebuilds() >= 1);
        }

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_refused() {
        let config = LedgerConfig {
            block_interval: Duration::ZERO,
            ..LedgerConfig::default()
        };
        assert!(matches!(
            LedgerNode::start(config),
            Err(NodeError::Config(ConfigError::ZeroInterval(_)))
        ));
    }
}
