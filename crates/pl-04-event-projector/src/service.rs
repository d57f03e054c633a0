//! # Projector Service
//!
//! Runs the projector as an independent task. Live events arrive over the
//! bus; a poll timer reconciles with the ledger so dropped or delayed bus
//! deliveries never leave the read model behind for longer than one
//! interval.

use parking_lot::RwLock;
use shared_bus::{SequencedEvent, Subscription};
use shared_types::SequenceNumber;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::ProjectorResult;
use crate::domain::projector::{EventProjector, IngestOutcome, SyncReport};
use crate::ports::inbound::ProjectorApi;
use crate::ports::outbound::{CheckpointStore, EventSource};

/// Shared handle for reading the projection from other tasks.
pub type SharedProjector = Arc<RwLock<EventProjector>>;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorConfig {
    /// Interval between reconciliations with the ledger.
    pub poll_interval: Duration,
    /// Save a checkpoint after this many applied events.
    pub checkpoint_every: u64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            checkpoint_every: 100,
        }
    }
}

/// Projector task: bus consumer, poller and checkpoint writer.
pub struct ProjectorService {
    projector: SharedProjector,
    source: Arc<dyn EventSource>,
    store: Box<dyn CheckpointStore>,
    config: ProjectorConfig,
    since_checkpoint: u64,
}

impl ProjectorService {
    /// Build the service, resuming from the store's checkpoint if any.
    ///
    /// # Errors
    ///
    /// Checkpoint I/O or format errors.
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Box<dyn CheckpointStore>,
        config: ProjectorConfig,
    ) -> ProjectorResult<Self> {
        let projector = match store.load()? {
            Some(checkpoint) => {
                info!(
                    "[pl-04] Resuming projection at sequence {}",
                    checkpoint.cursor().sequence
                );
                EventProjector::from_checkpoint(checkpoint)
            }
            None => EventProjector::new(),
        };
        Ok(Self {
            projector: Arc::new(RwLock::new(projector)),
            source,
            store,
            config,
            since_checkpoint: 0,
        })
    }

    /// Handle for queries.
    #[must_use]
    pub fn handle(&self) -> SharedProjector {
        Arc::clone(&self.projector)
    }

    /// Reconcile with the ledger and checkpoint when due.
    ///
    /// # Errors
    ///
    /// Inconsistent source or checkpoint failures.
    pub fn catch_up(&mut self) -> ProjectorResult<SyncReport> {
        let report = self.projector.write().sync(self.source.as_ref())?;

        if report.applied > 0 {
            pl_telemetry::EVENTS_PROJECTED.inc_by(report.applied as u64);
            self.since_checkpoint += report.applied as u64;
        }
        if let Some(ancestor) = report.rolled_back_to {
            pl_telemetry::PROJECTOR_REBUILDS.inc();
            warn!(
                "[pl-04] Ledger history diverged after sequence {}, read model rebuilt",
                ancestor
            );
            self.persist()?;
        } else if self.since_checkpoint >= self.config.checkpoint_every {
            self.persist()?;
        }
        Ok(report)
    }

    /// Save the current checkpoint.
    ///
    /// # Errors
    ///
    /// Checkpoint I/O or format errors.
    pub fn persist(&mut self) -> ProjectorResult<()> {
        let checkpoint = self.projector.read().checkpoint();
        self.store.save(&checkpoint)?;
        self.since_checkpoint = 0;
        Ok(())
    }

    fn on_event(&mut self, event: SequencedEvent) {
        let sequence = event.sequence;
        let outcome = self.projector.write().ingest(event);
        match outcome {
            Ok(IngestOutcome::Applied(count)) => {
                pl_telemetry::EVENTS_PROJECTED.inc_by(count as u64);
                self.since_checkpoint += count as u64;
                if self.since_checkpoint >= self.config.checkpoint_every {
                    if let Err(e) = self.persist() {
                        error!("[pl-04] Failed to save checkpoint: {}", e);
                    }
                }
            }
            Ok(IngestOutcome::Duplicate) => {
                debug!(sequence, "[pl-04] Duplicate event ignored");
            }
            Ok(outcome) => {
                debug!(sequence, ?outcome, "[pl-04] Reconciling with ledger");
                self.reconcile();
            }
            Err(e) => {
                warn!("[pl-04] Rejected event {}: {}", sequence, e);
                self.reconcile();
            }
        }
    }

    fn reconcile(&mut self) {
        if let Err(e) = self.catch_up() {
            error!("[pl-04] Reconciliation failed: {}", e);
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    #[instrument(skip_all, name = "projector")]
    pub async fn run(mut self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        self.reconcile();
        info!(
            "[pl-04] Event projector started at sequence {}",
            self.projector.read().cursor().sequence
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut bus_open = true;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[pl-04] Shutdown signal received");
                        break;
                    }
                }
                received = subscription.recv(), if bus_open => match received {
                    Some(event) => self.on_event(event),
                    None => {
                        warn!("[pl-04] Event bus closed, continuing by polling");
                        bus_open = false;
                    }
                },
                _ = ticker.tick() => self.reconcile(),
            }
        }

        self.reconcile();
        if let Err(e) = self.persist() {
            error!("[pl-04] Failed to save final checkpoint: {}", e);
        }
        info!(
            "[pl-04] Event projector stopped at sequence {}",
            self.projector.read().cursor().sequence
        );
    }
}

/// Wait until the projection has applied `sequence`, polling every 10ms.
/// Returns `false` on timeout.
pub async fn wait_for_sequence(
    projector: &SharedProjector,
    sequence: SequenceNumber,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if projector.read().cursor().sequence >= sequence {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCheckpointStore;
    use parking_lot::Mutex;
    use shared_bus::{
        EventFilter, EventPublisher, InMemoryEventBus, LedgerEvent, GENESIS_EVENT_HASH,
    };
    use shared_types::{Address, EntityKey, EntityKind};

    /// Shared, appendable event log.
    #[derive(Default)]
    struct SharedLog {
        events: Mutex<Vec<SequencedEvent>>,
    }

    impl SharedLog {
        fn append(&self, key: &str) -> SequencedEvent {
            let mut events = self.events.lock();
            let prev = events.last().map_or(GENESIS_EVENT_HASH, |e| e.hash);
            let sequence = events.len() as u64 + 1;
            let sealed = SequencedEvent::seal(
                sequence,
                sequence,
                1_000,
                prev,
                LedgerEvent::EntityRegistered {
                    key: EntityKey::from(key),
                    kind: EntityKind::Product,
                    metadata: "Test Product".into(),
                    owner: Address::derive("producer"),
                },
            );
            events.push(sealed.clone());
            sealed
        }
    }

    impl EventSource for SharedLog {
        fn latest_sequence(&self) -> SequenceNumber {
            self.events.lock().len() as u64
        }

        fn event_at(&self, sequence: SequenceNumber) -> Option<SequencedEvent> {
            self.events
                .lock()
                .get(sequence.checked_sub(1)? as usize)
                .cloned()
        }

        fn events_from(&self, from: SequenceNumber) -> Vec<SequencedEvent> {
            self.events
                .lock()
                .iter()
                .filter(|e| e.sequence >= from)
                .cloned()
                .collect()
        }
    }

    fn fast() -> ProjectorConfig {
        ProjectorConfig {
            poll_interval: Duration::from_millis(20),
            checkpoint_every: 1,
        }
    }

    #[tokio::test]
    async fn test_service_follows_bus_and_checkpoints() {
        let log = Arc::new(SharedLog::default());
        let bus = InMemoryEventBus::new();
        let store = InMemoryCheckpointStore::new();
        let service =
            ProjectorService::new(log.clone(), Box::new(store.clone()), fast()).unwrap();
        let handle = service.handle();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(service.run(bus.subscribe(EventFilter::all()), shutdown_rx));

        for key in ["a", "b", "c"] {
            let event = log.append(key);
            bus.publish(event).await;
        }

        assert!(wait_for_sequence(&handle, 3, Duration::from_secs(2)).await);
        assert_eq!(handle.read().read_model().entities().len(), 3);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
        assert_eq!(store.latest().unwrap().cursor().sequence, 3);
    }

    #[tokio::test]
    async fn test_service_polls_when_bus_is_silent() {
        let log = Arc::new(SharedLog::default());
        let bus = InMemoryEventBus::new();
        let service = ProjectorService::new(
            log.clone(),
            Box::new(InMemoryCheckpointStore::new()),
            fast(),
        )
        .unwrap();
        let handle = service.handle();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(service.run(bus.subscribe(EventFilter::all()), shutdown_rx));

        // Never published on the bus.
        log.append("a");
        log.append("b");

        assert!(wait_for_sequence(&handle, 2, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_service_resumes_from_checkpoint() {
        let log = Arc::new(SharedLog::default());
        log.append("a");
        log.append("b");
        let store = InMemoryCheckpointStore::new();

        let mut first =
            ProjectorService::new(log.clone(), Box::new(store.clone()), fast()).unwrap();
        first.catch_up().unwrap();
        first.persist().unwrap();

        log.append("c");
        let mut second =
            ProjectorService::new(log.clone(), Box::new(store.clone()), fast()).unwrap();
        assert_eq!(second.handle().read().cursor().sequence, 2);

        let report = second.catch_up().unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(second.handle().read().read_model().entities().len(), 3);
    }
}
