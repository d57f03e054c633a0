//! # Projection Over a Running Node
//!
//! The projector runs as its own task beside the block producer. These
//! tests check that its read model converges on what a from-scratch replay
//! of the ledger's event log produces, across lag, reorganisations and
//! restarts.

#[cfg(test)]
mod tests {
    use crate::integration::{authorize, drone, owner, producer, GENESIS_TIME};
    use ledger_runtime::adapters::LedgerEventSource;
    use ledger_runtime::container::LedgerConfig;
    use ledger_runtime::node::LedgerNode;
    use ledger_runtime::time::ManualClock;
    use pl_04_event_projector::adapters::JsonFileCheckpointStore;
    use pl_04_event_projector::domain::projector::EventProjector;
    use pl_04_event_projector::domain::read_model::TaskStatus;
    use pl_04_event_projector::ports::inbound::ProjectorApi;
    use pl_04_event_projector::ports::outbound::CheckpointStore;
    use pl_04_event_projector::service::{wait_for_sequence, SharedProjector};
    use shared_types::{Command, Digest, EntityKey, EntityKind};
    use std::sync::Arc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn config() -> LedgerConfig {
        LedgerConfig {
            block_interval: Duration::from_millis(5),
            projector_poll: Duration::from_millis(20),
            ..LedgerConfig::default()
        }
    }

    fn start(config: LedgerConfig) -> (LedgerNode, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));
        let node = LedgerNode::start_with_clock(config, clock.clone()).unwrap();
        (node, clock)
    }

    /// Wait until the projection has caught up with the ledger head.
    async fn settle(node: &LedgerNode) {
        let latest = node.ledger().read().latest_sequence();
        assert!(
            wait_for_sequence(&node.projector(), latest, TIMEOUT).await,
            "projection stuck below sequence {latest}"
        );
    }

    /// The live model must equal a fresh replay of the ledger's log.
    fn assert_matches_replay(node: &LedgerNode, projector: &SharedProjector) {
        let mut fresh = EventProjector::new();
        fresh
            .sync(&LedgerEventSource::new(node.ledger()))
            .unwrap();
        let live = projector.read();
        assert_eq!(live.cursor(), fresh.cursor());
        assert_eq!(live.read_model(), fresh.read_model());
    }

    #[tokio::test]
    async fn test_projection_matches_replay() {
        let (node, _) = start(config());
        let admin = node.client(owner());

        for n in 1..=3 {
            admin
                .execute(authorize(drone(n), &format!("Drone{n}")), TIMEOUT)
                .await
                .unwrap();
        }
        admin
            .execute(authorize(producer(1), "Test Producer"), TIMEOUT)
            .await
            .unwrap();
        node.client(producer(1))
            .execute(
                Command::RegisterEntity {
                    key: EntityKey::from("0000000000001"),
                    kind: EntityKind::Product,
                    metadata: "Test Product".into(),
                    owner: producer(1),
                },
                TIMEOUT,
            )
            .await
            .unwrap();
        admin
            .execute(Command::RemoveAuthorized { key: drone(3) }, TIMEOUT)
            .await
            .unwrap();

        settle(&node).await;
        let projector = node.projector();
        {
            let view = projector.read();
            let model = view.read_model();
            assert_eq!(model.actors().len(), 4);
            assert_eq!(model.authorized_actors().count(), 3);
            assert!(!model.actor(&drone(3)).unwrap().authorized);
            assert_eq!(model.entities()[0].metadata, "Test Product");
        }
        assert_matches_replay(&node, &projector);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_overdue_assignment_is_observed_not_reopened() {
        let (node, clock) = start(config());
        let admin = node.client(owner());
        admin
            .execute(authorize(drone(1), "Drone1"), TIMEOUT)
            .await
            .unwrap();
        admin
            .execute(
                Command::PostTask {
                    description: "Inspect Tank A-12".into(),
                    deadline: GENESIS_TIME + 60,
                },
                TIMEOUT,
            )
            .await
            .unwrap();
        node.client(drone(1))
            .execute(Command::Bid { task_id: 0 }, TIMEOUT)
            .await
            .unwrap();
        admin
            .execute(Command::Assign { task_id: 0 }, TIMEOUT)
            .await
            .unwrap();
        settle(&node).await;

        clock.advance(120);
        let projector = node.projector();
        {
            let view = projector.read();
            let overdue = view.read_model().overdue_tasks(GENESIS_TIME + 120);
            assert_eq!(overdue.len(), 1);
            assert_eq!(overdue[0].status, TaskStatus::Assigned);
        }

        // Past the deadline the assignee may still log; nothing reopened it.
        let digest = Digest::of(b"late but valid");
        node.client(drone(1))
            .execute(Command::LogResult { task_id: 0, digest }, TIMEOUT)
            .await
            .unwrap();
        settle(&node).await;
        assert!(projector
            .read()
            .read_model()
            .overdue_tasks(GENESIS_TIME + 120)
            .is_empty());
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_projection_survives_lagging_bus() {
        // One-slot buffer: the projector lags and must backfill by polling.
        let (node, _) = start(LedgerConfig {
            bus_capacity: 1,
            block_interval: Duration::from_secs(3_600),
            ..config()
        });
        let admin = node.client(owner());
        for n in 1..=20 {
            admin
                .submit(authorize(drone(n), &format!("Drone{n}")))
                .unwrap();
        }
        node.seal_now().await.unwrap();

        settle(&node).await;
        let projector = node.projector();
        assert_eq!(projector.read().read_model().actors().len(), 20);
        assert_matches_replay(&node, &projector);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_projection_converges_after_reorg() {
        let (node, _) = start(LedgerConfig {
            finality_depth: 10,
            block_interval: Duration::from_secs(3_600),
            ..config()
        });
        let admin = node.client(owner());

        for n in 1..=3 {
            admin
                .submit(authorize(drone(n), &format!("Drone{n}")))
                .unwrap();
            node.seal_now().await.unwrap();
        }
        settle(&node).await;

        // Two blocks are superseded by a different history.
        node.ledger().write().revert_blocks(2).unwrap();
        for n in [7, 8, 9] {
            admin
                .submit(authorize(drone(n), &format!("Drone{n}")))
                .unwrap();
        }
        node.seal_now().await.unwrap();

        let projector = node.projector();
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while projector.read().read_model().actor(&drone(9)).is_none() {
            assert!(tokio::time::Instant::now() < deadline, "never converged");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        settle(&node).await;

        {
            let view = projector.read();
            let model = view.read_model();
            assert!(model.actor(&drone(1)).is_some());
            assert!(model.actor(&drone(2)).is_none());
            assert!(model.actor(&drone(3)).is_none());
            assert_eq!(model.actors().len(), 4);
        }
        assert_matches_replay(&node, &projector);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_reorg_that_only_moves_block_time_is_rebuilt() {
        let (node, clock) = start(LedgerConfig {
            finality_depth: 5,
            block_interval: Duration::from_secs(3_600),
            ..config()
        });
        let admin = node.client(owner());
        let inspector = node.client(drone(1));

        admin.submit(authorize(drone(1), "Drone1")).unwrap();
        node.seal_now().await.unwrap();
        admin
            .submit(Command::PostTask {
                description: "Inspect Tank A-12".into(),
                deadline: GENESIS_TIME + 3_600,
            })
            .unwrap();
        node.seal_now().await.unwrap();
        inspector.submit(Command::Bid { task_id: 0 }).unwrap();
        node.seal_now().await.unwrap();
        admin.submit(Command::Assign { task_id: 0 }).unwrap();
        node.seal_now().await.unwrap();

        let log = Command::LogResult {
            task_id: 0,
            digest: Digest::of(b"tank A-12 nominal"),
        };
        clock.set(GENESIS_TIME + 100);
        inspector.submit(log.clone()).unwrap();
        node.seal_now().await.unwrap();

        let source = LedgerEventSource::new(node.ledger());
        let mut view = EventProjector::new();
        view.sync(&source).unwrap();
        assert_eq!(view.read_model().log(0).unwrap().timestamp, GENESIS_TIME + 100);

        // Same command, same height, same sequence; only the block time moves.
        node.ledger().write().revert_blocks(1).unwrap();
        clock.set(GENESIS_TIME + 5_000);
        inspector.submit(log).unwrap();
        node.seal_now().await.unwrap();

        let report = view.sync(&source).unwrap();
        assert!(report.rolled_back_to.is_some());
        assert_eq!(view.read_model().log(0).unwrap().timestamp, GENESIS_TIME + 5_000);

        // The node's own projector converges as well.
        let projector = node.projector();
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while projector.read().read_model().log(0).map(|l| l.timestamp)
            != Some(GENESIS_TIME + 5_000)
        {
            assert!(tokio::time::Instant::now() < deadline, "stale block time kept");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_matches_replay(&node, &projector);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_checkpoint_written_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projection.json");
        let (node, _) = start(LedgerConfig {
            checkpoint_path: Some(path.clone()),
            ..config()
        });
        let admin = node.client(owner());
        for n in 1..=3 {
            admin
                .execute(authorize(drone(n), &format!("Drone{n}")), TIMEOUT)
                .await
                .unwrap();
        }
        settle(&node).await;
        let latest = node.ledger().read().latest_sequence();
        node.shutdown().await;

        let checkpoint = JsonFileCheckpointStore::new(&path)
            .load()
            .unwrap()
            .expect("checkpoint saved on shutdown");
        assert_eq!(checkpoint.cursor().sequence, latest);

        // A projector resumed from it starts where the node stopped.
        let resumed = EventProjector::from_checkpoint(checkpoint);
        assert_eq!(resumed.read_model().actors().len(), 3);
        assert_eq!(resumed.cursor().sequence, latest);
    }
}
