//! # Demo Flows
//!
//! Scripted walk-throughs of the two deployment variants against a running
//! node. Each returns the projected lists so the binary can print them.

use anyhow::{bail, Context, Result};
use pl_04_event_projector::ports::inbound::ProjectorApi;
use pl_04_event_projector::service::wait_for_sequence;
use serde_json::{json, Value};
use shared_types::{Address, Command, Digest, EntityKey, EntityKind, ErrorCategory, LedgerError};
use std::time::Duration;
use tracing::info;

use crate::client::ClientError;
use crate::node::LedgerNode;

/// How long each step may take to finalize.
const STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Barcode used by the product demo.
pub const DEMO_BARCODE: &str = "0000000000001";

/// Authorize a producer, register a product, verify it, and show that the
/// barcode cannot be claimed twice.
///
/// # Errors
///
/// Any step that does not behave as scripted.
pub async fn barcode_flow(node: &LedgerNode) -> Result<Value> {
    let owner = node.client(node.config().owner);
    let producer = Address::derive("producer");
    let rival = Address::derive("rival-producer");

    for (key, name) in [(producer, "Test Producer"), (rival, "Rival Producer")] {
        owner
            .execute(
                Command::AddAuthorized {
                    key,
                    name: name.to_string(),
                },
                STEP_TIMEOUT,
            )
            .await
            .with_context(|| format!("authorizing {name}"))?;
    }
    info!("Producers authorized");

    node.client(producer)
        .execute(
            Command::RegisterEntity {
                key: EntityKey::from(DEMO_BARCODE),
                kind: EntityKind::Product,
                metadata: "Test Product".into(),
                owner: producer,
            },
            STEP_TIMEOUT,
        )
        .await
        .context("registering product")?;

    let verification = owner.verify(&EntityKey::from(DEMO_BARCODE));
    info!(
        registered = verification.registered,
        owner_authorized = verification.owner_authorized,
        "Product verified"
    );

    let duplicate = node.client(rival).submit(Command::RegisterEntity {
        key: EntityKey::from(DEMO_BARCODE),
        kind: EntityKind::Product,
        metadata: "Counterfeit".into(),
        owner: rival,
    });
    match duplicate {
        Err(ClientError::Ledger(LedgerError::DuplicateKey(key))) => {
            info!(%key, "Duplicate registration refused");
        }
        other => bail!("duplicate barcode was not refused: {other:?}"),
    }

    projected_lists(node).await
}

/// Authorize two drones, post an inspection, let both bid, assign the first
/// bidder, log its result and show the second drone cannot log.
///
/// # Errors
///
/// Any step that does not behave as scripted.
pub async fn drone_flow(node: &LedgerNode, now: u64) -> Result<Value> {
    let owner = node.client(node.config().owner);
    let drones = [Address::derive("drone-1"), Address::derive("drone-2")];

    for (i, drone) in drones.iter().enumerate() {
        let name = format!("Drone{}", i + 1);
        owner
            .execute(
                Command::AddAuthorized {
                    key: *drone,
                    name: name.clone(),
                },
                STEP_TIMEOUT,
            )
            .await
            .with_context(|| format!("authorizing {name}"))?;
        node.client(*drone)
            .execute(
                Command::RegisterEntity {
                    key: EntityKey::from(*drone),
                    kind: EntityKind::DroneProfile,
                    metadata: format!("{name} quadcopter, thermal camera"),
                    owner: *drone,
                },
                STEP_TIMEOUT,
            )
            .await
            .with_context(|| format!("registering {name} profile"))?;
    }

    owner
        .execute(
            Command::PostTask {
                description: "Inspect Tank A-12".into(),
                deadline: now + 3_600,
            },
            STEP_TIMEOUT,
        )
        .await
        .context("posting task")?;
    let task_id = owner.task_count().saturating_sub(1);

    for drone in drones {
        node.client(drone)
            .execute(Command::Bid { task_id }, STEP_TIMEOUT)
            .await
            .with_context(|| format!("bid from {drone}"))?;
    }
    owner
        .execute(Command::Assign { task_id }, STEP_TIMEOUT)
        .await
        .context("assigning task")?;

    let task = owner.get_task(task_id)?;
    info!(task_id, assignee = ?task.assigned_to, "Task assigned");

    let digest = Digest::of(b"Tank A-12: no corrosion found");
    node.client(drones[0])
        .execute(Command::LogResult { task_id, digest }, STEP_TIMEOUT)
        .await
        .context("logging result")?;

    match node.client(drones[1]).submit(Command::LogResult {
        task_id,
        digest: Digest::of(b"forged"),
    }) {
        Err(ClientError::Ledger(e)) if e.category() == ErrorCategory::Authorization => {
            info!("Second drone refused: {}", e);
        }
        other => bail!("non-assignee log was not refused: {other:?}"),
    }

    projected_lists(node).await
}

async fn projected_lists(node: &LedgerNode) -> Result<Value> {
    let latest = node.ledger().read().latest_sequence();
    let projector = node.projector();
    if !wait_for_sequence(&projector, latest, STEP_TIMEOUT).await {
        bail!("projection did not reach sequence {latest}");
    }

    let view = projector.read();
    let model = view.read_model();
    Ok(json!({
        "sequence": view.cursor().sequence,
        "actors": model.actors(),
        "entities": model.entities(),
        "tasks": model.tasks().collect::<Vec<_>>(),
        "logs": model.logs().collect::<Vec<_>>(),
    }))
}
