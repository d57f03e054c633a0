//! # Read Model
//!
//! The queryable view folded from ledger events: actors with their current
//! status, entities in registration order, tasks with status, and logs.
//!
//! Folding is total. An event that refers to something the model has never
//! seen (possible only if the stream itself is inconsistent) is logged and
//! skipped rather than aborting the projection.

use serde::{Deserialize, Serialize};
use shared_bus::{LedgerEvent, SequencedEvent};
use shared_types::{
    Address, Digest, EntityKey, EntityKind, SequenceNumber, TaskId, Timestamp,
};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// An actor as seen through its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorView {
    /// Actor key.
    pub key: Address,
    /// Display name from the latest authorization.
    pub name: String,
    /// Current authorization status.
    pub authorized: bool,
    /// Sequence of the first authorization.
    pub first_seen: SequenceNumber,
}

/// A registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity key.
    pub key: EntityKey,
    /// Product or drone profile.
    pub kind: EntityKind,
    /// Metadata.
    pub metadata: String,
    /// Owning actor.
    pub owner: Address,
    /// Sequence of the registration event.
    pub sequence: SequenceNumber,
}

/// Projected task status. Extends the ledger's two states with `Logged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Accepting bids.
    Open,
    /// Assigned, waiting for a result.
    Assigned,
    /// The assignee logged a result.
    Logged,
}

/// A task with its bids, assignment and result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    /// Task id.
    pub id: TaskId,
    /// Description.
    pub description: String,
    /// Unix deadline in seconds.
    pub deadline: Timestamp,
    /// Bidders in acceptance order.
    pub bidders: Vec<Address>,
    /// Selected actor.
    pub assignee: Option<Address>,
    /// Current status.
    pub status: TaskStatus,
}

/// A logged inspection result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogView {
    /// Task id.
    pub task_id: TaskId,
    /// Result digest.
    pub digest: Digest,
    /// Who logged it.
    pub by: Address,
    /// Block time of the log.
    pub timestamp: Timestamp,
}

/// The projected state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadModel {
    actors: Vec<ActorView>,
    actor_index: HashMap<Address, usize>,
    entities: Vec<EntityView>,
    entity_index: HashMap<EntityKey, usize>,
    tasks: BTreeMap<TaskId, TaskView>,
    logs: BTreeMap<TaskId, LogView>,
}

impl ReadModel {
    /// Empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the model.
    pub fn apply(&mut self, sequenced: &SequencedEvent) {
        match &sequenced.event {
            LedgerEvent::ActorAuthorized { key, name } => {
                if let Some(&idx) = self.actor_index.get(key) {
                    let actor = &mut self.actors[idx];
                    actor.name.clone_from(name);
                    actor.authorized = true;
                } else {
                    self.actor_index.insert(*key, self.actors.len());
                    self.actors.push(ActorView {
                        key: *key,
                        name: name.clone(),
                        authorized: true,
                        first_seen: sequenced.sequence,
                    });
                }
            }
            LedgerEvent::ActorRemoved { key } => match self.actor_index.get(key) {
                Some(&idx) => self.actors[idx].authorized = false,
                None => skip(sequenced, "removal of unknown actor"),
            },
            LedgerEvent::EntityRegistered {
                key,
                kind,
                metadata,
                owner,
            } => {
                if self.entity_index.contains_key(key) {
                    skip(sequenced, "duplicate entity registration");
                    return;
                }
                self.entity_index.insert(key.clone(), self.entities.len());
                self.entities.push(EntityView {
                    key: key.clone(),
                    kind: *kind,
                    metadata: metadata.clone(),
                    owner: *owner,
                    sequence: sequenced.sequence,
                });
            }
            LedgerEvent::TaskPosted {
                id,
                description,
                deadline,
            } => {
                self.tasks.insert(
                    *id,
                    TaskView {
                        id: *id,
                        description: description.clone(),
                        deadline: *deadline,
                        bidders: Vec::new(),
                        assignee: None,
                        status: TaskStatus::Open,
                    },
                );
            }
            LedgerEvent::TaskBid { id, bidder } => match self.tasks.get_mut(id) {
                Some(task) => task.bidders.push(*bidder),
                None => skip(sequenced, "bid on unknown task"),
            },
            LedgerEvent::TaskAssigned { id, assignee } => match self.tasks.get_mut(id) {
                Some(task) => {
                    task.assignee = Some(*assignee);
                    task.status = TaskStatus::Assigned;
                }
                None => skip(sequenced, "assignment of unknown task"),
            },
            LedgerEvent::ResultLogged { id, digest, by } => {
                match self.tasks.get_mut(id) {
                    Some(task) => task.status = TaskStatus::Logged,
                    None => skip(sequenced, "result for unknown task"),
                }
                self.logs.insert(
                    *id,
                    LogView {
                        task_id: *id,
                        digest: *digest,
                        by: *by,
                        timestamp: sequenced.timestamp,
                    },
                );
            }
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Every actor ever authorized, in first-authorization order.
    #[must_use]
    pub fn actors(&self) -> &[ActorView] {
        &self.actors
    }

    /// Actors currently authorized.
    pub fn authorized_actors(&self) -> impl Iterator<Item = &ActorView> {
        self.actors.iter().filter(|a| a.authorized)
    }

    /// One actor.
    #[must_use]
    pub fn actor(&self, key: &Address) -> Option<&ActorView> {
        self.actor_index.get(key).map(|&idx| &self.actors[idx])
    }

    /// Every entity, in registration order.
    #[must_use]
    pub fn entities(&self) -> &[EntityView] {
        &self.entities
    }

    /// Entities of one kind, in registration order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityView> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Entities owned by `owner`, in registration order.
    pub fn entities_owned_by<'a>(
        &'a self,
        owner: &'a Address,
    ) -> impl Iterator<Item = &'a EntityView> + 'a {
        self.entities.iter().filter(move |e| &e.owner == owner)
    }

    /// One entity.
    #[must_use]
    pub fn entity(&self, key: &EntityKey) -> Option<&EntityView> {
        self.entity_index.get(key).map(|&idx| &self.entities[idx])
    }

    /// Every task, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskView> {
        self.tasks.values()
    }

    /// Tasks in one status, in id order.
    pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &TaskView> {
        self.tasks.values().filter(move |t| t.status == status)
    }

    /// One task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&TaskView> {
        self.tasks.get(&id)
    }

    /// Every log, in task id order.
    pub fn logs(&self) -> impl Iterator<Item = &LogView> {
        self.logs.values()
    }

    /// One log.
    #[must_use]
    pub fn log(&self, task_id: TaskId) -> Option<&LogView> {
        self.logs.get(&task_id)
    }

    /// Assigned tasks whose deadline is before `now` and that have no result.
    ///
    /// Observation only: the ledger has no expiry transition.
    #[must_use]
    pub fn overdue_tasks(&self, now: Timestamp) -> Vec<&TaskView> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Assigned && t.deadline < now)
            .collect()
    }

    /// Total number of records, for logging.
    #[must_use]
    pub fn size(&self) -> usize {
        self.actors.len() + self.entities.len() + self.tasks.len() + self.logs.len()
    }
}

fn skip(sequenced: &SequencedEvent, reason: &str) {
    warn!(
        sequence = sequenced.sequence,
        kind = ?sequenced.event.kind(),
        reason,
        "[pl-04] Skipping inconsistent event"
    );
}
