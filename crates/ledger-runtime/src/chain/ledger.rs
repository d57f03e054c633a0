//! # In-Memory Ledger
//!
//! Three snapshots of [`LedgerState`] are kept side by side:
//!
//! | Snapshot | Contents | Used by |
//! |----------|----------|---------|
//! | `finalized_state` | blocks up to the finalized height | queries |
//! | `head_state` | every sealed block | sealing the next block |
//! | `pending_state` | head plus the pending pool | submission dry-runs |
//!
//! A block at height `h` is final once `head - h >= finality_depth`. Only
//! blocks above the finalized height can be reverted.

use pl_01_identity_registry::domain::registry::Verification;
use pl_02_task_marketplace::domain::policy::MarketplacePolicy;
use pl_telemetry::metric_inc;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use shared_bus::{EventFilter, SequencedEvent, GENESIS_EVENT_HASH};
use shared_types::{
    Address, BlockHeight, Command, CommandContext, Digest, EntityKey, InspectionLog, LedgerError,
    RegisteredEntity, SequenceNumber, Task, TaskId, Timestamp,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::receipts::{CommandId, CommandStatus};
use crate::container::LedgerState;
use crate::time::TimeSource;

/// Header and contents of a sealed block, as handed to the block producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlock {
    /// Height, starting at 1.
    pub height: BlockHeight,
    /// Block time applied to every command in the block.
    pub timestamp: Timestamp,
    /// Hash of the previous block (zero for the first).
    pub parent_hash: Digest,
    /// Hash over parent, height, time, command ids and event hashes.
    pub hash: Digest,
    /// Every command drained into this block, in execution order.
    pub commands: Vec<CommandId>,
    /// Events of the commands that executed successfully.
    pub events: Vec<SequencedEvent>,
}

#[derive(Debug, Clone)]
struct PendingCommand {
    id: CommandId,
    caller: Address,
    command: Command,
}

/// A successfully executed command, kept so finality and reverts can
/// replay it.
#[derive(Debug, Clone)]
struct ExecutedCommand {
    id: CommandId,
    ctx: CommandContext,
    command: Command,
}

#[derive(Debug, Clone)]
struct BlockRecord {
    header: SealedBlock,
    executed: Vec<ExecutedCommand>,
}

/// Ordered, atomically executing command log with point-in-time queries.
pub struct InMemoryLedger {
    finality_depth: BlockHeight,
    clock: Arc<dyn TimeSource>,
    finalized_state: LedgerState,
    head_state: LedgerState,
    pending_state: LedgerState,
    pending: Vec<PendingCommand>,
    blocks: Vec<BlockRecord>,
    events: Vec<SequencedEvent>,
    receipts: HashMap<CommandId, CommandStatus>,
    finalized_height: BlockHeight,
}

impl InMemoryLedger {
    /// Empty ledger at height 0.
    #[must_use]
    pub fn new(
        owner: Address,
        policy: MarketplacePolicy,
        finality_depth: BlockHeight,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let genesis = LedgerState::new(owner, policy);
        Self {
            finality_depth,
            clock,
            finalized_state: genesis.clone(),
            head_state: genesis.clone(),
            pending_state: genesis,
            pending: Vec::new(),
            blocks: Vec::new(),
            events: Vec::new(),
            receipts: HashMap::new(),
            finalized_height: 0,
        }
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Queue a command after validating it against the pending tip.
    ///
    /// # Errors
    ///
    /// Whatever the command would fail with if it executed right now. A
    /// rejected command is not queued.
    pub fn submit(&mut self, caller: Address, command: Command) -> Result<CommandId, LedgerError> {
        let ctx = CommandContext::new(caller, self.next_timestamp(), self.next_pending_sequence());

        if let Err(e) = self.pending_state.apply(&ctx, &command) {
            let category = format!("{:?}", e.category());
            metric_inc!(pl_telemetry::COMMANDS_REJECTED, &[command.name(), category.as_str()]);
            debug!(command = command.name(), %caller, error = %e, "Command rejected at submission");
            return Err(e);
        }

        let id = CommandId::new();
        metric_inc!(pl_telemetry::COMMANDS_SUBMITTED, &[command.name()]);
        debug!(%id, command = command.name(), %caller, "Command queued");
        self.receipts.insert(id, CommandStatus::Pending);
        self.pending.push(PendingCommand {
            id,
            caller,
            command,
        });
        Ok(id)
    }

    /// Status of a submission.
    ///
    /// # Errors
    ///
    /// `UnknownCommand` if the id was never issued here.
    pub fn status(&self, id: &CommandId) -> Result<CommandStatus, LedgerError> {
        self.receipts
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownCommand(id.to_string()))
    }

    // =========================================================================
    // BLOCK PRODUCTION
    // =========================================================================

    /// Seal the pending pool into a new block. `None` when the pool is empty.
    pub fn seal_block(&mut self) -> Option<SealedBlock> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.seal())
    }

    /// Seal a block if there is anything to do: pending commands, or
    /// non-final blocks that carry commands and need burying.
    pub fn produce_block(&mut self) -> Option<SealedBlock> {
        if self.pending.is_empty() && !self.awaiting_finality() {
            return None;
        }
        Some(self.seal())
    }

    fn awaiting_finality(&self) -> bool {
        self.unfinalized_blocks()
            .iter()
            .any(|block| !block.header.commands.is_empty())
    }

    fn seal(&mut self) -> SealedBlock {
        let height = self.head_height() + 1;
        let timestamp = self.next_timestamp();
        let parent_hash = self.head_hash();

        let mut commands = Vec::with_capacity(self.pending.len());
        let mut executed = Vec::new();
        let mut events = Vec::new();

        for pending in std::mem::take(&mut self.pending) {
            let sequence = self.events.len() as SequenceNumber + 1;
            let ctx = CommandContext::new(pending.caller, timestamp, sequence);
            commands.push(pending.id);

            match self.head_state.apply(&ctx, &pending.command) {
                Ok(event) => {
                    let prev = self.events.last().map_or(GENESIS_EVENT_HASH, |e| e.hash);
                    let sealed = SequencedEvent::seal(sequence, height, timestamp, prev, event);
                    self.events.push(sealed.clone());
                    events.push(sealed);
                    executed.push(ExecutedCommand {
                        id: pending.id,
                        ctx,
                        command: pending.command,
                    });
                    self.receipts
                        .insert(pending.id, CommandStatus::Included { height, sequence });
                    metric_inc!(pl_telemetry::COMMANDS_INCLUDED);
                }
                Err(e) => {
                    warn!(
                        id = %pending.id,
                        command = pending.command.name(),
                        height,
                        error = %e,
                        "Command failed at inclusion"
                    );
                    self.receipts
                        .insert(pending.id, CommandStatus::Failed { height, error: e });
                    metric_inc!(pl_telemetry::COMMANDS_FAILED);
                }
            }
        }

        let hash = block_hash(&parent_hash, height, timestamp, &commands, &events);
        let header = SealedBlock {
            height,
            timestamp,
            parent_hash,
            hash,
            commands,
            events,
        };
        self.blocks.push(BlockRecord {
            header: header.clone(),
            executed,
        });
        self.pending_state = self.head_state.clone();

        metric_inc!(pl_telemetry::BLOCKS_SEALED);
        pl_telemetry::CHAIN_HEIGHT.set(gauge(height));
        debug!(
            height,
            commands = header.commands.len(),
            events = header.events.len(),
            "Block sealed"
        );

        self.advance_finality();
        header
    }

    fn advance_finality(&mut self) {
        let target = self.head_height().saturating_sub(self.finality_depth);
        if target <= self.finalized_height {
            return;
        }

        for index in self.finalized_height as usize..target as usize {
            let block = &self.blocks[index];
            for executed in &block.executed {
                if let Err(e) = self.finalized_state.apply(&executed.ctx, &executed.command) {
                    // Same commands, same order, same contexts as the head.
                    error!(
                        height = block.header.height,
                        sequence = executed.ctx.sequence,
                        error = %e,
                        "Finalized replay diverged from head"
                    );
                }
                self.receipts.insert(
                    executed.id,
                    CommandStatus::Finalized {
                        height: block.header.height,
                        sequence: executed.ctx.sequence,
                    },
                );
            }
        }

        info!(
            from = self.finalized_height + 1,
            to = target,
            "Blocks finalized"
        );
        self.finalized_height = target;
        pl_telemetry::FINALIZED_HEIGHT.set(gauge(target));
    }

    /// Discard the newest `count` blocks, which must all be above the
    /// finalized height. Their commands become `Dropped`.
    ///
    /// # Errors
    ///
    /// `FinalizedHistory` if `count` reaches into finalized blocks; nothing
    /// is reverted in that case.
    pub fn revert_blocks(&mut self, count: u64) -> Result<u64, LedgerError> {
        let unfinalized = self.head_height() - self.finalized_height;
        if count > unfinalized {
            return Err(LedgerError::FinalizedHistory {
                height: self.finalized_height,
            });
        }
        if count == 0 {
            return Ok(0);
        }

        let keep = self.blocks.len() - count as usize;
        for block in self.blocks.drain(keep..) {
            let height = block.header.height;
            for id in &block.header.commands {
                self.receipts.insert(*id, CommandStatus::Dropped { height });
            }
        }
        let kept_events = self
            .events
            .iter()
            .take_while(|e| e.height <= keep as BlockHeight)
            .count();
        self.events.truncate(kept_events);

        self.head_state = self.finalized_state.clone();
        for block in &self.blocks[self.finalized_height as usize..] {
            for executed in &block.executed {
                if let Err(e) = self.head_state.apply(&executed.ctx, &executed.command) {
                    error!(
                        sequence = executed.ctx.sequence,
                        error = %e,
                        "Head replay diverged during revert"
                    );
                }
            }
        }
        self.rebuild_pending_state();

        pl_telemetry::BLOCKS_REVERTED.inc_by(count);
        pl_telemetry::CHAIN_HEIGHT.set(gauge(self.head_height()));
        warn!(
            reverted = count,
            head = self.head_height(),
            "Unfinalized blocks reverted"
        );
        Ok(count)
    }

    /// Re-run the pool on the new head. Commands that no longer fit stay
    /// queued and fail at inclusion.
    fn rebuild_pending_state(&mut self) {
        self.pending_state = self.head_state.clone();
        let timestamp = self.next_timestamp();
        let base = self.events.len() as SequenceNumber;
        for (offset, pending) in self.pending.iter().enumerate() {
            let ctx = CommandContext::new(pending.caller, timestamp, base + offset as u64 + 1);
            if let Err(e) = self.pending_state.apply(&ctx, &pending.command) {
                debug!(id = %pending.id, error = %e, "Pending command invalid on new head");
            }
        }
    }

    // =========================================================================
    // CHAIN QUERIES
    // =========================================================================

    /// Height of the newest block (0 before the first).
    #[must_use]
    pub fn head_height(&self) -> BlockHeight {
        self.blocks.len() as BlockHeight
    }

    /// Height of the newest final block.
    #[must_use]
    pub fn finalized_height(&self) -> BlockHeight {
        self.finalized_height
    }

    /// Configured finality depth.
    #[must_use]
    pub fn finality_depth(&self) -> BlockHeight {
        self.finality_depth
    }

    /// Commands waiting for a block.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sealed block header at `height`.
    #[must_use]
    pub fn block(&self, height: BlockHeight) -> Option<&SealedBlock> {
        let index = height.checked_sub(1)? as usize;
        self.blocks.get(index).map(|b| &b.header)
    }

    /// Sequence of the newest event (0 before the first).
    #[must_use]
    pub fn latest_sequence(&self) -> SequenceNumber {
        self.events.len() as SequenceNumber
    }

    /// Event at `sequence`, final or not.
    #[must_use]
    pub fn event_at(&self, sequence: SequenceNumber) -> Option<&SequencedEvent> {
        self.events.get(sequence.checked_sub(1)? as usize)
    }

    /// Events from `from` onwards that match `filter`, in sequence order.
    #[must_use]
    pub fn events_from(&self, from: SequenceNumber, filter: &EventFilter) -> Vec<SequencedEvent> {
        let start = from.saturating_sub(1) as usize;
        self.events
            .iter()
            .skip(start)
            .filter(|e| filter.matches(&e.event))
            .cloned()
            .collect()
    }

    // =========================================================================
    // CONFIRMED STATE QUERIES
    // =========================================================================

    /// The distinguished owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.finalized_state.owner()
    }

    /// Confirmed entity lookup.
    ///
    /// # Errors
    ///
    /// `NotFound` if no final block registered `key`.
    pub fn lookup(&self, key: &EntityKey) -> Result<RegisteredEntity, LedgerError> {
        self.finalized_state.lookup(key).cloned()
    }

    /// Confirmed authenticity check.
    #[must_use]
    pub fn verify(&self, key: &EntityKey) -> Verification {
        self.finalized_state.verify(key)
    }

    /// Confirmed task.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` if no final block posted the task.
    pub fn get_task(&self, task_id: TaskId) -> Result<Task, LedgerError> {
        self.finalized_state.get_task(task_id).cloned()
    }

    /// Confirmed log entry.
    ///
    /// # Errors
    ///
    /// `NotFound` if no final block logged a result for the task.
    pub fn get_log(&self, task_id: TaskId) -> Result<InspectionLog, LedgerError> {
        self.finalized_state.get_log(task_id).cloned()
    }

    /// Confirmed task count.
    #[must_use]
    pub fn task_count(&self) -> u64 {
        self.finalized_state.task_count()
    }

    /// The confirmed snapshot.
    #[must_use]
    pub fn confirmed_state(&self) -> &LedgerState {
        &self.finalized_state
    }

    /// The snapshot after every sealed block, final or not.
    #[must_use]
    pub fn head_state(&self) -> &LedgerState {
        &self.head_state
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn unfinalized_blocks(&self) -> &[BlockRecord] {
        &self.blocks[self.finalized_height as usize..]
    }

    fn head_hash(&self) -> Digest {
        self.blocks.last().map_or(Digest::ZERO, |b| b.header.hash)
    }

    /// Block time never runs backwards, whatever the clock says.
    fn next_timestamp(&self) -> Timestamp {
        let last = self.blocks.last().map_or(0, |b| b.header.timestamp);
        self.clock.now().max(last)
    }

    fn next_pending_sequence(&self) -> SequenceNumber {
        (self.events.len() + self.pending.len()) as SequenceNumber + 1
    }
}

fn block_hash(
    parent: &Digest,
    height: BlockHeight,
    timestamp: Timestamp,
    commands: &[CommandId],
    events: &[SequencedEvent],
) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(parent.as_bytes());
    hasher.update(height.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    for id in commands {
        hasher.update(id.as_bytes());
    }
    for event in events {
        hasher.update(event.hash.as_bytes());
    }
    Digest::new(hasher.finalize().into())
}

fn gauge(height: BlockHeight) -> i64 {
    i64::try_from(height).unwrap_or(i64::MAX)
}
