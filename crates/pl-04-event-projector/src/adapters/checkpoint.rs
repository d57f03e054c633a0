//! # Checkpoint Stores
//!
//! Persist the projector's cursor, hash journal and read model so a restart
//! resumes instead of replaying from sequence 1. The file store writes to a
//! temporary sibling and renames it over the target.

use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::ProjectorResult;
use crate::domain::projector::Checkpoint;
use crate::ports::outbound::CheckpointStore;

/// Volatile checkpoint store. Clones share the same slot, so a test can keep
/// one handle and inspect what the service saved.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    slot: Arc<Mutex<Option<Checkpoint>>>,
}

impl InMemoryCheckpointStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved checkpoint.
    #[must_use]
    pub fn latest(&self) -> Option<Checkpoint> {
        self.slot.lock().clone()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self) -> ProjectorResult<Option<Checkpoint>> {
        Ok(self.latest())
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> ProjectorResult<()> {
        *self.slot.lock() = Some(checkpoint.clone());
        Ok(())
    }
}

/// JSON file checkpoint store.
///
/// Writes go to a sibling `.tmp` file which is synced and renamed over the
/// target, so a crash never leaves a half-written checkpoint behind.
#[derive(Debug, Clone)]
pub struct JsonFileCheckpointStore {
    path: PathBuf,
}

impl JsonFileCheckpointStore {
    /// Store backed by `path`. Nothing is read until [`load`](CheckpointStore::load).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonFileCheckpointStore {
    fn load(&self) -> ProjectorResult<Option<Checkpoint>> {
        if !self.path.exists() {
            info!("[pl-04] No checkpoint at {}", self.path.display());
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;
        info!(
            "[pl-04] Loaded checkpoint at sequence {} from {}",
            checkpoint.cursor().sequence,
            self.path.display()
        );
        Ok(Some(checkpoint))
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> ProjectorResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(checkpoint)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        debug!(
            sequence = checkpoint.cursor().sequence,
            bytes = bytes.len(),
            "[pl-04] Checkpoint saved"
        );
        Ok(())
    }
}
