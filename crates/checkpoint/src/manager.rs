//! Generic sync manager for checkpoint operations.

use crate::{store::CheckpointStore, Checkpoint, CheckpointFile, CheckpointID, SyncPhase};

/// Saves and loads checkpoints through a [`CheckpointStore`].
///
/// # Example
///
/// ```rust,ignore
/// use checkpoint::{FilesystemStore, SyncManager, SyncPhase};
///
/// let manager = SyncManager::new(FilesystemStore::new("/tmp/checkpoints"));
///
/// manager.emit_checkpoint(&state, SyncPhase::InProgress).await?;
/// let resumed: Option<State> = manager.read_latest().await?;
/// ```
pub struct SyncManager<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> SyncManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a checkpoint taken at `phase`.
    pub async fn emit_checkpoint<C: Checkpoint>(
        &self,
        checkpoint: &C,
        phase: SyncPhase,
    ) -> anyhow::Result<()> {
        let id = CheckpointID {
            kind: C::CHECKPOINT_KIND.to_string(),
            phase: Some(phase.as_str().to_string()),
        };

        let checkpoint_data = serde_json::to_string(checkpoint)?;
        self.store.store_checkpoint(&id, checkpoint_data).await?;

        tracing::debug!(
            "Emitted {} checkpoint: {}",
            phase,
            checkpoint.to_cli_string()
        );
        Ok(())
    }

    /// Most recent checkpoint file of kind `C`, optionally restricted to one phase.
    pub async fn read_latest_file<C: Checkpoint>(
        &self,
        phase: Option<SyncPhase>,
    ) -> anyhow::Result<Option<CheckpointFile>> {
        let id = CheckpointID {
            kind: C::CHECKPOINT_KIND.to_string(),
            phase: phase.map(|p| p.as_str().to_string()),
        };

        match self.store.read_checkpoint(&id).await? {
            Some(stored) => Ok(Some(CheckpointFile::from_stored(stored)?)),
            None => Ok(None),
        }
    }

    /// Load the most recent checkpoint of a given phase.
    pub async fn read_checkpoint<C: Checkpoint>(
        &self,
        phase: SyncPhase,
    ) -> anyhow::Result<Option<C>> {
        match self.read_latest_file::<C>(Some(phase)).await? {
            Some(file) => Ok(Some(file.parse()?)),
            None => Ok(None),
        }
    }

    /// Load the most recent checkpoint of any phase.
    pub async fn read_latest<C: Checkpoint>(&self) -> anyhow::Result<Option<C>> {
        match self.read_latest_file::<C>(None).await? {
            Some(file) => Ok(Some(file.parse()?)),
            None => Ok(None),
        }
    }
}
