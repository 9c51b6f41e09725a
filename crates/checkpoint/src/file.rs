//! Checkpoint file wrapper for storage-agnostic serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Checkpoint, StoredCheckpoint, SyncPhase};

/// Storage-agnostic checkpoint file wrapper.
///
/// # File Format
///
/// ```json
/// {
///     "kind": "source-sync-state",
///     "checkpoint": {
///         "public.users": {"cursor_field": "id", "cursor": 42}
///     },
///     "phase": "InProgress",
///     "created_at": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointFile {
    /// Checkpoint kind identifier
    pub kind: String,
    /// Serialized checkpoint data
    pub checkpoint: serde_json::Value,
    /// Sync phase when this checkpoint was created
    pub phase: SyncPhase,
    /// Timestamp when this checkpoint file was created
    pub created_at: DateTime<Utc>,
}

impl CheckpointFile {
    /// Wrap a checkpoint.
    pub fn new<C: Checkpoint>(checkpoint: &C, phase: SyncPhase) -> anyhow::Result<Self> {
        Ok(Self {
            kind: C::CHECKPOINT_KIND.to_string(),
            checkpoint: serde_json::to_value(checkpoint)?,
            phase,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a file from what a store returned.
    pub fn from_stored(stored: StoredCheckpoint) -> anyhow::Result<Self> {
        Ok(Self {
            kind: stored.kind,
            checkpoint: serde_json::from_str(&stored.checkpoint_data)?,
            phase: SyncPhase::parse(&stored.phase)?,
            created_at: stored.created_at,
        })
    }

    /// Parse the checkpoint, validating its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored kind doesn't match `C::CHECKPOINT_KIND`
    /// or the data can't be deserialized into `C`.
    pub fn parse<C: Checkpoint>(&self) -> anyhow::Result<C> {
        if self.kind != C::CHECKPOINT_KIND {
            anyhow::bail!(
                "Checkpoint type mismatch: expected '{}', found '{}'",
                C::CHECKPOINT_KIND,
                self.kind
            );
        }
        Ok(serde_json::from_value(self.checkpoint.clone())?)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
