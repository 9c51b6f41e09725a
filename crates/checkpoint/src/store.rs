//! Checkpoint storage trait and types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpoint identifier for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointID {
    /// Checkpoint kind (e.g., "source-sync-state")
    pub kind: String,
    /// Sync phase ("in_progress" or "completed"); `None` matches any phase when reading
    pub phase: Option<String>,
}

/// Checkpoint data stored in backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCheckpoint {
    /// Serialized checkpoint
    pub checkpoint_data: String,
    /// Checkpoint kind for validation
    pub kind: String,
    /// Sync phase for validation
    pub phase: String,
    /// Timestamp when checkpoint was created
    pub created_at: DateTime<Utc>,
}

/// Trait for checkpoint storage operations.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store a checkpoint in the storage backend.
    async fn store_checkpoint(&self, id: &CheckpointID, checkpoint_data: String) -> Result<()>;

    /// Read the most recent checkpoint matching `id`.
    ///
    /// Returns None if no checkpoint matches.
    async fn read_checkpoint(&self, id: &CheckpointID) -> Result<Option<StoredCheckpoint>>;
}
