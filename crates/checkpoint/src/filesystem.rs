//! Filesystem-based checkpoint storage implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

use crate::store::{CheckpointID, CheckpointStore, StoredCheckpoint};

/// Filesystem implementation of CheckpointStore trait.
///
/// Stores checkpoints as JSON files in a directory, one file per
/// checkpoint: `checkpoint_{phase}_{timestamp}.json`.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl CheckpointStore for FilesystemStore {
    async fn store_checkpoint(&self, id: &CheckpointID, checkpoint_data: String) -> Result<()> {
        let phase = id
            .phase
            .clone()
            .ok_or_else(|| anyhow::anyhow!("A checkpoint phase is required to store"))?;
        std::fs::create_dir_all(&self.dir)?;

        let created_at = Utc::now();
        let stored = StoredCheckpoint {
            checkpoint_data,
            kind: id.kind.clone(),
            phase: phase.clone(),
            created_at,
        };

        let timestamp = created_at.format("%Y%m%dT%H%M%S%.9fZ");
        let filename = self
            .dir
            .join(format!("checkpoint_{phase}_{timestamp}.json"));

        std::fs::write(&filename, serde_json::to_string_pretty(&stored)?)?;
        tracing::debug!("Stored checkpoint to {}", filename.display());
        Ok(())
    }

    async fn read_checkpoint(&self, id: &CheckpointID) -> Result<Option<StoredCheckpoint>> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let prefix = match &id.phase {
            Some(phase) => format!("checkpoint_{phase}_"),
            None => "checkpoint_".to_string(),
        };

        let mut latest: Option<(StoredCheckpoint, PathBuf)> = None;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.starts_with(&prefix) || !filename.ends_with(".json") {
                continue;
            }

            let path = entry.path();
            let content = std::fs::read_to_string(&path)?;
            let stored: StoredCheckpoint = serde_json::from_str(&content)?;
            if stored.kind != id.kind {
                continue;
            }

            let is_newer = match &latest {
                None => true,
                Some((current, current_path)) => {
                    (stored.created_at, &path) > (current.created_at, current_path)
                }
            };
            if is_newer {
                latest = Some((stored, path));
            }
        }

        Ok(latest.map(|(stored, _)| stored))
    }
}
