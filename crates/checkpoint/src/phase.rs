//! Sync phase enumeration for checkpoint tracking.

use serde::{Deserialize, Serialize};

/// Point of a sync at which a checkpoint was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPhase {
    /// Snapshot taken while streams are still being read.
    ///
    /// Emitted every time the sync produces a STATE message.
    InProgress,

    /// Final snapshot after every configured stream was processed.
    Completed,
}

impl SyncPhase {
    /// Get the string representation of this phase.
    ///
    /// Used in checkpoint file names (e.g. `checkpoint_completed_20240101T000000.000000000Z.json`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::InProgress => "in_progress",
            SyncPhase::Completed => "completed",
        }
    }

    /// Parse the string produced by [`SyncPhase::as_str`].
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "in_progress" => Ok(SyncPhase::InProgress),
            "completed" => Ok(SyncPhase::Completed),
            other => Err(anyhow::anyhow!("Unknown sync phase: {other}")),
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
