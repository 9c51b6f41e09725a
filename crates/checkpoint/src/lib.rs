//! Checkpoint management for source-sync
//!
//! Persists snapshots of sync state so that an interrupted or repeated
//! sync can resume from the last emitted checkpoint.
//!
//! # Architecture
//!
//! - The `Checkpoint` trait describes a persistable checkpoint type
//! - `CheckpointFile` wraps a checkpoint with its kind, phase and creation time
//! - `CheckpointStore` abstracts the storage backend
//! - `SyncManager` saves and loads checkpoints through a store
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - Stores checkpoints as JSON files
//!
//! [`sync_core::State`] implements `Checkpoint`, so every STATE message of a
//! sync can be persisted as-is.

mod file;
mod filesystem;
mod manager;
mod phase;
mod state;
pub mod store;


// Re-export file types
pub use file::CheckpointFile;

// Re-export manager types
pub use manager::SyncManager;

// Re-export phase types
pub use phase::SyncPhase;

// Re-export store trait and types
pub use store::{CheckpointID, CheckpointStore, StoredCheckpoint};

// Re-export storage implementations
pub use filesystem::FilesystemStore;

/// Trait that persistable checkpoint types implement.
///
/// # Example
///
/// ```rust
/// use checkpoint::Checkpoint;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct RowCount {
///     pub rows: u64,
/// }
///
/// impl Checkpoint for RowCount {
///     const CHECKPOINT_KIND: &'static str = "row-count";
///
///     fn to_cli_string(&self) -> String {
///         self.rows.to_string()
///     }
///
///     fn from_cli_string(s: &str) -> anyhow::Result<Self> {
///         Ok(Self { rows: s.parse()? })
///     }
/// }
/// ```
pub trait Checkpoint: serde::Serialize + for<'de> serde::Deserialize<'de> + Clone {
    /// Kind identifier, stored with every checkpoint.
    ///
    /// Used to validate the checkpoint type when loading.
    const CHECKPOINT_KIND: &'static str;

    /// Convert to CLI-friendly string format.
    ///
    /// The returned string should be parseable by `from_cli_string()`.
    fn to_cli_string(&self) -> String;

    /// Parse from CLI string format.
    fn from_cli_string(s: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}
