//! Engine error type.

use sync_core::{ConversionError, StoreError, SyncMode};
use thiserror::Error;

/// Errors raised while discovering, planning or reading streams.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Authentication, network, or a connection lost mid-sync. Aborts the sync.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema metadata could not be listed
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// A column type has no mapping
    #[error("Unsupported type '{native_type}' for column '{column}' of stream '{stream}'")]
    UnsupportedType {
        native_type: String,
        column: String,
        stream: String,
    },

    /// The configured stream cannot be read the way it was configured
    #[error("Invalid sync mode {sync_mode} for stream '{stream}': {reason}")]
    InvalidSyncMode {
        stream: String,
        sync_mode: SyncMode,
        reason: String,
    },

    /// Reading or converting rows of a stream failed
    #[error("Failed to read stream '{stream}': {message}")]
    Read { stream: String, message: String },

    /// The message sink rejected a message. Aborts the sync.
    #[error("Failed to emit message: {0}")]
    Emit(String),
}

impl SyncError {
    pub fn invalid_sync_mode(
        stream: impl Into<String>,
        sync_mode: SyncMode,
        reason: impl Into<String>,
    ) -> Self {
        SyncError::InvalidSyncMode {
            stream: stream.into(),
            sync_mode,
            reason: reason.into(),
        }
    }

    /// Wrap a store error raised while reading `stream`.
    ///
    /// Connection-class failures stay connection errors so that the sync aborts.
    pub fn from_store(stream: &str, e: StoreError) -> Self {
        match e {
            StoreError::Connection(message) => SyncError::Connection(message),
            other => SyncError::Read {
                stream: stream.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Wrap a value conversion failure in `column` of `stream`.
    pub fn from_conversion(stream: &str, column: &str, e: ConversionError) -> Self {
        SyncError::Read {
            stream: stream.to_string(),
            message: format!("column '{column}': {e}"),
        }
    }

    /// Whether the whole sync must stop, as opposed to a single stream.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Connection(_) | SyncError::Emit(_))
    }

    /// The stream the error is scoped to, if any.
    pub fn stream(&self) -> Option<&str> {
        match self {
            SyncError::UnsupportedType { stream, .. }
            | SyncError::InvalidSyncMode { stream, .. }
            | SyncError::Read { stream, .. } => Some(stream),
            SyncError::Connection(_) | SyncError::Discovery(_) | SyncError::Emit(_) => None,
        }
    }
}
