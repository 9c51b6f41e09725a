//! Sinks for the output message sequence.

use async_trait::async_trait;
use checkpoint::{CheckpointStore, SyncManager, SyncPhase};
use sync_core::Message;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::SyncError;

/// Receives messages in sequence order.
#[async_trait]
pub trait MessageEmitter: Send {
    async fn emit(&mut self, message: Message) -> Result<(), SyncError>;

    /// Push buffered messages out.
    async fn flush(&mut self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct VecEmitter {
    pub messages: Vec<Message>,
}

impl VecEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[async_trait]
impl MessageEmitter for VecEmitter {
    async fn emit(&mut self, message: Message) -> Result<(), SyncError> {
        self.messages.push(message);
        Ok(())
    }
}

/// Writes one JSON document per line.
///
/// STATE messages are flushed as soon as they are written and, when a
/// checkpoint manager is attached, persisted as in-progress checkpoints
/// after they have been written.
pub struct JsonLinesEmitter<W, S: CheckpointStore> {
    writer: W,
    checkpoints: Option<SyncManager<S>>,
    written: u64,
}

impl<W> JsonLinesEmitter<W, checkpoint::FilesystemStore>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            checkpoints: None,
            written: 0,
        }
    }
}

impl<W, S> JsonLinesEmitter<W, S>
where
    W: AsyncWrite + Unpin + Send,
    S: CheckpointStore,
{
    pub fn with_checkpoints(writer: W, checkpoints: SyncManager<S>) -> Self {
        Self {
            writer,
            checkpoints: Some(checkpoints),
            written: 0,
        }
    }

    pub fn checkpoints(&self) -> Option<&SyncManager<S>> {
        self.checkpoints.as_ref()
    }

    /// Number of messages written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    async fn write_line(&mut self, message: &Message) -> Result<(), SyncError> {
        let mut line = serde_json::to_vec(message).map_err(|e| SyncError::Emit(e.to_string()))?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| SyncError::Emit(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}

#[async_trait]
impl<W, S> MessageEmitter for JsonLinesEmitter<W, S>
where
    W: AsyncWrite + Unpin + Send,
    S: CheckpointStore,
{
    async fn emit(&mut self, message: Message) -> Result<(), SyncError> {
        self.write_line(&message).await?;

        if let Some(state) = message.as_state() {
            self.flush().await?;
            if let Some(manager) = &self.checkpoints {
                manager
                    .emit_checkpoint(state, SyncPhase::InProgress)
                    .await
                    .map_err(|e| SyncError::Emit(format!("Failed to persist state: {e:#}")))?;
                debug!("Persisted state for {} streams", state.len());
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SyncError> {
        self.writer
            .flush()
            .await
            .map_err(|e| SyncError::Emit(e.to_string()))
    }
}
