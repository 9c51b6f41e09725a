//! Drives a sync and sequences its output messages.
//!
//! One connection is opened per operation and closed on every exit path.
//! Configured streams are read one after another; a failure inside one
//! stream is reported and the next stream starts, while connection and
//! emission failures abort the whole sync.

use std::num::NonZeroU64;

use futures::StreamExt;
use sync_core::{
    Catalog, ConfiguredCatalog, ConfiguredStream, ConnectionProvider, CursorValue, LogLevel,
    Message, SourceEncoding, State, StoreError, SyncMode,
};
use tracing::{error, info, warn};

use crate::discover::{CatalogDiscoverer, Discovery};
use crate::emitter::MessageEmitter;
use crate::error::SyncError;
use crate::plan::{ignored_state_reason, plan};
use crate::streamer::RecordStreamer;
use crate::tracker::StateTracker;

/// Knobs of a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Namespaces to discover; empty means all
    pub namespaces: Vec<String>,
    /// Encoding text bytes are decoded with
    pub encoding: SourceEncoding,
    /// Emit a STATE every N records of an incremental stream
    pub checkpoint_interval: Option<NonZeroU64>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            namespaces: vec!["public".to_string()],
            encoding: SourceEncoding::Utf8,
            checkpoint_interval: None,
        }
    }
}

/// How one configured stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub stream: String,
    pub sync_mode: SyncMode,
    pub records: u64,
    pub outcome: StreamOutcome,
}

impl StreamReport {
    pub fn is_success(&self) -> bool {
        self.outcome == StreamOutcome::Succeeded
    }
}

/// Summary of a finished read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub streams: Vec<StreamReport>,
    /// State after the last emitted STATE of each stream
    pub state: State,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        self.streams.iter().any(|s| !s.is_success())
    }

    pub fn records_emitted(&self) -> u64 {
        self.streams.iter().map(|s| s.records).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &StreamReport> {
        self.streams.iter().filter(|s| !s.is_success())
    }

    pub fn stream(&self, name: &str) -> Option<&StreamReport> {
        self.streams.iter().find(|s| s.stream == name)
    }
}

/// Runs check, discover and read operations against a connection provider.
pub struct MessageSequencer<P: ConnectionProvider> {
    provider: P,
    options: SyncOptions,
}

impl<P: ConnectionProvider> MessageSequencer<P> {
    pub fn new(provider: P, options: SyncOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Open and close a connection.
    pub async fn check(&self) -> Result<(), SyncError> {
        let connection = self.open().await?;
        self.close(connection).await
    }

    /// Discover the catalog and emit it as one CATALOG message.
    ///
    /// Dropped columns are reported as LOG(WARN) messages ahead of it.
    pub async fn discover<E>(&self, emitter: &mut E) -> Result<Catalog, SyncError>
    where
        E: MessageEmitter + ?Sized,
    {
        let mut connection = self.open().await?;
        let result = self.discover_with(&mut connection, emitter, None).await;
        let closed = self.close(connection).await;

        let catalog = result?;
        closed?;
        emitter.emit(Message::catalog(catalog.clone())).await?;
        emitter.flush().await?;
        Ok(catalog)
    }

    /// Read the configured streams, resuming from `state`.
    pub async fn read<E>(
        &self,
        configured: &ConfiguredCatalog,
        state: State,
        emitter: &mut E,
    ) -> Result<SyncReport, SyncError>
    where
        E: MessageEmitter + ?Sized,
    {
        let mut connection = self.open().await?;
        let result = self
            .read_with(&mut connection, configured, state, emitter)
            .await;
        let closed = self.close(connection).await;

        let report = result?;
        if let Err(e) = closed {
            warn!("Sync finished but closing the connection failed: {e}");
        }
        emitter.flush().await?;
        Ok(report)
    }

    async fn open(&self) -> Result<P::Connection, SyncError> {
        self.provider.open().await.map_err(connection_error)
    }

    async fn close(&self, connection: P::Connection) -> Result<(), SyncError> {
        self.provider.close(connection).await.map_err(connection_error)
    }

    /// Discover the catalog, reporting dropped columns of the `configured`
    /// streams only (of every stream when `None`).
    async fn discover_with<E>(
        &self,
        connection: &mut P::Connection,
        emitter: &mut E,
        configured: Option<&ConfiguredCatalog>,
    ) -> Result<Catalog, SyncError>
    where
        E: MessageEmitter + ?Sized,
    {
        let Discovery { catalog, warnings } = CatalogDiscoverer::new(self.options.namespaces.clone())
            .discover(connection)
            .await?;
        for warning in warnings {
            let relevant = match (configured, warning.stream()) {
                (Some(configured), Some(stream)) => {
                    configured.streams.iter().any(|s| s.stream == stream)
                }
                _ => true,
            };
            if !relevant {
                continue;
            }
            emitter
                .emit(Message::log(LogLevel::Warn, warning.to_string()))
                .await?;
        }
        Ok(catalog)
    }

    async fn read_with<E>(
        &self,
        connection: &mut P::Connection,
        configured: &ConfiguredCatalog,
        state: State,
        emitter: &mut E,
    ) -> Result<SyncReport, SyncError>
    where
        E: MessageEmitter + ?Sized,
    {
        let catalog = self
            .discover_with(connection, emitter, Some(configured))
            .await?;
        let mut tracker = StateTracker::new(state, self.options.checkpoint_interval);
        let mut reports = Vec::with_capacity(configured.streams.len());

        for stream in &configured.streams {
            let mut records = 0u64;
            let result = self
                .read_stream(connection, &catalog, stream, &mut tracker, emitter, &mut records)
                .await;

            let outcome = match result {
                Ok(()) => {
                    info!("Stream '{}' done: {records} records", stream.stream);
                    StreamOutcome::Succeeded
                }
                Err(e) => {
                    tracker.abort();
                    error!("Stream '{}' failed after {records} records: {e}", stream.stream);
                    if e.is_fatal() {
                        // Best effort: the sink may be what failed
                        let _ = emitter.emit(Message::log(LogLevel::Error, e.to_string())).await;
                        return Err(e);
                    }
                    emitter
                        .emit(Message::log(LogLevel::Error, e.to_string()))
                        .await?;
                    StreamOutcome::Failed(e.to_string())
                }
            };

            reports.push(StreamReport {
                stream: stream.stream.clone(),
                sync_mode: stream.sync_mode,
                records,
                outcome,
            });
        }

        Ok(SyncReport {
            streams: reports,
            state: tracker.into_state(),
        })
    }

    async fn read_stream<E>(
        &self,
        connection: &mut P::Connection,
        catalog: &Catalog,
        configured: &ConfiguredStream,
        tracker: &mut StateTracker,
        emitter: &mut E,
        records: &mut u64,
    ) -> Result<(), SyncError>
    where
        E: MessageEmitter + ?Sized,
    {
        let plan = plan(catalog, configured, tracker.state())?;
        if let Some(reason) = ignored_state_reason(catalog, configured, tracker.state()) {
            warn!("{reason}");
            emitter.emit(Message::log(LogLevel::Warn, reason)).await?;
        }

        let cursor_field = plan.cursor.as_ref().map(|c| c.field.clone());
        if let Some(cursor) = &plan.cursor {
            tracker.begin(&plan.stream, &cursor.field, cursor.lower_bound.as_ref());
        }
        info!(
            "Reading stream '{}' ({}, {} columns)",
            plan.stream,
            plan.sync_mode(),
            plan.columns.len()
        );

        let streamer = RecordStreamer::new(self.options.encoding);
        let mut rows = streamer.stream(connection, &plan);
        while let Some(row) = rows.next().await {
            let row = row?;
            if let Some(field) = &cursor_field {
                let cursor = row.get(field).and_then(CursorValue::from_value);
                if let Some(snapshot) = tracker.observe(cursor.as_ref()) {
                    emitter.emit(Message::state(snapshot)).await?;
                }
            }
            emitter
                .emit(Message::record(&plan.stream, row, now_millis()))
                .await?;
            *records += 1;
        }
        drop(rows);

        if cursor_field.is_some() {
            if let Some(snapshot) = tracker.finish() {
                emitter.emit(Message::state(snapshot)).await?;
            }
        }
        Ok(())
    }
}

fn connection_error(e: StoreError) -> SyncError {
    match e {
        StoreError::Connection(message) => SyncError::Connection(message),
        other => SyncError::Connection(other.to_string()),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
