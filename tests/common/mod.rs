//! Helpers shared by the engine integration tests.

#![allow(dead_code)]

use serde_json::Value;
use source_sync::testing::{MemoryProvider, MemoryStore, MemoryTable};
use source_sync::{MessageSequencer, SyncError, SyncOptions, SyncReport, VecEmitter};
use sync_core::{ConfiguredCatalog, ConfiguredStream, LogLevel, Message, State};

pub fn provider(tables: Vec<MemoryTable>) -> MemoryProvider {
    let store = tables
        .into_iter()
        .fold(MemoryStore::new(), |store, table| store.with_table(table));
    MemoryProvider::new(store)
}

pub fn catalog(streams: Vec<ConfiguredStream>) -> ConfiguredCatalog {
    ConfiguredCatalog::new(streams)
}

/// Run a read and collect every emitted message.
pub async fn read_with(
    provider: &MemoryProvider,
    configured: &ConfiguredCatalog,
    state: State,
    options: SyncOptions,
) -> (Result<SyncReport, SyncError>, Vec<Message>) {
    let sequencer = MessageSequencer::new(provider.clone(), options);
    let mut emitter = VecEmitter::new();
    let result = sequencer.read(configured, state, &mut emitter).await;
    (result, emitter.into_messages())
}

pub async fn read(
    provider: &MemoryProvider,
    configured: &ConfiguredCatalog,
    state: State,
) -> (Result<SyncReport, SyncError>, Vec<Message>) {
    read_with(provider, configured, state, SyncOptions::default()).await
}

/// Record payloads of `stream`, in emission order.
pub fn records(messages: &[Message], stream: &str) -> Vec<Value> {
    messages
        .iter()
        .filter_map(Message::as_record)
        .filter(|r| r.stream == stream)
        .map(|r| serde_json::to_value(&r.data).unwrap())
        .collect()
}

pub fn states(messages: &[Message]) -> Vec<State> {
    messages
        .iter()
        .filter_map(Message::as_state)
        .cloned()
        .collect()
}

pub fn logs(messages: &[Message], level: LogLevel) -> Vec<String> {
    messages
        .iter()
        .filter_map(Message::as_log)
        .filter(|l| l.level == level)
        .map(|l| l.message.clone())
        .collect()
}

/// Sort record payloads by one of their string fields.
pub fn sorted_by(mut values: Vec<Value>, field: &str) -> Vec<Value> {
    values.sort_by(|a, b| {
        let a = a[field].as_str().unwrap_or_default().to_string();
        let b = b[field].as_str().unwrap_or_default().to_string();
        a.cmp(&b)
    });
    values
}
