mod common;

use std::num::NonZeroU64;

use common::{catalog, logs, read, read_with, records, states};
use source_sync::testing::{fixtures, FailureKind, MemoryProvider, MemoryStore, MemoryTable};
use source_sync::{MessageSequencer, StreamOutcome, SyncError, SyncOptions, VecEmitter};
use sync_core::{ConfiguredStream, CursorValue, LogLevel, RawValue, State};

fn events() -> MemoryTable {
    (1..=6).fold(
        MemoryTable::new("public", "events")
            .column("id", "integer")
            .column("label", "text"),
        |table, id| table.row(vec![RawValue::Int(id), RawValue::text(format!("e{id}"))]),
    )
}

#[tokio::test]
async fn test_invalid_sync_mode_does_not_stop_siblings() {
    let provider = MemoryProvider::new(MemoryStore::new().with_table(fixtures::id_and_name()));
    let configured = catalog(vec![
        ConfiguredStream::full_refresh("public.missing"),
        ConfiguredStream::incremental("public.id_and_name", "nope"),
        ConfiguredStream::full_refresh("public.id_and_name"),
    ]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    let report = result.unwrap();

    assert_eq!(report.streams.len(), 3);
    assert_eq!(report.failed().count(), 2);
    for failed in report.failed() {
        match &failed.outcome {
            StreamOutcome::Failed(message) => assert!(message.contains("Invalid sync mode")),
            StreamOutcome::Succeeded => unreachable!(),
        }
    }
    assert_eq!(records(&messages, "public.id_and_name").len(), 3);
    assert_eq!(logs(&messages, LogLevel::Error).len(), 2);
    assert_eq!(provider.open_connections(), 0);
}

#[tokio::test]
async fn test_unsupported_columns_are_dropped_with_warning() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(fixtures::mixed_types())
            .with_table(fixtures::unsupported_only()),
    );
    let configured = catalog(vec![
        ConfiguredStream::full_refresh("public.mixed_types"),
        ConfiguredStream::full_refresh("public.unsupported_only"),
    ]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    let report = result.unwrap();

    let warnings = logs(&messages, LogLevel::Warn);
    assert_eq!(warnings.len(), 2);
    assert!(warnings
        .iter()
        .any(|w| w.contains("'tsvector'") && w.contains("'location'")));

    let rows = records(&messages, "public.mixed_types");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].get("location").is_none());
    assert_eq!(rows[0]["payload"]["k"][1], 2);

    // A stream with no supported column is not in the catalog
    let missing = report.stream("public.unsupported_only").unwrap();
    assert!(!missing.is_success());
}

#[tokio::test]
async fn test_read_warns_only_about_configured_streams() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(fixtures::id_and_name())
            .with_table(fixtures::mixed_types()),
    );
    let configured = catalog(vec![ConfiguredStream::full_refresh("public.id_and_name")]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    result.unwrap();

    assert_eq!(records(&messages, "public.id_and_name").len(), 3);
    assert!(logs(&messages, LogLevel::Warn).is_empty());
}

#[tokio::test]
async fn test_refused_connection_is_a_connection_error() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(fixtures::id_and_name())
            .refuse_connections(),
    );
    let configured = catalog(vec![ConfiguredStream::full_refresh("public.id_and_name")]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    assert!(matches!(result, Err(SyncError::Connection(_))));
    assert!(messages.is_empty());
    assert_eq!(provider.opened(), 0);

    let sequencer = MessageSequencer::new(provider, SyncOptions::default());
    assert!(matches!(
        sequencer.check().await,
        Err(SyncError::Connection(_))
    ));
}

#[tokio::test]
async fn test_listing_failure_is_a_discovery_error() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(fixtures::id_and_name())
            .fail_listing(FailureKind::Query),
    );
    let sequencer = MessageSequencer::new(provider.clone(), SyncOptions::default());
    let mut emitter = VecEmitter::new();

    let result = sequencer.discover(&mut emitter).await;
    assert!(matches!(result, Err(SyncError::Discovery(_))));
    assert!(emitter.messages.is_empty());
    assert_eq!(provider.opened(), 1);
    assert_eq!(provider.open_connections(), 0);
}

#[tokio::test]
async fn test_connection_lost_mid_stream_aborts_sync() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(fixtures::id_and_name())
            .with_table(events())
            .fail_stream_after("public.events", 2, FailureKind::Connection),
    );
    let configured = catalog(vec![
        ConfiguredStream::incremental("public.events", "id"),
        ConfiguredStream::full_refresh("public.id_and_name"),
    ]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    assert!(matches!(result, Err(SyncError::Connection(_))));

    assert_eq!(records(&messages, "public.events").len(), 2);
    assert!(records(&messages, "public.id_and_name").is_empty());
    assert!(states(&messages).is_empty());
    assert_eq!(logs(&messages, LogLevel::Error).len(), 1);
    assert_eq!(provider.open_connections(), 0);
}

#[tokio::test]
async fn test_failed_stream_keeps_last_emitted_checkpoint() {
    let provider = MemoryProvider::new(
        MemoryStore::new()
            .with_table(events())
            .fail_stream_after("public.events", 5, FailureKind::Query),
    );
    let configured = catalog(vec![ConfiguredStream::incremental("public.events", "id")]);
    let options = SyncOptions {
        checkpoint_interval: NonZeroU64::new(2),
        ..SyncOptions::default()
    };

    let (result, messages) = read_with(&provider, &configured, State::new(), options).await;
    let report = result.unwrap();

    assert!(report.has_failures());
    assert_eq!(report.stream("public.events").unwrap().records, 5);

    // Checkpoints after ids 2 and 4; the failure must not advance past 4
    let emitted = states(&messages);
    assert_eq!(emitted.len(), 2);
    let last = emitted.last().unwrap();
    assert_eq!(
        last.cursor_for("public.events", "id"),
        Some(&CursorValue::from(4))
    );
    assert_eq!(&report.state, last);
}
