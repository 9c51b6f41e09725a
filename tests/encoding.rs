mod common;

use common::{catalog, logs, provider, read, read_with, records};
use serde_json::json;
use source_sync::testing::{fixtures, MemoryTable};
use source_sync::{JsonLinesEmitter, MessageSequencer, StreamOutcome, SyncError, SyncOptions};
use sync_core::{ConfiguredStream, LogLevel, RawValue, SourceEncoding, State};

fn latin1_table() -> MemoryTable {
    MemoryTable::new("public", "legacy")
        .column("id", "integer")
        .column("city", "character varying")
        // "Zürich" and "Besançon" in ISO-8859-1
        .row(vec![
            RawValue::Int(1),
            RawValue::Text(vec![0x5a, 0xfc, 0x72, 0x69, 0x63, 0x68]),
        ])
        .row(vec![
            RawValue::Int(2),
            RawValue::Text(vec![0x42, 0x65, 0x73, 0x61, 0x6e, 0xe7, 0x6f, 0x6e]),
        ])
}

#[tokio::test]
async fn test_multibyte_text_is_preserved() {
    let provider = provider(vec![fixtures::utf8_names()]);
    let configured = catalog(vec![ConfiguredStream::full_refresh("public.utf8_names")]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    result.unwrap();

    let mut rows = records(&messages, "public.utf8_names");
    rows.sort_by_key(|r| r["id"].as_i64());
    assert_eq!(
        rows,
        vec![
            json!({"id": 1, "name": "\u{2013} someutfstring"}),
            json!({"id": 2, "name": "\u{2215}"}),
        ]
    );
}

#[tokio::test]
async fn test_json_lines_output_keeps_utf8_bytes() {
    let provider = provider(vec![fixtures::utf8_names()]);
    let configured = catalog(vec![ConfiguredStream::full_refresh("public.utf8_names")]);
    let sequencer = MessageSequencer::new(provider, SyncOptions::default());

    let mut emitter = JsonLinesEmitter::new(Vec::new());
    sequencer
        .read(&configured, State::new(), &mut emitter)
        .await
        .unwrap();

    let output = emitter.into_inner();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\"name\":\"\u{2013} someutfstring\""));
    assert!(text.contains("\"name\":\"\u{2215}\""));
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn test_declared_latin1_encoding_decodes_text() {
    let provider = provider(vec![latin1_table()]);
    let configured = catalog(vec![ConfiguredStream::full_refresh("public.legacy")]);
    let options = SyncOptions {
        encoding: SourceEncoding::Latin1,
        ..SyncOptions::default()
    };

    let (result, messages) = read_with(&provider, &configured, State::new(), options).await;
    result.unwrap();

    let cities: Vec<_> = records(&messages, "public.legacy")
        .into_iter()
        .map(|r| r["city"].clone())
        .collect();
    assert_eq!(cities, vec![json!("Z\u{fc}rich"), json!("Besan\u{e7}on")]);
}

#[tokio::test]
async fn test_invalid_bytes_fail_only_their_stream() {
    let provider = provider(vec![latin1_table(), fixtures::utf8_names()]);
    let configured = catalog(vec![
        ConfiguredStream::full_refresh("public.legacy"),
        ConfiguredStream::full_refresh("public.utf8_names"),
    ]);

    let (result, messages) = read(&provider, &configured, State::new()).await;
    let report = result.unwrap();

    assert!(report.has_failures());
    let legacy = report.stream("public.legacy").unwrap();
    assert!(matches!(legacy.outcome, StreamOutcome::Failed(_)));
    assert_eq!(legacy.records, 0);
    assert!(report.stream("public.utf8_names").unwrap().is_success());
    assert_eq!(records(&messages, "public.utf8_names").len(), 2);

    let errors = logs(&messages, LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("column 'city'"));
    assert!(errors[0].contains("utf8"));
    assert_eq!(provider.open_connections(), 0);
}

#[test]
fn test_read_error_carries_stream() {
    let err = SyncError::Read {
        stream: "public.legacy".to_string(),
        message: "Invalid utf8 text".to_string(),
    };
    assert_eq!(err.stream(), Some("public.legacy"));
    assert!(!err.is_fatal());
}
