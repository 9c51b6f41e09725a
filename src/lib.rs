//! source-sync
//!
//! Reads tables of a relational store and emits them as a sequence of
//! typed RECORD, STATE, CATALOG and LOG messages.
//!
//! # Pipeline
//!
//! ```text
//! CatalogDiscoverer ─▶ plan ─▶ RecordStreamer ─▶ MessageSequencer ─▶ MessageEmitter
//!                                      │                ▲
//!                                      └─ StateTracker ─┘
//! ```
//!
//! - [`CatalogDiscoverer`] lists readable tables and maps their columns
//! - [`plan()`] turns a configured stream plus prior state into a [`sync_core::QueryPlan`]
//! - [`RecordStreamer`] executes a plan lazily, coercing every value
//! - [`StateTracker`] follows the cursor of incremental streams
//! - [`MessageSequencer`] drives all of the above against a connection provider
//!
//! # Extraction modes
//!
//! - Full refresh: every row of the table, no STATE
//! - Incremental: rows whose cursor is strictly after the last checkpoint,
//!   in cursor order, followed by a STATE holding the new maximum
//!
//! # CLI Usage
//!
//! ```bash
//! source-sync check --config postgres.yaml
//! source-sync discover --config postgres.yaml
//! source-sync read --config postgres.yaml --catalog catalog.json \
//!   --state-dir .source-sync-state --resume --checkpoint-interval 10000
//! ```

pub mod config;
pub mod discover;
pub mod emitter;
pub mod error;
pub mod plan;
pub mod sequencer;
pub mod streamer;
pub mod testing;
pub mod tracker;

pub use discover::{CatalogDiscoverer, Discovery};
pub use emitter::{JsonLinesEmitter, MessageEmitter, VecEmitter};
pub use error::SyncError;
pub use plan::{ignored_state_reason, plan};
pub use sequencer::{
    MessageSequencer, StreamOutcome, StreamReport, SyncOptions, SyncReport,
};
pub use streamer::{RecordStream, RecordStreamer, RowConverter};
pub use tracker::StateTracker;
