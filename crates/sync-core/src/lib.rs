//! Core protocol types for the source-sync framework.
//!
//! This crate provides the foundational types shared by the engine and
//! every backing store:
//!
//! - [`PrimitiveKind`] / [`FieldType`] - Closed type universe for native columns
//! - [`RawValue`] / [`coerce`] - Store values and their coercion into output values
//! - [`Catalog`] / [`Stream`] / [`ConfiguredCatalog`] - Discovered and selected streams
//! - [`CursorValue`] / [`State`] - Orderable cursors and resumable checkpoints
//! - [`Message`] - RECORD / STATE / CATALOG / LOG output messages
//! - [`SourceConnection`] / [`ConnectionProvider`] - Capabilities a store must expose
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── postgresql-types        (native type names → PrimitiveKind, wire decoding)
//!    ├─── source-sync-postgresql  (implements SourceConnection for PostgreSQL)
//!    ├─── checkpoint              (persists State snapshots)
//!    └─── source-sync             (discover / plan / stream / sequence engine)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{coerce, PrimitiveKind, RawValue, SourceEncoding};
//!
//! let value = coerce(&PrimitiveKind::Float, RawValue::Float(f64::NAN), SourceEncoding::Utf8).unwrap();
//! assert!(value.is_null());
//! ```

pub mod cursor;
pub mod message;
pub mod plan;
pub mod schema;
pub mod state;
pub mod store;
pub mod types;
pub mod values;

pub use cursor::CursorValue;
pub use message::{LogLevel, LogMessage, Message, RecordMessage, StateMessage};
pub use plan::{CursorPlan, PlannedColumn, QueryPlan};
pub use schema::{Catalog, ConfiguredCatalog, ConfiguredStream, Stream, TableRef};
pub use state::{State, StreamState};
pub use store::{ConnectionProvider, RawRow, RawRowStream, SourceConnection, StoreError};
pub use types::{ColumnDescriptor, Field, FieldType, PrimitiveKind, SyncMode};
pub use values::{coerce, ConversionError, NumericText, RawValue, Row, SourceEncoding, Value};
