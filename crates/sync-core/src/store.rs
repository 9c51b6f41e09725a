//! Capabilities a backing store must expose to the engine.
//!
//! The engine never talks SQL. It asks a [`SourceConnection`] to list
//! tables and columns, to resolve native type names, and to execute a
//! [`QueryPlan`] as a lazy stream of raw rows. A [`ConnectionProvider`]
//! owns connection lifecycle.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::plan::QueryPlan;
use crate::schema::TableRef;
use crate::types::{ColumnDescriptor, PrimitiveKind};
use crate::values::RawValue;

/// One row as returned by the store, in plan column order.
pub type RawRow = Vec<RawValue>;

/// Lazy stream of raw rows borrowing the connection.
pub type RawRowStream<'a> = BoxStream<'a, Result<RawRow, StoreError>>;

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Authentication, network, or a closed connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// A query or introspection statement failed
    #[error("Query error: {0}")]
    Query(String),

    /// A cell could not be decoded from its wire format
    #[error("Conversion error in column '{column}': {message}")]
    Conversion { column: String, message: String },
}

impl StoreError {
    /// Connection-class failures abort the whole sync.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// An open connection to a backing store.
#[async_trait]
pub trait SourceConnection: Send {
    /// Map a native column type name onto the shared type universe.
    fn resolve_type(&self, native_type: &str) -> PrimitiveKind;

    /// Tables the connection may read, restricted to `namespaces` when non-empty.
    async fn list_tables(&mut self, namespaces: &[String]) -> Result<Vec<TableRef>, StoreError>;

    /// Columns of `table` in ordinal order.
    async fn list_columns(&mut self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, StoreError>;

    /// Primary key columns of `table`; empty when none is declared.
    async fn primary_key(&mut self, _table: &TableRef) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    /// Execute a plan.
    ///
    /// Rows are produced lazily and in cursor order for incremental plans.
    /// Rows whose cursor is null or a special numeric value must not be
    /// returned, and the lower bound is strict.
    async fn execute<'a>(&'a mut self, plan: &QueryPlan) -> Result<RawRowStream<'a>, StoreError>;
}

/// Opens and closes connections.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Connection: SourceConnection;

    /// Open a connection; authentication and network failures are
    /// [`StoreError::Connection`].
    async fn open(&self) -> Result<Self::Connection, StoreError>;

    /// Release a connection.
    async fn close(&self, connection: Self::Connection) -> Result<(), StoreError>;
}
