//! A [`ConnectionProvider`] over tables held in memory.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use postgresql_types::resolve_native_type;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use sync_core::{
    coerce, ColumnDescriptor, ConnectionProvider, CursorValue, PrimitiveKind, QueryPlan, RawRow,
    RawRowStream, RawValue, SourceConnection, SourceEncoding, StoreError, TableRef,
};

/// One table: column metadata plus rows in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl MemoryTable {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            table: TableRef::new(Some(namespace.to_string()), name),
            columns: Vec::new(),
            primary_key: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Add a nullable column of a PostgreSQL type.
    pub fn column(mut self, name: &str, native_type: &str) -> Self {
        self.columns
            .push(ColumnDescriptor::new(name, native_type, true));
        self
    }

    pub fn not_null_column(mut self, name: &str, native_type: &str) -> Self {
        self.columns
            .push(ColumnDescriptor::new(name, native_type, false));
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a row; values are in column order.
    pub fn row(mut self, values: Vec<RawValue>) -> Self {
        self.rows.push(values);
        self
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Which error class an injected failure raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Query,
    Connection,
}

impl FailureKind {
    fn error(self, message: impl Into<String>) -> StoreError {
        match self {
            FailureKind::Query => StoreError::Query(message.into()),
            FailureKind::Connection => StoreError::Connection(message.into()),
        }
    }
}

/// Tables plus injected failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Vec<MemoryTable>,
    refuse_connections: bool,
    listing_failure: Option<FailureKind>,
    stream_failures: HashMap<String, (usize, FailureKind)>,
    ignore_cursor_bounds: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Every `open` fails with a connection error.
    pub fn refuse_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Listing tables fails.
    pub fn fail_listing(mut self, kind: FailureKind) -> Self {
        self.listing_failure = Some(kind);
        self
    }

    /// Reading `stream` fails after `rows` rows have been returned.
    pub fn fail_stream_after(mut self, stream: &str, rows: usize, kind: FailureKind) -> Self {
        self.stream_failures.insert(stream.to_string(), (rows, kind));
        self
    }

    /// Return every row of an incremental read, only ordering by cursor.
    pub fn ignore_cursor_bounds(mut self) -> Self {
        self.ignore_cursor_bounds = true;
        self
    }

    fn table(&self, table: &TableRef) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| &t.table == table)
    }

    /// Cursor of a stored value, compared the way a UTF-8 server would.
    fn cursor_key(&self, kind: &PrimitiveKind, raw: &RawValue) -> Option<CursorValue> {
        let value = coerce(kind, raw.clone(), SourceEncoding::Utf8).ok()?;
        CursorValue::from_value(&value)
    }

    fn select(&self, plan: &QueryPlan) -> Result<Vec<RawRow>, StoreError> {
        let table = self.table(&plan.table).ok_or_else(|| {
            StoreError::Query(format!("relation \"{}\" does not exist", plan.table))
        })?;
        let indices = plan
            .columns
            .iter()
            .map(|c| {
                table.column_index(&c.name).ok_or_else(|| {
                    StoreError::Query(format!("column \"{}\" does not exist", c.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<RawRow> = table
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(RawValue::Null))
                    .collect()
            })
            .collect();

        let (Some(cursor), Some(index)) = (&plan.cursor, plan.cursor_index()) else {
            return Ok(rows);
        };

        let mut keyed: Vec<(Option<CursorValue>, RawRow)> = rows
            .into_iter()
            .map(|row| (self.cursor_key(&cursor.kind, &row[index]), row))
            .filter(|(key, _)| {
                if self.ignore_cursor_bounds {
                    return true;
                }
                match (key, &cursor.lower_bound) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(key), Some(bound)) => key.is_after(bound),
                }
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}

/// Hands out [`MemoryConnection`]s and counts opens and closes.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    store: Arc<MemoryStore>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MemoryProvider {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(AtomicOrdering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(AtomicOrdering::SeqCst)
    }

    /// Connections opened and not closed yet.
    pub fn open_connections(&self) -> usize {
        self.opened() - self.closed()
    }
}

#[async_trait]
impl ConnectionProvider for MemoryProvider {
    type Connection = MemoryConnection;

    async fn open(&self) -> Result<MemoryConnection, StoreError> {
        if self.store.refuse_connections {
            return Err(StoreError::Connection(
                "connection refused by memory store".to_string(),
            ));
        }
        self.opened.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(MemoryConnection {
            store: Arc::clone(&self.store),
            executed: Vec::new(),
        })
    }

    async fn close(&self, _connection: MemoryConnection) -> Result<(), StoreError> {
        self.closed.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

/// A connection to a [`MemoryStore`]. Remembers the plans it executed.
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    executed: Vec<QueryPlan>,
}

impl MemoryConnection {
    pub fn executed(&self) -> &[QueryPlan] {
        &self.executed
    }
}

#[async_trait]
impl SourceConnection for MemoryConnection {
    fn resolve_type(&self, native_type: &str) -> PrimitiveKind {
        resolve_native_type(native_type)
    }

    async fn list_tables(&mut self, namespaces: &[String]) -> Result<Vec<TableRef>, StoreError> {
        if let Some(kind) = self.store.listing_failure {
            return Err(kind.error("permission denied for information_schema"));
        }
        Ok(self
            .store
            .tables
            .iter()
            .map(|t| t.table.clone())
            .filter(|t| {
                namespaces.is_empty()
                    || t.namespace
                        .as_ref()
                        .is_some_and(|ns| namespaces.contains(ns))
            })
            .collect())
    }

    async fn list_columns(&mut self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, StoreError> {
        self.store
            .table(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| StoreError::Query(format!("relation \"{table}\" does not exist")))
    }

    async fn primary_key(&mut self, table: &TableRef) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .table(table)
            .map(|t| t.primary_key.clone())
            .unwrap_or_default())
    }

    async fn execute<'a>(&'a mut self, plan: &QueryPlan) -> Result<RawRowStream<'a>, StoreError> {
        self.executed.push(plan.clone());
        let rows = self.store.select(plan)?;

        let items: Vec<Result<RawRow, StoreError>> = match self.store.stream_failures.get(&plan.stream)
        {
            Some(&(after, kind)) => rows
                .into_iter()
                .take(after)
                .map(Ok)
                .chain(std::iter::once(Err(
                    kind.error(format!("injected failure reading {}", plan.stream))
                )))
                .collect(),
            None => rows.into_iter().map(Ok).collect(),
        };
        Ok(stream::iter(items).boxed())
    }
}
