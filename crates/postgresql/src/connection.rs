use async_trait::async_trait;
use futures::StreamExt;
use postgresql_types::{cell_to_raw, resolve_native_type};
use sync_core::{
    ColumnDescriptor, PrimitiveKind, QueryPlan, RawRow, RawRowStream, SourceConnection,
    StoreError, TableRef,
};
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;
use tracing::debug;

use crate::discovery;
use crate::query::render_query;

/// Map a driver error onto the store error classes.
///
/// Closed sockets, connection exceptions (SQLSTATE class 08) and
/// authorization failures (class 28) are connection errors; everything
/// else is a query error.
pub(crate) fn store_error(e: tokio_postgres::Error) -> StoreError {
    if e.is_closed() {
        return StoreError::Connection(e.to_string());
    }
    match e.code() {
        Some(code) if is_connection_state(code) => StoreError::Connection(e.to_string()),
        _ => StoreError::Query(e.to_string()),
    }
}

fn is_connection_state(code: &SqlState) -> bool {
    let code = code.code();
    code.starts_with("08") || code.starts_with("28") || code == SqlState::ADMIN_SHUTDOWN.code()
}

/// An open PostgreSQL connection.
pub struct PostgresConnection {
    client: Client,
    handle: JoinHandle<()>,
}

impl PostgresConnection {
    pub(crate) fn new(client: Client, handle: JoinHandle<()>) -> Self {
        Self { client, handle }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Drop the client and hand back the connection task, which then finishes.
    pub(crate) fn into_handle(self) -> JoinHandle<()> {
        drop(self.client);
        self.handle
    }
}

#[async_trait]
impl SourceConnection for PostgresConnection {
    fn resolve_type(&self, native_type: &str) -> PrimitiveKind {
        resolve_native_type(native_type)
    }

    async fn list_tables(&mut self, namespaces: &[String]) -> Result<Vec<TableRef>, StoreError> {
        discovery::list_tables(&self.client, namespaces).await
    }

    async fn list_columns(&mut self, table: &TableRef) -> Result<Vec<ColumnDescriptor>, StoreError> {
        discovery::list_columns(&self.client, table).await
    }

    async fn primary_key(&mut self, table: &TableRef) -> Result<Vec<String>, StoreError> {
        discovery::primary_key(&self.client, table).await
    }

    async fn execute<'a>(&'a mut self, plan: &QueryPlan) -> Result<RawRowStream<'a>, StoreError> {
        let query = render_query(plan);
        debug!(
            "Reading stream {} with: {} (bound: {:?})",
            plan.stream, query.sql, query.bind
        );

        let params: Vec<String> = query.bind.into_iter().collect();
        let rows = self
            .client
            .query_raw(query.sql.as_str(), params)
            .await
            .map_err(store_error)?;

        let kinds: Vec<PrimitiveKind> = plan.columns.iter().map(|c| c.kind.clone()).collect();
        let stream = rows.map(move |row| {
            let row = row.map_err(store_error)?;
            kinds
                .iter()
                .enumerate()
                .map(|(index, kind)| cell_to_raw(&row, index, kind))
                .collect::<Result<RawRow, StoreError>>()
        });

        Ok(stream.boxed())
    }
}
