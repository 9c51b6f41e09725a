//! Schema introspection for PostgreSQL.
//!
//! Queries `information_schema` for the tables the current role can SELECT
//! and their columns, and `pg_index` for primary keys.

use pg_escape::quote_identifier;
use sync_core::{ColumnDescriptor, StoreError, TableRef};
use tokio_postgres::Client;
use tracing::debug;

use crate::connection::store_error;

const TABLES_IN_SCHEMAS: &str = r"
    SELECT table_schema::text, table_name::text
    FROM information_schema.tables
    WHERE table_type IN ('BASE TABLE', 'VIEW')
        AND table_schema::text = ANY($1::text[])
        AND has_table_privilege(
            quote_ident(table_schema) || '.' || quote_ident(table_name), 'SELECT')
    ORDER BY table_schema, table_name
";

const TABLES_ALL_SCHEMAS: &str = r"
    SELECT table_schema::text, table_name::text
    FROM information_schema.tables
    WHERE table_type IN ('BASE TABLE', 'VIEW')
        AND table_schema NOT IN ('pg_catalog', 'information_schema')
        AND table_schema::text NOT LIKE 'pg\_toast%'
        AND has_table_privilege(
            quote_ident(table_schema) || '.' || quote_ident(table_name), 'SELECT')
    ORDER BY table_schema, table_name
";

const TABLE_COLUMNS: &str = r"
    SELECT
        column_name::text,
        CASE WHEN data_type = 'USER-DEFINED' THEN udt_name::text ELSE data_type::text END,
        is_nullable::text = 'YES'
    FROM information_schema.columns
    WHERE table_schema::text = COALESCE($1::text, current_schema())
        AND table_name::text = $2::text
    ORDER BY ordinal_position
";

const PRIMARY_KEY: &str = r"
    SELECT a.attname::text
    FROM pg_index i
    JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
    WHERE i.indrelid = $1::text::regclass
        AND i.indisprimary
    ORDER BY array_position(i.indkey, a.attnum)
";

/// Tables readable by the current role.
pub(crate) async fn list_tables(
    client: &Client,
    namespaces: &[String],
) -> Result<Vec<TableRef>, StoreError> {
    let rows = if namespaces.is_empty() {
        client.query(TABLES_ALL_SCHEMAS, &[]).await
    } else {
        client.query(TABLES_IN_SCHEMAS, &[&namespaces]).await
    }
    .map_err(store_error)?;

    let tables: Vec<TableRef> = rows
        .iter()
        .map(|row| TableRef::new(Some(row.get::<_, String>(0)), row.get::<_, String>(1)))
        .collect();
    debug!("Found {} readable tables", tables.len());
    Ok(tables)
}

/// Columns of a table in ordinal order.
pub(crate) async fn list_columns(
    client: &Client,
    table: &TableRef,
) -> Result<Vec<ColumnDescriptor>, StoreError> {
    let rows = client
        .query(TABLE_COLUMNS, &[&table.namespace, &table.name])
        .await
        .map_err(store_error)?;

    Ok(rows
        .iter()
        .map(|row| {
            ColumnDescriptor::new(
                row.get::<_, String>(0),
                row.get::<_, String>(1),
                row.get::<_, bool>(2),
            )
        })
        .collect())
}

/// Primary key columns of a table, in key order.
pub(crate) async fn primary_key(
    client: &Client,
    table: &TableRef,
) -> Result<Vec<String>, StoreError> {
    let qualified = match &table.namespace {
        Some(ns) => format!("{}.{}", quote_identifier(ns), quote_identifier(&table.name)),
        None => quote_identifier(&table.name).to_string(),
    };

    let rows = client
        .query(PRIMARY_KEY, &[&qualified])
        .await
        .map_err(store_error)?;
    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}
