//! Catalog discovery.

use std::collections::HashSet;

use sync_core::{Catalog, Field, PrimitiveKind, SourceConnection, StoreError, Stream, TableRef};
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// Result of a discovery: the catalog plus the columns that were left out.
#[derive(Debug)]
pub struct Discovery {
    pub catalog: Catalog,
    /// One [`SyncError::UnsupportedType`] per dropped column
    pub warnings: Vec<SyncError>,
}

/// Introspects a connection into a [`Catalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogDiscoverer {
    namespaces: Vec<String>,
}

impl CatalogDiscoverer {
    /// Restrict discovery to `namespaces`; an empty list means all of them.
    pub fn new(namespaces: Vec<String>) -> Self {
        Self { namespaces }
    }

    /// List the readable tables and build one stream per table.
    ///
    /// Columns whose native type has no mapping are dropped and reported in
    /// [`Discovery::warnings`]. A table with no supported column yields no
    /// stream.
    pub async fn discover<C>(&self, connection: &mut C) -> Result<Discovery, SyncError>
    where
        C: SourceConnection + ?Sized,
    {
        let tables = connection
            .list_tables(&self.namespaces)
            .await
            .map_err(discovery_error)?;
        debug!("Found {} readable tables", tables.len());

        let mut streams = Vec::with_capacity(tables.len());
        let mut seen = HashSet::new();
        let mut warnings = Vec::new();

        for table in tables {
            let stream_name = table.stream_name();
            if !seen.insert(stream_name.clone()) {
                warn!("Skipping duplicate stream name '{stream_name}'");
                continue;
            }

            match self
                .discover_table(connection, &table, &mut warnings)
                .await?
            {
                Some(stream) => streams.push(stream),
                None => warn!("Stream '{stream_name}' has no supported columns, skipping"),
            }
        }

        info!(
            "Discovered {} streams ({} columns skipped)",
            streams.len(),
            warnings.len()
        );
        Ok(Discovery {
            catalog: Catalog::new(streams),
            warnings,
        })
    }

    async fn discover_table<C>(
        &self,
        connection: &mut C,
        table: &TableRef,
        warnings: &mut Vec<SyncError>,
    ) -> Result<Option<Stream>, SyncError>
    where
        C: SourceConnection + ?Sized,
    {
        let stream_name = table.stream_name();
        let columns = connection
            .list_columns(table)
            .await
            .map_err(discovery_error)?;

        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            let kind = connection.resolve_type(&column.native_type);
            match Field::from_kind(&column.name, kind.clone(), column.nullable) {
                Some(field) => fields.push(field),
                None => {
                    let native_type = match kind {
                        PrimitiveKind::Unsupported(name) => name,
                        _ => column.native_type.clone(),
                    };
                    warn!(
                        "Dropping column '{}' of stream '{stream_name}': unsupported type '{native_type}'",
                        column.name
                    );
                    warnings.push(SyncError::UnsupportedType {
                        native_type,
                        column: column.name,
                        stream: stream_name.clone(),
                    });
                }
            }
        }

        if fields.is_empty() {
            return Ok(None);
        }

        let mut primary_key = connection
            .primary_key(table)
            .await
            .map_err(discovery_error)?;
        // A key with a dropped column no longer identifies rows
        if !primary_key
            .iter()
            .all(|key| fields.iter().any(|f: &Field| &f.name == key))
        {
            debug!("Primary key of '{stream_name}' references a dropped column, omitting it");
            primary_key.clear();
        }

        Ok(Some(Stream::new(table, fields).with_primary_key(primary_key)))
    }
}

fn discovery_error(e: StoreError) -> SyncError {
    match e {
        StoreError::Connection(message) => SyncError::Connection(message),
        other => SyncError::Discovery(other.to_string()),
    }
}
