use async_trait::async_trait;
use std::time::Duration;
use sync_core::{ConnectionProvider, StoreError};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, error, info};

use crate::config::PostgresConfig;
use crate::connection::PostgresConnection;

/// Opens one `tokio-postgres` connection per sync.
#[derive(Clone, Debug)]
pub struct PostgresProvider {
    config: PostgresConfig,
}

impl PostgresProvider {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    fn pg_config(&self) -> PgConfig {
        let mut pg = PgConfig::new();
        pg.host(&self.config.host);
        pg.port(self.config.port);
        pg.user(&self.config.username);
        if let Some(password) = self.config.password.as_deref() {
            if !password.is_empty() {
                pg.password(password);
            }
        }
        pg.dbname(&self.config.database);
        pg.application_name("source-sync");
        if let Some(secs) = self.config.connect_timeout_secs {
            pg.connect_timeout(Duration::from_secs(secs));
        }
        pg
    }
}

#[async_trait]
impl ConnectionProvider for PostgresProvider {
    type Connection = PostgresConnection;

    async fn open(&self) -> Result<PostgresConnection, StoreError> {
        info!("Connecting to PostgreSQL at {}", self.config.display_target());

        let (client, connection) = self.pg_config().connect(NoTls).await.map_err(|e| {
            StoreError::Connection(format!(
                "Failed to connect to PostgreSQL at {}: {e}",
                self.config.display_target()
            ))
        })?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        // Surface authentication and permission problems before discovery
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StoreError::Connection(format!("Connection test failed: {e}")))?;

        debug!("Connected to PostgreSQL");
        Ok(PostgresConnection::new(client, handle))
    }

    async fn close(&self, connection: PostgresConnection) -> Result<(), StoreError> {
        let handle = connection.into_handle();
        handle
            .await
            .map_err(|e| StoreError::Connection(format!("Connection task failed: {e}")))?;
        debug!("Closed PostgreSQL connection");
        Ok(())
    }
}
