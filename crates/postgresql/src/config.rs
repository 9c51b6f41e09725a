use serde::Deserialize;
use sync_core::SourceEncoding;

fn default_port() -> u16 {
    5432
}

fn default_schemas() -> Vec<String> {
    vec!["public".to_string()]
}

/// Connection settings for a PostgreSQL source.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    #[serde(alias = "user")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Schemas to discover; empty means every non-system schema
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,
    /// Encoding of the stored character data.
    ///
    /// Rows are requested with `client_encoding=UTF8`, so this only differs
    /// from `utf8` for `SQL_ASCII` databases holding bytes of another encoding.
    #[serde(default)]
    pub encoding: SourceEncoding,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl PostgresConfig {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            database: database.into(),
            username: username.into(),
            password: None,
            schemas: default_schemas(),
            encoding: SourceEncoding::default(),
            connect_timeout_secs: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port/database`, for log lines. Never includes the password.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}
