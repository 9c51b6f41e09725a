//! Configuration files and flag parsing.
//!
//! Connection settings, configured catalogs and state snapshots are read
//! from JSON, YAML or TOML files, picked by file extension.

mod duration;

pub use duration::parse_duration;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::path::Path;
use sync_core::{ConfiguredCatalog, State};

/// On-disk configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Format implied by the extension; files without one are read as JSON.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            None | Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("toml") => Ok(FileFormat::Toml),
            Some(other) => bail!("Unsupported config file extension '.{other}'"),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> anyhow::Result<T> {
        let value = match self {
            FileFormat::Json => serde_json::from_str(content)?,
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Toml => toml::from_str(content)?,
        };
        Ok(value)
    }
}

/// Read and deserialize a config file.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let format = FileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read a configured catalog, rejecting incremental streams without a cursor field.
pub fn load_configured_catalog(path: &Path) -> anyhow::Result<ConfiguredCatalog> {
    let catalog: ConfiguredCatalog = load_file(path)?;
    for stream in &catalog.streams {
        if stream.sync_mode == sync_core::SyncMode::Incremental && stream.cursor_field.is_none() {
            tracing::warn!(
                "Stream '{}' is configured incremental without a cursor_field",
                stream.stream
            );
        }
    }
    Ok(catalog)
}

/// Read a state snapshot. An empty file is an empty state.
pub fn load_state(path: &Path) -> anyhow::Result<State> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(State::new());
    }
    FileFormat::from_path(path)?
        .parse(&content)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_sync_postgresql::PostgresConfig;
    use std::io::Write;
    use sync_core::{CursorValue, SyncMode};
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b.YML")).unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_path(Path::new("config")).unwrap(),
            FileFormat::Json
        );
        assert!(FileFormat::from_path(Path::new("c.ini")).is_err());
    }

    #[test]
    fn test_connection_config_formats() {
        let yaml = write_temp(
            ".yaml",
            "host: db\ndatabase: app\nusername: reader\nencoding: latin1\n",
        );
        let config: PostgresConfig = load_file(yaml.path()).unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.encoding, sync_core::SourceEncoding::Latin1);

        let toml = write_temp(
            ".toml",
            "host = \"db\"\nport = 6543\ndatabase = \"app\"\nusername = \"reader\"\n",
        );
        let config: PostgresConfig = load_file(toml.path()).unwrap();
        assert_eq!(config.port, 6543);
    }

    #[test]
    fn test_configured_catalog() {
        let file = write_temp(
            ".json",
            r#"{"streams": [
                {"stream": "public.users", "sync_mode": "full_refresh"},
                {"stream": "public.orders", "sync_mode": "incremental", "cursor_field": "id"}
            ]}"#,
        );
        let catalog = load_configured_catalog(file.path()).unwrap();
        assert_eq!(catalog.streams.len(), 2);
        assert_eq!(catalog.streams[1].sync_mode, SyncMode::Incremental);
        assert_eq!(catalog.streams[1].cursor_field.as_deref(), Some("id"));
    }

    #[test]
    fn test_state_file() {
        let file = write_temp(
            ".json",
            r#"{"public.orders": {"cursor_field": "id", "cursor": 41}}"#,
        );
        let state = load_state(file.path()).unwrap();
        assert_eq!(
            state.cursor_for("public.orders", "id"),
            Some(&CursorValue::from(41))
        );

        let empty = write_temp(".json", "  \n");
        assert!(load_state(empty.path()).unwrap().is_empty());
    }
}
