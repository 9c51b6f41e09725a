//! Catalog and configured-catalog types.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use std::fmt;

use crate::types::{Field, SyncMode};
use crate::values::Value;

/// Location of a table in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Stream name for this table: `namespace.name`, or the bare name.
    pub fn stream_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stream_name())
    }
}

/// A readable stream: one table with its supported fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stream {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Table name without the namespace
    #[serde(default)]
    pub table: String,
    pub fields: Vec<Field>,
    pub supported_sync_modes: Vec<SyncMode>,
    #[serde(default)]
    pub source_defined_primary_key: Option<Vec<String>>,
}

impl Stream {
    pub fn new(table: &TableRef, fields: Vec<Field>) -> Self {
        let supported_sync_modes = if fields.iter().any(Field::is_orderable) {
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        } else {
            vec![SyncMode::FullRefresh]
        };

        Self {
            name: table.stream_name(),
            namespace: table.namespace.clone(),
            table: table.name.clone(),
            fields,
            supported_sync_modes,
            source_defined_primary_key: None,
        }
    }

    pub fn with_primary_key(mut self, key: Vec<String>) -> Self {
        if !key.is_empty() {
            self.source_defined_primary_key = Some(key);
        }
        self
    }

    pub fn table_ref(&self) -> TableRef {
        let table = if self.table.is_empty() {
            self.name.clone()
        } else {
            self.table.clone()
        };
        TableRef::new(self.namespace.clone(), table)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn supports(&self, mode: SyncMode) -> bool {
        self.supported_sync_modes.contains(&mode)
    }

    /// JSON schema describing a record of this stream.
    pub fn json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                let schema = if field.nullable {
                    json!({"type": [field.field_type.as_str(), "null"]})
                } else {
                    json!({"type": field.field_type.as_str()})
                };
                (field.name.clone(), schema)
            })
            .collect();
        json!({"type": "object", "properties": properties})
    }
}

impl Serialize for Stream {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Stream", 7)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("namespace", &self.namespace)?;
        s.serialize_field("table", &self.table)?;
        s.serialize_field("fields", &self.fields)?;
        s.serialize_field("json_schema", &self.json_schema())?;
        s.serialize_field("supported_sync_modes", &self.supported_sync_modes)?;
        s.serialize_field(
            "source_defined_primary_key",
            &self.source_defined_primary_key,
        )?;
        s.end()
    }
}

/// The set of streams a store exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<Stream>,
}

impl Catalog {
    pub fn new(streams: Vec<Stream>) -> Self {
        Self { streams }
    }

    pub fn stream(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// A stream selected for a sync, with its extraction mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredStream {
    pub stream: String,
    pub sync_mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<String>,
}

impl ConfiguredStream {
    pub fn full_refresh(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            sync_mode: SyncMode::FullRefresh,
            cursor_field: None,
        }
    }

    pub fn incremental(stream: impl Into<String>, cursor_field: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            sync_mode: SyncMode::Incremental,
            cursor_field: Some(cursor_field.into()),
        }
    }
}

/// Streams to read, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    pub fn new(streams: Vec<ConfiguredStream>) -> Self {
        Self { streams }
    }
}
