//! Type universe shared by every backing store.
//!
//! Each store maps its native column type names onto [`PrimitiveKind`], a
//! closed enum with an explicit [`PrimitiveKind::Unsupported`] fallback that
//! carries the original type name for diagnostics. The output-facing
//! [`FieldType`] is then a total function of the kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output type of a field, as advertised in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// JSON schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical primitive a native column type resolves to.
///
/// # Design Principles
///
/// 1. **Closed**: every supported native type lands on exactly one variant
/// 2. **Explicit fallback**: unknown types become `Unsupported` with their name
/// 3. **Orderability is a property of the kind**, not of the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// true / false
    Boolean,

    /// Signed integers of any width
    Integer,

    /// IEEE 754 floating point; may carry NaN and infinities
    Float,

    /// Exact decimal of arbitrary precision; may carry NaN and infinities
    Decimal,

    /// Character data decoded with the connector's declared encoding
    Text,

    /// Calendar date, rendered `YYYY-MM-DD`
    Date,

    /// Timestamp without time zone, rendered with fixed microsecond width
    Timestamp,

    /// Timestamp with time zone, normalized to UTC
    TimestampTz,

    /// Time of day, rendered `HH:MM:SS[.ffffff]`
    Time,

    /// Raw bytes, rendered as base64
    Binary,

    /// JSON document
    Json,

    /// Array of any element type, rendered as a JSON array
    Array,

    /// Types read through their textual rendering (uuid, interval, inet, ...)
    TextCast,

    /// No mapping exists; carries the native type name
    Unsupported(String),
}

impl PrimitiveKind {
    /// Output field type for this kind, or `None` when unsupported.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            PrimitiveKind::Boolean => Some(FieldType::Boolean),
            PrimitiveKind::Integer | PrimitiveKind::Float | PrimitiveKind::Decimal => {
                Some(FieldType::Number)
            }
            PrimitiveKind::Text
            | PrimitiveKind::Date
            | PrimitiveKind::Timestamp
            | PrimitiveKind::TimestampTz
            | PrimitiveKind::Time
            | PrimitiveKind::Binary
            | PrimitiveKind::TextCast => Some(FieldType::String),
            PrimitiveKind::Json => Some(FieldType::Object),
            PrimitiveKind::Array => Some(FieldType::Array),
            PrimitiveKind::Unsupported(_) => None,
        }
    }

    /// Whether values of this kind can serve as an incremental cursor.
    pub fn is_orderable(&self) -> bool {
        self.is_numeric() || self.is_ordered_text()
    }

    /// Numeric kinds compare by value.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Integer | PrimitiveKind::Float | PrimitiveKind::Decimal
        )
    }

    /// Text-rendered kinds whose rendering orders by byte comparison.
    pub fn is_ordered_text(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Text
                | PrimitiveKind::Date
                | PrimitiveKind::Timestamp
                | PrimitiveKind::TimestampTz
                | PrimitiveKind::Time
        )
    }

    /// Whether the kind can produce NaN or infinite values.
    pub fn has_special_values(&self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Decimal)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PrimitiveKind::Unsupported(_))
    }
}

/// Column metadata as reported by store introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Native type name as the store reports it (e.g. "numeric", "character varying")
    pub native_type: String,
    /// Whether the column permits NULL
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            nullable,
        }
    }
}

/// A typed field of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    /// Primitive kind the field was mapped from; used for planning, never serialized.
    #[serde(skip)]
    pub kind: Option<PrimitiveKind>,
}

impl Field {
    /// Build a field from a supported kind.
    ///
    /// Returns `None` for [`PrimitiveKind::Unsupported`].
    pub fn from_kind(name: impl Into<String>, kind: PrimitiveKind, nullable: bool) -> Option<Self> {
        let field_type = kind.field_type()?;
        Some(Self {
            name: name.into(),
            field_type,
            nullable,
            kind: Some(kind),
        })
    }

    /// Whether this field can be used as an incremental cursor.
    pub fn is_orderable(&self) -> bool {
        self.kind.as_ref().is_some_and(PrimitiveKind::is_orderable)
    }
}

/// Extraction mode of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Re-read the whole stream on every sync
    FullRefresh,
    /// Read only rows with a cursor beyond the last checkpoint
    Incremental,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::FullRefresh => "full_refresh",
            SyncMode::Incremental => "incremental",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
