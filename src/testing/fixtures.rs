//! Tables shared by the engine tests.

use sync_core::{NumericText, RawValue};

use super::memory::MemoryTable;

pub fn numeric(s: &str) -> RawValue {
    RawValue::Numeric(NumericText::parse(s))
}

/// `id_and_name(id NUMERIC(20,10), name VARCHAR(200), power DOUBLE PRECISION)`
/// holding goku, vegeta and piccolo, with NaN and infinities.
pub fn id_and_name() -> MemoryTable {
    MemoryTable::new("public", "id_and_name")
        .column("id", "numeric")
        .column("name", "character varying")
        .column("power", "double precision")
        .row(vec![
            numeric("1.0000000000"),
            RawValue::text("goku"),
            RawValue::Float(f64::INFINITY),
        ])
        .row(vec![
            numeric("2.0000000000"),
            RawValue::text("vegeta"),
            RawValue::Float(9000.1),
        ])
        .row(vec![
            numeric("NaN"),
            RawValue::text("piccolo"),
            RawValue::Float(f64::NEG_INFINITY),
        ])
}

/// Two rows of multi-byte UTF-8 text, stored as raw bytes.
pub fn utf8_names() -> MemoryTable {
    MemoryTable::new("public", "utf8_names")
        .column("id", "integer")
        .column("name", "text")
        .primary_key(&["id"])
        .row(vec![
            RawValue::Int(1),
            RawValue::Text("\u{2013} someutfstring".as_bytes().to_vec()),
        ])
        .row(vec![
            RawValue::Int(2),
            RawValue::Text("\u{2215}".as_bytes().to_vec()),
        ])
}

/// A table mixing supported columns with ones that have no mapping.
pub fn mixed_types() -> MemoryTable {
    MemoryTable::new("public", "mixed_types")
        .column("id", "bigint")
        .column("location", "tsvector")
        .column("payload", "jsonb")
        .primary_key(&["id"])
        .row(vec![
            RawValue::Int(1),
            RawValue::text("'a':1"),
            RawValue::Json(serde_json::json!({"k": [1, 2]})),
        ])
}

/// A table whose only column has no mapping.
pub fn unsupported_only() -> MemoryTable {
    MemoryTable::new("public", "unsupported_only")
        .column("doc", "tsvector")
        .row(vec![RawValue::text("'x':1")])
}
