//! Reverse conversion: PostgreSQL row cell → [`RawValue`].
//!
//! The column kind decides how the cell is read. Temporal values are
//! rendered here, at fixed width, so that their text orders the same way
//! the values do. `infinity` and `-infinity` dates and timestamps read as
//! null.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::Type;
use sync_core::{PrimitiveKind, RawValue, StoreError};
use tokio_postgres::Row;

use crate::numeric::PgNumeric;
use crate::temporal::Finite;
use crate::text::RawText;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.6f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Render a timestamp without time zone, e.g. `2024-01-02T03:04:05.000000`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a timestamp with time zone in UTC, e.g. `2024-01-02T03:04:05.000000Z`.
pub fn format_timestamptz(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMPTZ_FORMAT).to_string()
}

/// Render a time of day, e.g. `03:04:05.000000`.
pub fn format_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn conversion_error(row: &Row, index: usize, e: impl std::fmt::Display) -> StoreError {
    let column = row
        .columns()
        .get(index)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{index}"));
    StoreError::Conversion {
        column,
        message: e.to_string(),
    }
}

/// Read the cell at `index` as a raw value of `kind`.
///
/// Arrays are expected to have been selected through `to_json`, and
/// [`PrimitiveKind::TextCast`] columns through `::text`.
pub fn cell_to_raw(row: &Row, index: usize, kind: &PrimitiveKind) -> Result<RawValue, StoreError> {
    let pg_type = row
        .columns()
        .get(index)
        .map(|c| c.type_().clone())
        .ok_or_else(|| conversion_error(row, index, "column index out of range"))?;

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(index)
                .map_err(|e| conversion_error(row, index, e))?
        };
    }

    let raw = match kind {
        PrimitiveKind::Boolean => get!(bool).map(RawValue::Bool),

        PrimitiveKind::Integer => match pg_type {
            Type::INT2 => get!(i16).map(|i| RawValue::Int(i as i64)),
            Type::INT4 => get!(i32).map(|i| RawValue::Int(i as i64)),
            Type::OID => get!(u32).map(|i| RawValue::Int(i as i64)),
            _ => get!(i64).map(RawValue::Int),
        },

        PrimitiveKind::Float => match pg_type {
            Type::FLOAT4 => get!(f32).map(|f| RawValue::Float(f as f64)),
            _ => get!(f64).map(RawValue::Float),
        },

        PrimitiveKind::Decimal => get!(PgNumeric).map(|n| RawValue::Numeric(n.into_inner())),

        PrimitiveKind::Text | PrimitiveKind::TextCast => {
            get!(RawText).map(|t| RawValue::Text(t.into_bytes()))
        }

        PrimitiveKind::Date => get!(Finite<NaiveDate>)
            .and_then(Finite::into_inner)
            .map(|d| RawValue::text(d.format(DATE_FORMAT).to_string())),
        PrimitiveKind::Time => get!(NaiveTime).map(|t| RawValue::text(format_time(&t))),
        PrimitiveKind::Timestamp => get!(Finite<NaiveDateTime>)
            .and_then(Finite::into_inner)
            .map(|ts| RawValue::text(format_timestamp(&ts))),
        PrimitiveKind::TimestampTz => get!(Finite<DateTime<Utc>>)
            .and_then(Finite::into_inner)
            .map(|ts| RawValue::text(format_timestamptz(&ts))),

        PrimitiveKind::Binary => get!(Vec<u8>).map(RawValue::Bytes),

        PrimitiveKind::Json | PrimitiveKind::Array => get!(serde_json::Value).map(RawValue::Json),

        PrimitiveKind::Unsupported(name) => {
            return Err(conversion_error(
                row,
                index,
                format!("unsupported PostgreSQL type: {name}"),
            ))
        }
    };

    Ok(raw.unwrap_or(RawValue::Null))
}
