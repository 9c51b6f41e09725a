//! PostgreSQL schema column type resolution.
//!
//! Maps the type names reported by `information_schema.columns.data_type`
//! (and `udt_name` for arrays and user-defined types) onto
//! [`PrimitiveKind`].

use sync_core::PrimitiveKind;

/// Resolve a PostgreSQL column type name.
///
/// Array types resolve to [`PrimitiveKind::Array`] whatever their element
/// type, since they are read through `to_json`. Types that have a stable
/// textual rendering but no native mapping are read through a `::text`
/// cast. Anything else is [`PrimitiveKind::Unsupported`].
///
/// # Example
///
/// ```
/// use postgresql_types::resolve_native_type;
/// use sync_core::PrimitiveKind;
///
/// assert_eq!(resolve_native_type("bigint"), PrimitiveKind::Integer);
/// assert_eq!(resolve_native_type("_int4"), PrimitiveKind::Array);
/// assert_eq!(
///     resolve_native_type("tsvector"),
///     PrimitiveKind::Unsupported("tsvector".to_string())
/// );
/// ```
pub fn resolve_native_type(data_type: &str) -> PrimitiveKind {
    let normalized = data_type.trim().to_lowercase();

    match normalized.as_str() {
        // Numeric types
        "smallint" | "int2" | "integer" | "int" | "int4" | "bigint" | "int8" | "smallserial"
        | "serial" | "bigserial" | "oid" => PrimitiveKind::Integer,
        "real" | "float4" | "double precision" | "float8" => PrimitiveKind::Float,
        "numeric" | "decimal" => PrimitiveKind::Decimal,

        // Boolean
        "boolean" | "bool" => PrimitiveKind::Boolean,

        // String types
        "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "name"
        | "citext" => PrimitiveKind::Text,

        // Binary
        "bytea" => PrimitiveKind::Binary,

        // Date/Time types
        "date" => PrimitiveKind::Date,
        "time" | "time without time zone" => PrimitiveKind::Time,
        "timestamp" | "timestamp without time zone" => PrimitiveKind::Timestamp,
        "timestamptz" | "timestamp with time zone" => PrimitiveKind::TimestampTz,

        // JSON types
        "json" | "jsonb" => PrimitiveKind::Json,

        // Array types - information_schema reports "ARRAY", pg_type reports "_elem"
        "array" => PrimitiveKind::Array,
        s if s.starts_with('_') || s.ends_with("[]") => PrimitiveKind::Array,

        // Read through their text rendering
        "uuid" | "interval" | "time with time zone" | "timetz" | "inet" | "cidr" | "macaddr"
        | "macaddr8" | "money" | "xml" | "bit" | "bit varying" | "varbit" | "\"char\""
        | "point" | "line" | "lseg" | "box" | "path" | "polygon" | "circle" | "int4range"
        | "int8range" | "numrange" | "tsrange" | "tstzrange" | "daterange" | "pg_lsn" => {
            PrimitiveKind::TextCast
        }

        _ => PrimitiveKind::Unsupported(data_type.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgresql_int_types() {
        for t in ["smallint", "integer", "int4", "bigint", "int8", "serial"] {
            assert_eq!(resolve_native_type(t), PrimitiveKind::Integer, "{t}");
        }
    }

    #[test]
    fn test_postgresql_float_and_decimal_types() {
        assert_eq!(resolve_native_type("real"), PrimitiveKind::Float);
        assert_eq!(resolve_native_type("double precision"), PrimitiveKind::Float);
        assert_eq!(resolve_native_type("numeric"), PrimitiveKind::Decimal);
        assert_eq!(resolve_native_type("DECIMAL"), PrimitiveKind::Decimal);
    }

    #[test]
    fn test_postgresql_string_types() {
        for t in ["text", "varchar", "character varying", "character", "bpchar", "name"] {
            assert_eq!(resolve_native_type(t), PrimitiveKind::Text, "{t}");
        }
    }

    #[test]
    fn test_postgresql_datetime_types() {
        assert_eq!(resolve_native_type("date"), PrimitiveKind::Date);
        assert_eq!(resolve_native_type("time"), PrimitiveKind::Time);
        assert_eq!(
            resolve_native_type("timestamp without time zone"),
            PrimitiveKind::Timestamp
        );
        assert_eq!(
            resolve_native_type("timestamp with time zone"),
            PrimitiveKind::TimestampTz
        );
        assert_eq!(
            resolve_native_type("time with time zone"),
            PrimitiveKind::TextCast
        );
    }

    #[test]
    fn test_postgresql_json_and_binary_types() {
        assert_eq!(resolve_native_type("json"), PrimitiveKind::Json);
        assert_eq!(resolve_native_type("jsonb"), PrimitiveKind::Json);
        assert_eq!(resolve_native_type("bytea"), PrimitiveKind::Binary);
        assert_eq!(resolve_native_type("boolean"), PrimitiveKind::Boolean);
    }

    #[test]
    fn test_postgresql_array_types() {
        assert_eq!(resolve_native_type("ARRAY"), PrimitiveKind::Array);
        assert_eq!(resolve_native_type("_text"), PrimitiveKind::Array);
        assert_eq!(resolve_native_type("integer[]"), PrimitiveKind::Array);
    }

    #[test]
    fn test_postgresql_text_cast_types() {
        for t in ["uuid", "interval", "inet", "money", "xml", "point"] {
            assert_eq!(resolve_native_type(t), PrimitiveKind::TextCast, "{t}");
        }
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        assert_eq!(
            resolve_native_type(" USER-DEFINED "),
            PrimitiveKind::Unsupported("USER-DEFINED".to_string())
        );
    }
}
