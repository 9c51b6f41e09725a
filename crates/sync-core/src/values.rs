//! Value representations and the coercion from store values to output values.
//!
//! A store hands the engine [`RawValue`]s; [`coerce`] turns them into
//! output [`Value`]s according to the column's [`PrimitiveKind`]:
//!
//! - NaN and ±Infinity (float or decimal) become `null`, everywhere
//! - SQL NULL becomes `null` regardless of kind
//! - text is decoded from raw bytes with the declared [`SourceEncoding`]
//! - decimals keep every digit (serde_json `arbitrary_precision`)

use base64::Engine as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

use crate::types::PrimitiveKind;

/// Output value of a single field.
pub type Value = serde_json::Value;

/// Errors that can occur while coercing a raw store value.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The column type has no mapping
    #[error("Unsupported native type: {0}")]
    UnsupportedType(String),

    /// Bytes are not valid in the declared source encoding
    #[error("Invalid {encoding} text: {message}")]
    InvalidText { encoding: SourceEncoding, message: String },

    /// A numeric literal could not be parsed
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Text does not hold a JSON document
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The raw value does not fit the column kind
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

/// Character encoding the connector declares for text bytes.
///
/// The engine always decodes with this encoding and never with the store's
/// session or server setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    /// Strict UTF-8
    #[default]
    #[serde(alias = "utf-8", alias = "UTF8", alias = "UTF-8")]
    Utf8,
    /// ISO-8859-1, one byte per code point
    #[serde(alias = "latin-1", alias = "LATIN1", alias = "iso-8859-1")]
    Latin1,
}

impl SourceEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf8",
            SourceEncoding::Latin1 => "latin1",
        }
    }

    /// Decode raw bytes into a string.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, ConversionError> {
        match self {
            SourceEncoding::Utf8 => {
                String::from_utf8(bytes).map_err(|e| ConversionError::InvalidText {
                    encoding: *self,
                    message: e.to_string(),
                })
            }
            SourceEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decimal value as delivered by the store, including the special values
/// an exact numeric type may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericText {
    /// Finite decimal literal (e.g. "-12.3400")
    Finite(String),
    NaN,
    Infinity,
    NegativeInfinity,
}

impl NumericText {
    /// Parse the textual rendering stores use for numerics.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "NaN" | "nan" | "NAN" => NumericText::NaN,
            "Infinity" | "+Infinity" | "inf" | "+inf" => NumericText::Infinity,
            "-Infinity" | "-inf" => NumericText::NegativeInfinity,
            other => NumericText::Finite(other.to_string()),
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, NumericText::Finite(_))
    }
}

/// Value as read from the store, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric
    Numeric(NumericText),
    /// Undecoded character data (or the textual rendering of any kind)
    Text(Vec<u8>),
    /// Binary data
    Bytes(Vec<u8>),
    /// Already-structured JSON document
    Json(serde_json::Value),
}

impl RawValue {
    /// Convenience constructor for UTF-8 text cells.
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into().into_bytes())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    fn describe(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::Numeric(_) => "numeric",
            RawValue::Text(_) => "text",
            RawValue::Bytes(_) => "bytes",
            RawValue::Json(_) => "json",
        }
    }
}

/// Coerce a raw store value into its output value.
///
/// The coercion is deterministic: the same raw value always yields the same
/// output, and every non-representable number yields `null`.
pub fn coerce(
    kind: &PrimitiveKind,
    raw: RawValue,
    encoding: SourceEncoding,
) -> Result<Value, ConversionError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match (kind, raw) {
        (PrimitiveKind::Unsupported(name), _) => Err(ConversionError::UnsupportedType(name.clone())),

        (_, RawValue::Bool(b)) => Ok(Value::Bool(b)),
        (_, RawValue::Int(i)) => Ok(Value::Number(i.into())),
        (_, RawValue::Float(f)) => Ok(float_to_value(f)),
        (_, RawValue::Numeric(n)) => numeric_to_value(n),
        (_, RawValue::Json(v)) => Ok(v),
        (_, RawValue::Bytes(b)) => Ok(Value::String(
            base64::engine::general_purpose::STANDARD.encode(b),
        )),

        // Text renderings are decoded first, then interpreted per kind
        (kind, RawValue::Text(bytes)) => {
            let text = encoding.decode(bytes)?;
            text_to_value(kind, text)
        }

        (kind, raw) => Err(ConversionError::TypeMismatch {
            expected: format!("{kind:?}"),
            actual: raw.describe().to_string(),
        }),
    }
}

fn text_to_value(kind: &PrimitiveKind, text: String) -> Result<Value, ConversionError> {
    match kind {
        PrimitiveKind::Integer | PrimitiveKind::Float | PrimitiveKind::Decimal => {
            numeric_to_value(NumericText::parse(&text))
        }
        PrimitiveKind::Boolean => match text.as_str() {
            "t" | "true" | "TRUE" | "1" => Ok(Value::Bool(true)),
            "f" | "false" | "FALSE" | "0" => Ok(Value::Bool(false)),
            other => Err(ConversionError::TypeMismatch {
                expected: "boolean".to_string(),
                actual: other.to_string(),
            }),
        },
        PrimitiveKind::Json | PrimitiveKind::Array => Ok(serde_json::from_str(&text)?),
        _ => Ok(Value::String(text)),
    }
}

fn float_to_value(f: f64) -> Value {
    // NaN and infinities have no JSON literal
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn numeric_to_value(n: NumericText) -> Result<Value, ConversionError> {
    match n {
        NumericText::Finite(s) => {
            let normalized = normalize_decimal(&s);
            serde_json::Number::from_str(&normalized)
                .map(Value::Number)
                .map_err(|_| ConversionError::InvalidNumber(s))
        }
        NumericText::NaN | NumericText::Infinity | NumericText::NegativeInfinity => Ok(Value::Null),
    }
}

/// Normalize a decimal literal without losing digits.
///
/// Leading zeros of the integer part and trailing zeros of the fraction are
/// trimmed, keeping one fractional digit: `"0012.3400"` → `"12.34"`,
/// `"1.0000000000"` → `"1.0"`. Exponent notation is left untouched.
pub fn normalize_decimal(s: &str) -> String {
    let s = s.trim();
    if s.contains(['e', 'E']) {
        return s.to_string();
    }

    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let int_trimmed = int_part.trim_start_matches('0');
    let int_part = if int_trimmed.is_empty() { "0" } else { int_trimmed };

    match frac_part {
        None => format!("{sign}{int_part}"),
        Some(frac) => {
            let frac_trimmed = frac.trim_end_matches('0');
            let frac_part = if frac_trimmed.is_empty() { "0" } else { frac_trimmed };
            format!("{sign}{int_part}.{frac_part}")
        }
    }
}

/// A row of coerced values, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a field value; order of insertion is the column order.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert into a JSON object (key order is not preserved).
    pub fn into_json(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utf8(kind: PrimitiveKind, raw: RawValue) -> Value {
        coerce(&kind, raw, SourceEncoding::Utf8).unwrap()
    }

    #[test]
    fn test_special_floats_coerce_to_null() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(utf8(PrimitiveKind::Float, RawValue::Float(f)), Value::Null);
        }
        assert_eq!(utf8(PrimitiveKind::Float, RawValue::Float(9000.1)), json!(9000.1));
    }

    #[test]
    fn test_special_numerics_coerce_to_null() {
        for n in [
            NumericText::NaN,
            NumericText::Infinity,
            NumericText::NegativeInfinity,
        ] {
            assert_eq!(utf8(PrimitiveKind::Decimal, RawValue::Numeric(n)), Value::Null);
        }
    }

    #[test]
    fn test_special_values_in_text_rendering() {
        assert_eq!(utf8(PrimitiveKind::Decimal, RawValue::text("NaN")), Value::Null);
        assert_eq!(utf8(PrimitiveKind::Float, RawValue::text("-Infinity")), Value::Null);
    }

    #[test]
    fn test_null_coerces_to_null_for_every_kind() {
        for kind in [
            PrimitiveKind::Integer,
            PrimitiveKind::Text,
            PrimitiveKind::Boolean,
            PrimitiveKind::Json,
            PrimitiveKind::Unsupported("weird".to_string()),
        ] {
            assert_eq!(utf8(kind, RawValue::Null), Value::Null);
        }
    }

    #[test]
    fn test_decimal_keeps_precision() {
        let v = utf8(
            PrimitiveKind::Decimal,
            RawValue::Numeric(NumericText::Finite(
                "1234567890.1234567890123456789".to_string(),
            )),
        );
        assert_eq!(v.to_string(), "1234567890.1234567890123456789");
    }

    #[test]
    fn test_decimal_scale_is_normalized() {
        let v = utf8(
            PrimitiveKind::Decimal,
            RawValue::Numeric(NumericText::Finite("1.0000000000".to_string())),
        );
        assert_eq!(v.to_string(), "1.0");
        assert_eq!(v, json!(1.0));
    }

    #[test]
    fn test_normalize_decimal() {
        assert_eq!(normalize_decimal("0012.3400"), "12.34");
        assert_eq!(normalize_decimal("-0.500"), "-0.5");
        assert_eq!(normalize_decimal("000"), "0");
        assert_eq!(normalize_decimal("42"), "42");
        assert_eq!(normalize_decimal("+7.10"), "7.1");
        assert_eq!(normalize_decimal("1.5e10"), "1.5e10");
    }

    #[test]
    fn test_multibyte_text_decodes_as_utf8() {
        let raw = RawValue::Text("\u{2013} someutfstring".as_bytes().to_vec());
        assert_eq!(utf8(PrimitiveKind::Text, raw), json!("\u{2013} someutfstring"));
        assert_eq!(utf8(PrimitiveKind::Text, RawValue::text("\u{2215}")), json!("\u{2215}"));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let result = coerce(
            &PrimitiveKind::Text,
            RawValue::Text(vec![0xe2, 0x80]),
            SourceEncoding::Utf8,
        );
        assert!(matches!(result, Err(ConversionError::InvalidText { .. })));
    }

    #[test]
    fn test_latin1_decoding() {
        let v = coerce(
            &PrimitiveKind::Text,
            RawValue::Text(vec![0x63, 0x61, 0x66, 0xe9]),
            SourceEncoding::Latin1,
        )
        .unwrap();
        assert_eq!(v, json!("caf\u{e9}"));
    }

    #[test]
    fn test_bytes_are_base64() {
        assert_eq!(
            utf8(PrimitiveKind::Binary, RawValue::Bytes(b"hello".to_vec())),
            json!("aGVsbG8=")
        );
    }

    #[test]
    fn test_json_text_is_parsed() {
        assert_eq!(
            utf8(PrimitiveKind::Array, RawValue::text("[1,2,3]")),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn test_unsupported_kind_is_an_error() {
        let result = coerce(
            &PrimitiveKind::Unsupported("tsvector".to_string()),
            RawValue::text("'a' 'b'"),
            SourceEncoding::Utf8,
        );
        assert!(matches!(result, Err(ConversionError::UnsupportedType(t)) if t == "tsvector"));
    }

    #[test]
    fn test_encoding_serde_aliases() {
        let enc: SourceEncoding = serde_json::from_str("\"UTF-8\"").unwrap();
        assert_eq!(enc, SourceEncoding::Utf8);
        let enc: SourceEncoding = serde_json::from_str("\"latin1\"").unwrap();
        assert_eq!(enc, SourceEncoding::Latin1);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let mut row = Row::new();
        row.push("name", json!("goku"));
        row.push("id", json!(1));
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"name":"goku","id":1}"#);
        assert_eq!(row.get("id"), Some(&json!(1)));
        assert_eq!(row.get("missing"), None);
    }
}
