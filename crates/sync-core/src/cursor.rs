//! Orderable cursor values for incremental reads.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::values::Value;

/// A totally ordered cursor scalar.
///
/// Numbers compare by exact decimal value at any precision; strings compare byte-wise, which
/// orders the fixed-width ISO renderings of temporal kinds chronologically.
/// Numbers and strings are never compared with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CursorValue {
    Number(serde_json::Number),
    String(String),
}

impl<'de> Deserialize<'de> for CursorValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        CursorValue::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("cursor must be a number or a string, got {value}"))
        })
    }
}

impl CursorValue {
    /// Extract a cursor from a coerced value.
    ///
    /// Returns `None` for null (which is how NaN and infinities arrive) and
    /// for non-scalar values.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(CursorValue::Number(n.clone())),
            Value::String(s) => Some(CursorValue::String(s.clone())),
            _ => None,
        }
    }

    /// Compare two cursors of the same family.
    ///
    /// Returns `None` when one side is a number and the other a string.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (CursorValue::Number(a), CursorValue::Number(b)) => compare_numbers(a, b),
            (CursorValue::String(a), CursorValue::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            _ => None,
        }
    }

    /// Whether `self` is strictly greater than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Greater)
    }

    /// Textual form used to bind the cursor as a query parameter.
    pub fn as_bind_text(&self) -> String {
        match self {
            CursorValue::Number(n) => n.to_string(),
            CursorValue::String(s) => s.clone(),
        }
    }
}

impl PartialOrd for CursorValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorValue::Number(n) => write!(f, "{n}"),
            CursorValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for CursorValue {
    fn from(value: i64) -> Self {
        CursorValue::Number(value.into())
    }
}

impl From<&str> for CursorValue {
    fn from(value: &str) -> Self {
        CursorValue::String(value.to_string())
    }
}

/// A finite decimal as `0.digits × 10^exponent`.
///
/// `digits` has no leading or trailing zeros; it is empty for zero.
#[derive(Debug, PartialEq, Eq)]
struct DecimalParts {
    negative: bool,
    digits: Vec<u8>,
    exponent: i64,
}

impl DecimalParts {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let all = int_part.bytes().chain(frac_part.bytes());
        if !all.clone().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let leading = all.clone().take_while(|&b| b == b'0').count();
        let mut digits: Vec<u8> = all.skip(leading).collect();
        while digits.last() == Some(&b'0') {
            digits.pop();
        }
        if digits.is_empty() {
            return Some(Self {
                negative: false,
                digits,
                exponent: 0,
            });
        }
        let exponent = (int_part.len() as i64)
            .checked_sub(leading as i64)?
            .checked_add(exponent)?;
        Some(Self {
            negative,
            digits,
            exponent,
        })
    }

    fn signum(&self) -> i8 {
        match (self.digits.is_empty(), self.negative) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        }
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.exponent
            .cmp(&other.exponent)
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Option<Ordering> {
    let (a_text, b_text) = (a.to_string(), b.to_string());
    let a = DecimalParts::parse(&a_text)?;
    let b = DecimalParts::parse(&b_text)?;
    let ordering = match a.signum().cmp(&b.signum()) {
        Ordering::Equal => match a.signum() {
            0 => Ordering::Equal,
            1 => a.cmp_magnitude(&b),
            _ => b.cmp_magnitude(&a),
        },
        unequal => unequal,
    };
    Some(ordering)
}
