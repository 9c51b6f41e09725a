//! Undecoded character data.
//!
//! `String: FromSql` validates UTF-8, which would bind decoding to the
//! server's encoding. [`RawText`] keeps the bytes so the engine can decode
//! them with the connector's declared encoding instead.

use postgres_types::{FromSql, Type};
use std::error::Error;

/// Raw bytes of a character column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(pub Vec<u8>);

impl RawText {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl<'a> FromSql<'a> for RawText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawText(raw.to_vec()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::CHAR
        ) || ty.name() == "citext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_invalid_utf8() {
        let raw = RawText::from_sql(&Type::TEXT, &[0xe2, 0x80]).unwrap();
        assert_eq!(raw.into_bytes(), vec![0xe2, 0x80]);
    }

    #[test]
    fn test_accepts_character_types() {
        assert!(<RawText as FromSql>::accepts(&Type::VARCHAR));
        assert!(<RawText as FromSql>::accepts(&Type::BPCHAR));
        assert!(!<RawText as FromSql>::accepts(&Type::INT4));
    }
}
