//! Temporal cells that may hold `infinity` or `-infinity`.
//!
//! PostgreSQL encodes these as the extreme values of the underlying integer
//! (days for `DATE`, microseconds for `TIMESTAMP[TZ]`), which chrono cannot
//! represent. [`Finite`] reads them as absent so they coerce to `null`, like
//! the non-finite numerics.

use postgres_types::{FromSql, Type};
use std::error::Error;

/// A temporal value, or `None` for an infinite one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finite<T>(pub Option<T>);

impl<T> Finite<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

/// Whether `raw` is the binary encoding of `infinity` or `-infinity` for `ty`.
pub fn is_infinite(ty: &Type, raw: &[u8]) -> bool {
    match *ty {
        Type::DATE => <[u8; 4]>::try_from(raw)
            .map(i32::from_be_bytes)
            .is_ok_and(|days| days == i32::MAX || days == i32::MIN),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => <[u8; 8]>::try_from(raw)
            .map(i64::from_be_bytes)
            .is_ok_and(|micros| micros == i64::MAX || micros == i64::MIN),
        _ => false,
    }
}

impl<'a, T: FromSql<'a>> FromSql<'a> for Finite<T> {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if is_infinite(ty, raw) {
            return Ok(Finite(None));
        }
        T::from_sql(ty, raw).map(|value| Finite(Some(value)))
    }

    fn accepts(ty: &Type) -> bool {
        T::accepts(ty)
    }
}
