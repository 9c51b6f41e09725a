//! Exact decoding of PostgreSQL `NUMERIC` from its binary wire format.
//!
//! `rust_decimal` cannot carry NaN, infinities, or more than 28 significant
//! digits, so `NUMERIC` is decoded straight into its decimal text.
//!
//! Wire layout (big endian):
//!
//! ```text
//! ndigits: i16 | weight: i16 | sign: u16 | dscale: u16 | digits: [i16; ndigits]
//! ```
//!
//! Digits are base 10000; `weight` is the power of 10000 of the first digit.

use postgres_types::{FromSql, Type};
use std::error::Error;
use std::fmt::Write as _;
use sync_core::NumericText;
use thiserror::Error;

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_PINF: u16 = 0xD000;
const SIGN_NINF: u16 = 0xF000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumericDecodeError {
    #[error("NUMERIC value truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Invalid NUMERIC sign: 0x{0:04X}")]
    InvalidSign(u16),

    #[error("Invalid NUMERIC digit: {0}")]
    InvalidDigit(i16),
}

/// A `NUMERIC` cell decoded without loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(pub NumericText);

impl PgNumeric {
    pub fn into_inner(self) -> NumericText {
        self.0
    }

    /// Decode the binary representation.
    pub fn decode(raw: &[u8]) -> Result<Self, NumericDecodeError> {
        if raw.len() < 8 {
            return Err(NumericDecodeError::Truncated {
                expected: 8,
                actual: raw.len(),
            });
        }

        let ndigits = i16::from_be_bytes([raw[0], raw[1]]).max(0) as usize;
        let weight = i16::from_be_bytes([raw[2], raw[3]]) as i32;
        let sign = u16::from_be_bytes([raw[4], raw[5]]);
        let dscale = u16::from_be_bytes([raw[6], raw[7]]) as usize;

        match sign {
            SIGN_NAN => return Ok(PgNumeric(NumericText::NaN)),
            SIGN_PINF => return Ok(PgNumeric(NumericText::Infinity)),
            SIGN_NINF => return Ok(PgNumeric(NumericText::NegativeInfinity)),
            SIGN_POS | SIGN_NEG => {}
            other => return Err(NumericDecodeError::InvalidSign(other)),
        }

        let expected = 8 + ndigits * 2;
        if raw.len() < expected {
            return Err(NumericDecodeError::Truncated {
                expected,
                actual: raw.len(),
            });
        }

        let mut digits = Vec::with_capacity(ndigits);
        for chunk in raw[8..expected].chunks_exact(2) {
            let digit = i16::from_be_bytes([chunk[0], chunk[1]]);
            if !(0..10000).contains(&digit) {
                return Err(NumericDecodeError::InvalidDigit(digit));
            }
            digits.push(digit);
        }

        Ok(PgNumeric(NumericText::Finite(render(
            sign == SIGN_NEG,
            weight,
            dscale,
            &digits,
        ))))
    }
}

fn render(negative: bool, weight: i32, dscale: usize, digits: &[i16]) -> String {
    let digit_at = |index: i32| -> i16 {
        if index >= 0 && (index as usize) < digits.len() {
            digits[index as usize]
        } else {
            0
        }
    };

    let mut out = String::new();
    if negative && digits.iter().any(|d| *d != 0) {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for index in 0..=weight {
            let digit = digit_at(index);
            // Writing to a String cannot fail
            let _ = if index == 0 {
                write!(out, "{digit}")
            } else {
                write!(out, "{digit:04}")
            };
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut index = weight + 1;
        while fraction.len() < dscale {
            let _ = write!(fraction, "{:04}", digit_at(index));
            index += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    out
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(PgNumeric::decode(raw)?)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}
