//! PostgreSQL type mapping and wire decoding for sync-core types.
//!
//! # Modules
//!
//! - [`schema`] - `information_schema` type names → [`sync_core::PrimitiveKind`]
//! - [`numeric`] - Exact decoding of binary `NUMERIC`, including NaN and infinities
//! - [`text`] - Undecoded character data
//! - [`temporal`] - Dates and timestamps that may be infinite
//! - [`reverse`] - PostgreSQL row cell → [`sync_core::RawValue`]
//!
//! # Example
//!
//! ```
//! use postgresql_types::resolve_native_type;
//! use sync_core::PrimitiveKind;
//!
//! assert_eq!(resolve_native_type("numeric"), PrimitiveKind::Decimal);
//! assert_eq!(resolve_native_type("character varying"), PrimitiveKind::Text);
//! ```

pub mod numeric;
pub mod reverse;
pub mod schema;
pub mod temporal;
pub mod text;

pub use numeric::{NumericDecodeError, PgNumeric};
pub use reverse::{cell_to_raw, format_time, format_timestamp, format_timestamptz};
pub use schema::resolve_native_type;
pub use temporal::Finite;
pub use text::RawText;
