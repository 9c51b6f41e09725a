//! In-memory backing store and fixtures for exercising the engine without
//! a database server.
//!
//! Column types are PostgreSQL type names resolved with
//! [`postgresql_types::resolve_native_type`], so fixtures read like the
//! tables they stand in for.

pub mod fixtures;
pub mod memory;

pub use memory::{FailureKind, MemoryConnection, MemoryProvider, MemoryStore, MemoryTable};
