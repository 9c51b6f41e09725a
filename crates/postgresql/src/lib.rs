//! PostgreSQL backing store for source-sync.
//!
//! Implements [`sync_core::ConnectionProvider`] and
//! [`sync_core::SourceConnection`] on top of `tokio-postgres`:
//! schema introspection through `information_schema`, SQL rendering of
//! query plans, and lazily streamed rows.

mod client;
mod config;
mod connection;
mod discovery;
pub mod query;

pub use client::PostgresProvider;
pub use config::PostgresConfig;
pub use connection::PostgresConnection;
pub use query::{render_query, RenderedQuery};
