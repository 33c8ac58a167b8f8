//! Native client implementations
//!
//! This module contains concrete implementations of the native driver seam
//! for specific database libraries.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteClient;

/// Connection over the SQLite native client
#[cfg(feature = "sqlite")]
pub type SqliteConnection = crate::core::connection::Connection<SqliteClient>;
