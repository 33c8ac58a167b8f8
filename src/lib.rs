//! # Rust DBAL
//!
//! A database abstraction layer providing a uniform connection/statement
//! interface over a native database client library, together with a
//! pluggable scalar-type conversion subsystem.
//!
//! ## Features
//!
//! - **Logical type registry**: named converters between application values
//!   and backend representations, registered once and shared by all callers
//! - **Tag-aware parameter binding**: a slot-indexed parameter table with
//!   per-slot binding kinds, value snapshots and late-read parameter cells
//! - **Deferred result materialization**: a lazy cursor with associative,
//!   positional, combined, object and single-column fetch shapes
//! - **Structured failures**: every native error carries a message, an
//!   SQLSTATE-style code and the native numeric code
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_dbal::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // The SQLite backend treats dbname as the database path and
//!     // defaults to an in-memory database.
//!     let conn = SqliteConnection::open(&ConnectionParams::new())?;
//!
//!     conn.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//!     let mut stmt = conn.prepare("INSERT INTO users (name) VALUES (?)")?;
//!     stmt.bind_value(1, "Alice", BindingKind::Text)?;
//!     stmt.execute()?;
//!
//!     let mut stmt = conn.query("SELECT id, name FROM users")?;
//!     while let Some(row) = stmt.fetch(FetchMode::Both)? {
//!         let row = row.as_row().expect("both shape");
//!         println!("{:?} {:?}", row.get("id"), row.get("name"));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Converting values
//!
//! ```rust
//! use rust_dbal::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let registry = TypeRegistry::with_builtins()?;
//!     let platform = Platform::default();
//!
//!     let time = registry.get("time")?;
//!     let domain = time.to_domain_value(&Value::Text("01:23:34".into()), &platform)?;
//!     // Time-only values are anchored to 1970-01-01.
//!     assert_eq!(domain.as_string(), "1970-01-01 01:23:34");
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency model
//!
//! Every call blocks until the native layer responds. A connection and its
//! statements serve one thread at a time; the type registry is safe for
//! concurrent reads once startup registration is complete.

/// Core abstraction types and traits
pub mod core;

/// Native client implementations
pub mod backends;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{
        BindingKind, Capability, Connection, ConnectionParams, Error, FetchMode, Fetched,
        LogicalType, ParamCell, Platform, Result, Row, Rows, Statement, TypeRegistry, Value,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::{SqliteClient, SqliteConnection};
}

// Re-export at root level for convenience
pub use crate::core::{
    BindingKind, Capability, Connection, ConnectionParams, Error, FetchMode, Fetched, LogicalType,
    ParamCell, Platform, Result, Row, Rows, Statement, TypeRegistry, Value,
};

#[cfg(feature = "sqlite")]
pub use backends::{SqliteClient, SqliteConnection};
