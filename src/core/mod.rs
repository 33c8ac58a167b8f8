//! Core database abstraction types and traits
//!
//! This module provides the fundamental building blocks of the abstraction
//! layer: the error taxonomy, scalar values, the logical type registry, the
//! native driver seam, and the connection/statement/cursor surface.

pub mod connection;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod platform;
pub mod statement;
pub mod temporal;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use connection::Connection;
pub use cursor::{FetchMode, Fetched, ResultCursor};
pub use driver::{
    BindTag, Capability, ConnectionParams, DriverOption, ExecOutcome, NativeError, RawConnection,
    RawStatement, ResolvedParams, ResultMeta, ServerVersion,
};
pub use error::{Error, Result, GENERAL_SQLSTATE};
pub use platform::Platform;
pub use statement::{ParamCell, Rows, Statement};
pub use temporal::{DateTimeType, DateType, TimeType};
pub use types::{BindingKind, LogicalType, TypeRegistry};
pub use value::{Row, Value};
