//! Error types for the database abstraction layer
//!
//! Every native-layer failure is wrapped with a human message, an
//! SQLSTATE-style classification code and the native numeric error code.
//! When the native layer reports no SQLSTATE, [`GENERAL_SQLSTATE`] is used.

use super::driver::{Capability, NativeError};
use super::value::Value;

/// SQLSTATE used when the native layer does not report one.
pub const GENERAL_SQLSTATE: &str = "HY000";

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for database operations
///
/// No error is silently swallowed or downgraded: unimplemented driver
/// operations fail with [`Error::Unsupported`] rather than returning
/// defaults, and conversion failures always name the offending value and
/// the target type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening the native connection failed
    #[error("connection failed: {message} (SQLSTATE {sqlstate}, code {code})")]
    Connection {
        message: String,
        sqlstate: String,
        code: i32,
    },

    /// A driver option key is not in the allow-list, or its value is not usable
    #[error("Unsupported option '{option}' with value '{value}'")]
    UnsupportedOption { option: String, value: String },

    /// The native layer rejected a supported driver option
    #[error("Failed to set option '{option}': {message} (SQLSTATE {sqlstate}, code {code})")]
    OptionRejected {
        option: String,
        message: String,
        sqlstate: String,
        code: i32,
    },

    /// The native layer rejected a statement at prepare or direct-execution time
    #[error("query failed: {message} (SQLSTATE {sqlstate}, code {code})")]
    Query {
        message: String,
        sqlstate: String,
        code: i32,
    },

    /// The native layer rejected a parameter bind
    #[error("parameter binding failed: {message} (SQLSTATE {sqlstate}, code {code})")]
    Bind {
        message: String,
        sqlstate: String,
        code: i32,
    },

    /// The native layer rejected the execution of a prepared statement
    #[error("execution failed: {message} (SQLSTATE {sqlstate}, code {code})")]
    Execution {
        message: String,
        sqlstate: String,
        code: i32,
    },

    /// A fetch was attempted without a live result cursor
    #[error("no result set available")]
    NoResult,

    /// The fetch mode is not valid for the requested fetch shape
    #[error("unknown fetch mode '{mode}'")]
    UnknownFetchMode { mode: String },

    /// A value could not be converted by a logical type
    #[error("could not convert {value} to type '{target}'")]
    Conversion { value: String, target: String },

    /// A logical type name was registered twice
    #[error("type '{name}' is already registered")]
    DuplicateType { name: String },

    /// A logical type name was looked up before being registered
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    /// A binding-kind name did not resolve through the fixed type-kind map
    #[error("unknown binding type '{name}'")]
    UnknownBindingType { name: String },

    /// A parameter slot number was outside the prepared placeholder range
    #[error("parameter slot {slot} is outside 1..={count}")]
    SlotRange { slot: usize, count: usize },

    /// A column index was outside the result's column list
    #[error("column index {index} is outside the {count}-column result")]
    ColumnOutOfRange { index: usize, count: usize },

    /// The driver does not implement this optional capability
    #[error("operation not supported by this driver: {capability}")]
    Unsupported { capability: Capability },
}

impl Error {
    /// Wrap a native connect failure
    pub fn connection(native: NativeError) -> Self {
        let (message, sqlstate, code) = native.into_parts();
        Error::Connection {
            message,
            sqlstate,
            code,
        }
    }

    /// Create an unsupported-option error for an unknown key or unusable value
    pub fn unsupported_option(option: impl Into<String>, value: impl Into<String>) -> Self {
        Error::UnsupportedOption {
            option: option.into(),
            value: value.into(),
        }
    }

    /// Wrap a native rejection of an allow-listed option
    pub fn option_rejected(option: impl Into<String>, native: NativeError) -> Self {
        let (message, sqlstate, code) = native.into_parts();
        Error::OptionRejected {
            option: option.into(),
            message,
            sqlstate,
            code,
        }
    }

    /// Wrap a native prepare/direct-execution failure
    pub fn query(native: NativeError) -> Self {
        let (message, sqlstate, code) = native.into_parts();
        Error::Query {
            message,
            sqlstate,
            code,
        }
    }

    /// Wrap a native parameter-bind failure
    pub fn bind(native: NativeError) -> Self {
        let (message, sqlstate, code) = native.into_parts();
        Error::Bind {
            message,
            sqlstate,
            code,
        }
    }

    /// Wrap a native statement-execution failure
    pub fn execution(native: NativeError) -> Self {
        let (message, sqlstate, code) = native.into_parts();
        Error::Execution {
            message,
            sqlstate,
            code,
        }
    }

    /// Create a conversion error naming the offending value and target type
    pub fn conversion(value: &Value, target: &str) -> Self {
        Error::Conversion {
            value: format!("{} value '{}'", value.type_name(), value.as_string()),
            target: target.to_string(),
        }
    }

    /// Create a duplicate-type registration error
    pub fn duplicate_type(name: impl Into<String>) -> Self {
        Error::DuplicateType { name: name.into() }
    }

    /// Create an unknown-type lookup error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Error::UnknownType { name: name.into() }
    }

    /// Create an unknown-binding-type error
    pub fn unknown_binding_type(name: impl Into<String>) -> Self {
        Error::UnknownBindingType { name: name.into() }
    }

    /// Create a slot-range error for a 1-based slot table of `count` entries
    pub fn slot_range(slot: usize, count: usize) -> Self {
        Error::SlotRange { slot, count }
    }

    /// Create an unsupported-capability error
    pub fn unsupported(capability: Capability) -> Self {
        Error::Unsupported { capability }
    }

    /// The SQLSTATE carried by this error, if it wraps a native failure
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Connection { sqlstate, .. }
            | Error::OptionRejected { sqlstate, .. }
            | Error::Query { sqlstate, .. }
            | Error::Bind { sqlstate, .. }
            | Error::Execution { sqlstate, .. } => Some(sqlstate),
            _ => None,
        }
    }

    /// The native numeric error code, if this error wraps a native failure
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Error::Connection { code, .. }
            | Error::OptionRejected { code, .. }
            | Error::Query { code, .. }
            | Error::Bind { code, .. }
            | Error::Execution { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_wrapping_defaults_sqlstate() {
        let err = Error::connection(NativeError::new("refused", None, 2002));
        assert_eq!(err.sqlstate(), Some(GENERAL_SQLSTATE));
        assert_eq!(err.native_code(), Some(2002));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_native_wrapping_keeps_reported_sqlstate() {
        let native = NativeError::new("syntax", Some("42000".to_string()), 1064);
        let err = Error::query(native);
        assert_eq!(err.sqlstate(), Some("42000"));
        assert_eq!(err.native_code(), Some(1064));
    }

    #[test]
    fn test_unsupported_option_display() {
        let err = Error::unsupported_option("compress", "yes");
        assert_eq!(
            err.to_string(),
            "Unsupported option 'compress' with value 'yes'"
        );
    }

    #[test]
    fn test_conversion_names_value_and_target() {
        let err = Error::conversion(&Value::Int(0), "time");
        let text = err.to_string();
        assert!(text.contains("int value '0'"));
        assert!(text.contains("'time'"));
    }

    #[test]
    fn test_slot_range_display() {
        let err = Error::slot_range(3, 2);
        assert_eq!(err.to_string(), "parameter slot 3 is outside 1..=2");
        assert!(err.sqlstate().is_none());
    }
}
