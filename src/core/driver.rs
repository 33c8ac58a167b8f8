//! Native driver seam
//!
//! The wire protocol to the backend is an external collaborator. This module
//! defines the opaque capability surface the core consumes (connect, prepare,
//! execute, fetch) together with the connection parameter model and the
//! allow-listed driver options.

use super::error::{Error, Result, GENERAL_SQLSTATE};
use super::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no explicit port is given
const DEFAULT_PORT_ENV: &str = "MYSQL_TCP_PORT";

/// Environment variable consulted when no explicit socket path is given
const DEFAULT_SOCKET_ENV: &str = "MYSQL_UNIX_PORT";

/// Hardcoded port fallback when neither parameter nor environment names one
const FALLBACK_PORT: u16 = 3306;

/// Connection parameters, built in the builder style
///
/// ```
/// use rust_dbal::core::driver::ConnectionParams;
///
/// let params = ConnectionParams::new()
///     .host("db.internal")
///     .dbname("app")
///     .username("app")
///     .password("secret")
///     .charset("utf8mb4")
///     .option("connect_timeout", "10");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    host: Option<String>,
    port: Option<u16>,
    unix_socket: Option<String>,
    dbname: Option<String>,
    username: Option<String>,
    password: Option<String>,
    charset: Option<String>,
    options: HashMap<String, String>,
}

impl ConnectionParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the unix socket path
    pub fn unix_socket<S: Into<String>>(mut self, path: S) -> Self {
        self.unix_socket = Some(path.into());
        self
    }

    /// Set the database name
    pub fn dbname<S: Into<String>>(mut self, dbname: S) -> Self {
        self.dbname = Some(dbname.into());
        self
    }

    /// Set the username
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the connection charset
    pub fn charset<S: Into<String>>(mut self, charset: S) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Add a driver option; keys are validated against the allow-list at open
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Resolve defaults and validate options into the form drivers consume
    ///
    /// Port resolution order: explicit parameter, then the runtime default
    /// from the environment, then the hardcoded fallback. The socket path
    /// resolves the same way, without a hardcoded fallback.
    pub fn resolve(&self) -> Result<ResolvedParams> {
        let port = match self.port {
            Some(port) => port,
            None => std::env::var(DEFAULT_PORT_ENV)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(FALLBACK_PORT),
        };

        let unix_socket = self
            .unix_socket
            .clone()
            .or_else(|| std::env::var(DEFAULT_SOCKET_ENV).ok());

        let mut options = Vec::with_capacity(self.options.len());
        for (key, value) in &self.options {
            options.push(DriverOption::from_entry(key, value)?);
        }
        // Map iteration order is arbitrary; apply options deterministically.
        options.sort_by_key(|option| option.key());

        Ok(ResolvedParams {
            host: self.host.clone(),
            port,
            unix_socket,
            dbname: self.dbname.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            charset: self.charset.clone(),
            options,
        })
    }
}

/// Connection parameters after default resolution and option validation
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub host: Option<String>,
    pub port: u16,
    pub unix_socket: Option<String>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    pub options: Vec<DriverOption>,
}

/// Allow-listed driver options
///
/// Any key outside this set fails with [`Error::UnsupportedOption`] before
/// the native layer is touched; a listed option the native layer rejects
/// fails with [`Error::OptionRejected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOption {
    /// Connect timeout in seconds
    ConnectTimeout(Duration),
    /// Toggle for server-side LOCAL INFILE handling
    LocalInfile(bool),
    /// Statement executed by the driver right after connecting
    InitCommand(String),
    /// Client configuration file to read defaults from
    ReadDefaultFile(PathBuf),
    /// Group within the default file
    ReadDefaultGroup(String),
    /// RSA public key file for password exchange, where the native layer
    /// supports it
    ServerPublicKey(PathBuf),
}

impl DriverOption {
    /// Validate one option map entry against the allow-list
    pub fn from_entry(key: &str, value: &str) -> Result<Self> {
        match key {
            "connect_timeout" => value
                .parse::<u64>()
                .map(|secs| DriverOption::ConnectTimeout(Duration::from_secs(secs)))
                .map_err(|_| Error::unsupported_option(key, value)),
            "local_infile" => match value {
                "1" | "true" | "on" => Ok(DriverOption::LocalInfile(true)),
                "0" | "false" | "off" => Ok(DriverOption::LocalInfile(false)),
                _ => Err(Error::unsupported_option(key, value)),
            },
            "init_command" => Ok(DriverOption::InitCommand(value.to_string())),
            "read_default_file" => Ok(DriverOption::ReadDefaultFile(PathBuf::from(value))),
            "read_default_group" => Ok(DriverOption::ReadDefaultGroup(value.to_string())),
            "server_public_key" => Ok(DriverOption::ServerPublicKey(PathBuf::from(value))),
            _ => Err(Error::unsupported_option(key, value)),
        }
    }

    /// The canonical option key
    pub fn key(&self) -> &'static str {
        match self {
            DriverOption::ConnectTimeout(_) => "connect_timeout",
            DriverOption::LocalInfile(_) => "local_infile",
            DriverOption::InitCommand(_) => "init_command",
            DriverOption::ReadDefaultFile(_) => "read_default_file",
            DriverOption::ReadDefaultGroup(_) => "read_default_group",
            DriverOption::ServerPublicKey(_) => "server_public_key",
        }
    }
}

/// Optional driver operations, discoverable before calling them
///
/// Callers branch on [`supports`](crate::core::connection::Connection::supports)
/// instead of catching a catch-all failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// begin/commit/rollback
    Transactions,
    /// Identifier of the last inserted row
    LastInsertId,
    /// Liveness check of an open connection
    Ping,
    /// Structured error introspection on the native handle
    ErrorIntrospection,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Transactions => "transactions",
            Capability::LastInsertId => "last-insert-id",
            Capability::Ping => "ping",
            Capability::ErrorIntrospection => "error-introspection",
        };
        write!(f, "{name}")
    }
}

/// The tag the native layer accepts alongside a bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTag {
    /// Bind the textual rendering (the default)
    Text,
    /// Bind as a native integer
    Int,
}

/// Error report from the native layer
///
/// Drivers fill in what the backend gave them; the core wraps this per
/// context (connect, bind, execute, ...) and substitutes the general
/// SQLSTATE when none was reported.
#[derive(Debug, Clone)]
pub struct NativeError {
    message: String,
    sqlstate: Option<String>,
    code: i32,
}

impl NativeError {
    /// Create a native error report
    pub fn new(message: impl Into<String>, sqlstate: Option<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            sqlstate,
            code,
        }
    }

    /// Report for an operation the backend has no native support for
    pub fn unsupported(what: &str) -> Self {
        Self::new(format!("not supported by this backend: {what}"), None, 0)
    }

    /// Decompose into (message, sqlstate-or-default, code)
    pub fn into_parts(self) -> (String, String, i32) {
        let sqlstate = self
            .sqlstate
            .unwrap_or_else(|| GENERAL_SQLSTATE.to_string());
        (self.message, sqlstate, self.code)
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for NativeError {}

/// Server version, decoded from the backend's packed integer form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    /// Create a version triple
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Decode the classic `major * 10000 + minor * 100 + patch` packing
    pub fn from_packed(packed: u32) -> Self {
        let major = packed / 10_000;
        let minor = (packed - major * 10_000) / 100;
        let patch = packed - major * 10_000 - minor * 100;
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Outcome of a native statement execution
///
/// `result` is present exactly when the statement produced a column set,
/// distinguishing a command (DML) from a query that happened to match no
/// rows.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Rows changed by a command; 0 for queries
    pub affected: u64,
    /// Result-set shape, when the statement was a query
    pub result: Option<ResultMeta>,
}

/// Shape of a produced result set
#[derive(Debug, Clone)]
pub struct ResultMeta {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Number of rows the native layer reports
    pub num_rows: u64,
}

/// Native client session capability
///
/// One implementation per backend. A session and its statements are not safe
/// for concurrent use from multiple threads; callers serialize access.
pub trait RawConnection: Sized {
    /// Native prepared statement handle, tied to the session lifetime
    type Statement<'c>: RawStatement
    where
        Self: 'c;

    /// Open a session from resolved parameters
    fn connect(params: &ResolvedParams) -> std::result::Result<Self, NativeError>;

    /// Apply one allow-listed option; reject options the backend cannot honor
    fn apply_option(&mut self, option: &DriverOption) -> std::result::Result<(), NativeError>;

    /// Apply the connection charset
    fn set_charset(&mut self, charset: &str) -> std::result::Result<(), NativeError>;

    /// Execute a non-prepared statement, returning the affected-row count
    fn exec(&self, sql: &str) -> std::result::Result<u64, NativeError>;

    /// Prepare a statement
    fn prepare(&self, sql: &str) -> std::result::Result<Self::Statement<'_>, NativeError>;

    /// Escape a string for embedding in a single-quoted literal
    fn escape(&self, input: &str) -> String;

    /// The backend server version
    fn server_version(&self) -> ServerVersion;

    /// Whether this backend variant implements an optional capability
    fn supports(&self, capability: Capability) -> bool;

    /// Begin a transaction; only called when [`supports`](Self::supports)
    /// advertises [`Capability::Transactions`]
    fn begin(&self) -> std::result::Result<(), NativeError> {
        Err(NativeError::unsupported("transactions"))
    }

    /// Commit the current transaction
    fn commit(&self) -> std::result::Result<(), NativeError> {
        Err(NativeError::unsupported("transactions"))
    }

    /// Roll back the current transaction
    fn rollback(&self) -> std::result::Result<(), NativeError> {
        Err(NativeError::unsupported("transactions"))
    }

    /// Identifier of the last inserted row; only called when
    /// [`Capability::LastInsertId`] is advertised
    fn last_insert_id(&self) -> std::result::Result<u64, NativeError> {
        Err(NativeError::unsupported("last-insert-id"))
    }

    /// Liveness check; only called when [`Capability::Ping`] is advertised
    fn ping(&self) -> std::result::Result<(), NativeError> {
        Err(NativeError::unsupported("ping"))
    }
}

/// Native prepared-statement capability
pub trait RawStatement {
    /// Number of placeholders in the prepared text
    fn param_count(&self) -> usize;

    /// Bind all parameters, in placeholder order
    ///
    /// Must reject a parameter list whose length differs from
    /// [`param_count`](Self::param_count).
    fn bind(&mut self, params: &[(BindTag, Value)]) -> std::result::Result<(), NativeError>;

    /// Execute with the currently bound parameters
    fn execute(&mut self) -> std::result::Result<ExecOutcome, NativeError>;

    /// Pull the next row of the current result, positionally
    fn fetch_row(&mut self) -> std::result::Result<Option<Vec<Value>>, NativeError>;

    /// Release the native result resources
    fn free(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_resolution_chain() {
        // Explicit beats everything.
        let resolved = ConnectionParams::new().port(3307).resolve().unwrap();
        assert_eq!(resolved.port, 3307);

        // Environment beats the fallback; fallback applies otherwise. Both
        // cases live in one test because they mutate process environment.
        std::env::remove_var(DEFAULT_PORT_ENV);
        let resolved = ConnectionParams::new().resolve().unwrap();
        assert_eq!(resolved.port, FALLBACK_PORT);

        std::env::set_var(DEFAULT_PORT_ENV, "13306");
        let resolved = ConnectionParams::new().resolve().unwrap();
        assert_eq!(resolved.port, 13306);
        std::env::remove_var(DEFAULT_PORT_ENV);
    }

    #[test]
    fn test_socket_resolution_prefers_explicit() {
        let resolved = ConnectionParams::new()
            .unix_socket("/tmp/db.sock")
            .resolve()
            .unwrap();
        assert_eq!(resolved.unix_socket.as_deref(), Some("/tmp/db.sock"));
    }

    #[test]
    fn test_option_allow_list() {
        let ok = DriverOption::from_entry("connect_timeout", "10").unwrap();
        assert_eq!(ok, DriverOption::ConnectTimeout(Duration::from_secs(10)));

        let ok = DriverOption::from_entry("local_infile", "off").unwrap();
        assert_eq!(ok, DriverOption::LocalInfile(false));

        let err = DriverOption::from_entry("compress", "1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOption { .. }));

        // A listed key with an unusable value is equally unsupported.
        let err = DriverOption::from_entry("connect_timeout", "soon").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOption { .. }));
    }

    #[test]
    fn test_resolve_rejects_unknown_option() {
        let err = ConnectionParams::new()
            .option("compress", "1")
            .resolve()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported option 'compress' with value '1'"
        );
    }

    #[test]
    fn test_server_version_from_packed() {
        let version = ServerVersion::from_packed(80034);
        assert_eq!(version, ServerVersion::new(8, 0, 34));
        assert_eq!(version.to_string(), "8.0.34");

        assert_eq!(ServerVersion::from_packed(50742).to_string(), "5.7.42");
    }

    #[test]
    fn test_native_error_parts() {
        let (message, sqlstate, code) = NativeError::new("boom", None, 42).into_parts();
        assert_eq!(message, "boom");
        assert_eq!(sqlstate, GENERAL_SQLSTATE);
        assert_eq!(code, 42);
    }
}
