//! Connection over a native client session
//!
//! A connection exclusively owns one native session handle and hands out
//! prepared statements that borrow it. One connection serves one thread at a
//! time; callers needing concurrency open more connections.

use super::driver::{Capability, ConnectionParams, RawConnection, ServerVersion};
use super::error::{Error, Result};
use super::statement::Statement;
use tracing::{debug, trace};

/// A connection to one database, generic over the native client
#[derive(Debug)]
pub struct Connection<C: RawConnection> {
    raw: C,
}

impl<C: RawConnection> Connection<C> {
    /// Open a connection from connection parameters
    ///
    /// Resolution order for port and socket defaults lives in
    /// [`ConnectionParams::resolve`]. Option keys outside the allow-list fail
    /// before the native layer is touched; allow-listed options the native
    /// layer rejects fail with the native error attached. A charset that
    /// cannot be applied fails the open; a half-configured session is worse
    /// than no session.
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let resolved = params.resolve()?;
        debug!(
            host = resolved.host.as_deref().unwrap_or(""),
            port = resolved.port,
            dbname = resolved.dbname.as_deref().unwrap_or(""),
            "opening connection"
        );

        let mut raw = C::connect(&resolved).map_err(Error::connection)?;

        for option in &resolved.options {
            trace!(option = option.key(), "applying driver option");
            raw.apply_option(option)
                .map_err(|native| Error::option_rejected(option.key(), native))?;
        }

        if let Some(charset) = &resolved.charset {
            raw.set_charset(charset).map_err(Error::connection)?;
        }

        Ok(Self { raw })
    }

    /// Prepare a statement
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_, C>> {
        trace!(sql, "preparing statement");
        let raw = self.raw.prepare(sql).map_err(Error::query)?;
        Ok(Statement::new(raw))
    }

    /// Prepare and immediately execute a statement
    pub fn query(&self, sql: &str) -> Result<Statement<'_, C>> {
        let mut statement = self.prepare(sql)?;
        statement.execute()?;
        Ok(statement)
    }

    /// Execute a non-prepared statement and return the affected-row count
    ///
    /// Affected-row semantics apply to commands; a query reports 0.
    pub fn exec(&self, sql: &str) -> Result<u64> {
        trace!(sql, "executing statement");
        self.raw.exec(sql).map_err(Error::query)
    }

    /// Return `input` as an escaped single-quoted literal
    ///
    /// No type awareness: callers validate value shape before quoting.
    pub fn quote(&self, input: &str) -> String {
        format!("'{}'", self.raw.escape(input))
    }

    /// The backend server version
    pub fn server_version(&self) -> ServerVersion {
        self.raw.server_version()
    }

    /// Whether reading the server version requires issuing a query
    ///
    /// Constant `false`: the native layer exposes the version on the handle.
    pub fn requires_query_for_server_version(&self) -> bool {
        false
    }

    /// Whether this driver implements an optional capability
    ///
    /// Callers branch on this rather than probing operations for failure.
    pub fn supports(&self, capability: Capability) -> bool {
        self.raw.supports(capability)
    }

    /// Begin a transaction
    ///
    /// Fails with [`Error::Unsupported`] unless the driver advertises
    /// [`Capability::Transactions`]; advertising drivers route to the native
    /// layer.
    pub fn begin_transaction(&self) -> Result<()> {
        self.capability_gate(Capability::Transactions)?;
        self.raw.begin().map_err(Error::query)
    }

    /// Commit the current transaction; see [`begin_transaction`](Self::begin_transaction)
    pub fn commit(&self) -> Result<()> {
        self.capability_gate(Capability::Transactions)?;
        self.raw.commit().map_err(Error::query)
    }

    /// Roll back the current transaction; see [`begin_transaction`](Self::begin_transaction)
    pub fn rollback(&self) -> Result<()> {
        self.capability_gate(Capability::Transactions)?;
        self.raw.rollback().map_err(Error::query)
    }

    /// Identifier of the last inserted row
    ///
    /// Gated on [`Capability::LastInsertId`].
    pub fn last_insert_id(&self) -> Result<u64> {
        self.capability_gate(Capability::LastInsertId)?;
        self.raw.last_insert_id().map_err(Error::query)
    }

    /// Liveness check of the native session
    ///
    /// Gated on [`Capability::Ping`]; a failed check reports as a connection
    /// error.
    pub fn ping(&self) -> Result<()> {
        self.capability_gate(Capability::Ping)?;
        self.raw.ping().map_err(Error::connection)
    }

    fn capability_gate(&self, capability: Capability) -> Result<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(Error::unsupported(capability))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::driver::{
        BindTag, DriverOption, ExecOutcome, NativeError, RawStatement, ResolvedParams,
    };
    use crate::core::value::Value;
    use std::cell::Cell;

    struct MockStatement;

    impl RawStatement for MockStatement {
        fn param_count(&self) -> usize {
            0
        }

        fn bind(&mut self, _params: &[(BindTag, Value)]) -> std::result::Result<(), NativeError> {
            Ok(())
        }

        fn execute(&mut self) -> std::result::Result<ExecOutcome, NativeError> {
            Ok(ExecOutcome {
                affected: 0,
                result: None,
            })
        }

        fn fetch_row(&mut self) -> std::result::Result<Option<Vec<Value>>, NativeError> {
            Ok(None)
        }

        fn free(&mut self) {}
    }

    /// Driver advertising transactions only; tracks whether one is open.
    struct TxClient {
        in_tx: Cell<bool>,
    }

    impl RawConnection for TxClient {
        type Statement<'c>
            = MockStatement
        where
            Self: 'c;

        fn connect(_params: &ResolvedParams) -> std::result::Result<Self, NativeError> {
            Ok(Self {
                in_tx: Cell::new(false),
            })
        }

        fn apply_option(&mut self, _option: &DriverOption) -> std::result::Result<(), NativeError> {
            Ok(())
        }

        fn set_charset(&mut self, _charset: &str) -> std::result::Result<(), NativeError> {
            Ok(())
        }

        fn exec(&self, _sql: &str) -> std::result::Result<u64, NativeError> {
            Ok(0)
        }

        fn prepare(&self, _sql: &str) -> std::result::Result<MockStatement, NativeError> {
            Ok(MockStatement)
        }

        fn escape(&self, input: &str) -> String {
            input.to_string()
        }

        fn server_version(&self) -> ServerVersion {
            ServerVersion::new(1, 0, 0)
        }

        fn supports(&self, capability: Capability) -> bool {
            capability == Capability::Transactions
        }

        fn begin(&self) -> std::result::Result<(), NativeError> {
            self.in_tx.set(true);
            Ok(())
        }

        fn commit(&self) -> std::result::Result<(), NativeError> {
            self.in_tx.set(false);
            Ok(())
        }

        fn rollback(&self) -> std::result::Result<(), NativeError> {
            self.in_tx.set(false);
            Ok(())
        }
    }

    #[test]
    fn test_advertised_capability_routes_to_the_driver() {
        let conn = Connection::<TxClient>::open(&ConnectionParams::new()).unwrap();
        assert!(conn.supports(Capability::Transactions));

        conn.begin_transaction().unwrap();
        assert!(conn.raw.in_tx.get());
        conn.commit().unwrap();
        assert!(!conn.raw.in_tx.get());

        conn.begin_transaction().unwrap();
        conn.rollback().unwrap();
        assert!(!conn.raw.in_tx.get());
    }

    #[test]
    fn test_unadvertised_capability_fails_without_touching_the_driver() {
        let conn = Connection::<TxClient>::open(&ConnectionParams::new()).unwrap();
        assert!(matches!(
            conn.ping().unwrap_err(),
            Error::Unsupported {
                capability: Capability::Ping
            }
        ));
        assert!(matches!(
            conn.last_insert_id().unwrap_err(),
            Error::Unsupported { .. }
        ));
    }
}
