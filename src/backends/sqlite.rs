//! SQLite native client
//!
//! Implements the native driver seam over `rusqlite`. The dbname parameter
//! is the database path; `:memory:` when absent. Host, port and socket are
//! resolved by the core but carry no meaning for this backend.
//!
//! Result sets are materialized client-side at execute time, which is what
//! the native layer of the classic drivers does as well; the core cursor
//! still shapes rows lazily on fetch.

use crate::core::driver::{
    BindTag, Capability, DriverOption, ExecOutcome, NativeError, RawConnection, RawStatement,
    ResolvedParams, ResultMeta, ServerVersion,
};
use crate::core::value::Value;
use std::collections::VecDeque;

/// Native error codes this backend reports for its own failures
const BACKEND_ERROR_CODE: i32 = 1;

impl From<rusqlite::Error> for NativeError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(failure, _) => failure.extended_code,
            _ => BACKEND_ERROR_CODE,
        };
        // SQLite reports no SQLSTATE; the core substitutes the general code.
        NativeError::new(err.to_string(), None, code)
    }
}

/// SQLite-backed native client session
#[derive(Debug)]
pub struct SqliteClient {
    conn: rusqlite::Connection,
}

impl RawConnection for SqliteClient {
    type Statement<'c>
        = SqliteStatement<'c>
    where
        Self: 'c;

    fn connect(params: &ResolvedParams) -> Result<Self, NativeError> {
        let path = params.dbname.as_deref().unwrap_or(":memory:");
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self { conn })
    }

    fn apply_option(&mut self, option: &DriverOption) -> Result<(), NativeError> {
        match option {
            DriverOption::ConnectTimeout(timeout) => {
                // Closest native equivalent: how long to wait on a locked
                // database file.
                self.conn.busy_timeout(*timeout)?;
                Ok(())
            }
            DriverOption::InitCommand(sql) => {
                self.conn.execute_batch(sql)?;
                Ok(())
            }
            other => Err(NativeError::unsupported(other.key())),
        }
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), NativeError> {
        // SQLite stores text as UTF-8 only.
        match charset {
            "utf8" | "utf-8" | "utf8mb4" => Ok(()),
            other => Err(NativeError::unsupported(&format!("charset '{other}'"))),
        }
    }

    fn exec(&self, sql: &str) -> Result<u64, NativeError> {
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() > 0 {
            // Affected-row semantics apply to commands only; drain the rows
            // and report 0 for a query.
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
            Ok(0)
        } else {
            Ok(stmt.raw_execute()? as u64)
        }
    }

    fn prepare(&self, sql: &str) -> Result<SqliteStatement<'_>, NativeError> {
        let stmt = self.conn.prepare(sql)?;
        Ok(SqliteStatement {
            stmt,
            rows: VecDeque::new(),
        })
    }

    fn escape(&self, input: &str) -> String {
        input.replace('\'', "''")
    }

    fn server_version(&self) -> ServerVersion {
        // SQLITE_VERSION_NUMBER packs as major * 1_000_000 + minor * 1_000 + patch.
        let packed = rusqlite::version_number() as u32;
        ServerVersion::new(packed / 1_000_000, (packed / 1_000) % 1_000, packed % 1_000)
    }

    fn supports(&self, _capability: Capability) -> bool {
        // This backend variant implements none of the optional operations.
        false
    }
}

/// SQLite prepared statement with a client-side row buffer
pub struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    rows: VecDeque<Vec<Value>>,
}

impl RawStatement for SqliteStatement<'_> {
    fn param_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn bind(&mut self, params: &[(BindTag, Value)]) -> Result<(), NativeError> {
        let expected = self.stmt.parameter_count();
        if params.len() != expected {
            return Err(NativeError::new(
                format!(
                    "parameter count mismatch: statement has {expected} placeholders, {} values bound",
                    params.len()
                ),
                None,
                BACKEND_ERROR_CODE,
            ));
        }

        for (offset, (tag, value)) in params.iter().enumerate() {
            let index = offset + 1;
            match (tag, value) {
                // NULL and binary data bind natively under either tag.
                (_, Value::Null) => self
                    .stmt
                    .raw_bind_parameter(index, rusqlite::types::Null)?,
                (_, Value::Bytes(bytes)) => {
                    self.stmt.raw_bind_parameter(index, bytes.as_slice())?
                }
                (BindTag::Int, other) => {
                    let number = other.as_long().ok_or_else(|| {
                        NativeError::new(
                            format!(
                                "cannot bind {} value as an integer parameter",
                                other.type_name()
                            ),
                            None,
                            BACKEND_ERROR_CODE,
                        )
                    })?;
                    self.stmt.raw_bind_parameter(index, number)?;
                }
                (BindTag::Text, other) => {
                    self.stmt.raw_bind_parameter(index, other.as_string())?;
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<ExecOutcome, NativeError> {
        self.rows.clear();

        let columns: Vec<String> = self
            .stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        if columns.is_empty() {
            let affected = self.stmt.raw_execute()? as u64;
            return Ok(ExecOutcome {
                affected,
                result: None,
            });
        }

        {
            let mut rows = self.stmt.raw_query();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    values.push(read_value(row, index)?);
                }
                self.rows.push_back(values);
            }
        }

        let num_rows = self.rows.len() as u64;
        Ok(ExecOutcome {
            // Affected-row semantics apply to commands; a result-producing
            // statement reports 0, never the connection's last DML count.
            affected: 0,
            result: Some(ResultMeta { columns, num_rows }),
        })
    }

    fn fetch_row(&mut self) -> Result<Option<Vec<Value>>, NativeError> {
        Ok(self.rows.pop_front())
    }

    fn free(&mut self) {
        self.rows.clear();
    }
}

/// Convert one SQLite column value to a [`Value`]
fn read_value(row: &rusqlite::Row<'_>, index: usize) -> Result<Value, NativeError> {
    let value = match row.get_ref(index)? {
        rusqlite::types::ValueRef::Null => Value::Null,
        rusqlite::types::ValueRef::Integer(v) => Value::Long(v),
        rusqlite::types::ValueRef::Real(v) => Value::Double(v),
        rusqlite::types::ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).to_string()),
        rusqlite::types::ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::driver::ConnectionParams;

    fn client() -> SqliteClient {
        let resolved = ConnectionParams::new().resolve().unwrap();
        SqliteClient::connect(&resolved).unwrap()
    }

    #[test]
    fn test_exec_reports_affected_for_commands_only() {
        let client = client();
        client
            .exec("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
            .unwrap();
        assert_eq!(client.exec("INSERT INTO t (v) VALUES ('a'), ('b')").unwrap(), 2);
        assert_eq!(client.exec("SELECT * FROM t").unwrap(), 0);
    }

    #[test]
    fn test_unsupported_option_is_rejected_natively() {
        let mut client = client();
        let err = client
            .apply_option(&DriverOption::LocalInfile(true))
            .unwrap_err();
        assert!(err.to_string().contains("local_infile"));
    }

    #[test]
    fn test_charset_utf8_accepted() {
        let mut client = client();
        assert!(client.set_charset("utf8").is_ok());
        assert!(client.set_charset("latin1").is_err());
    }

    #[test]
    fn test_server_version_decodes_packing() {
        let version = client().server_version();
        assert!(version.major >= 3);
    }

    #[test]
    fn test_query_outcome_reports_zero_affected() {
        let client = client();
        client.exec("CREATE TABLE t (v)").unwrap();
        client.exec("INSERT INTO t VALUES (1), (2)").unwrap();

        let mut stmt = client.prepare("SELECT v FROM t").unwrap();
        let outcome = stmt.execute().unwrap();
        assert_eq!(outcome.affected, 0);
        assert_eq!(outcome.result.unwrap().num_rows, 2);
    }

    #[test]
    fn test_bind_rejects_count_mismatch() {
        let client = client();
        client.exec("CREATE TABLE t (a, b)").unwrap();
        let mut stmt = client.prepare("INSERT INTO t VALUES (?, ?)").unwrap();
        let err = stmt.bind(&[(BindTag::Text, Value::Int(1))]).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }
}
