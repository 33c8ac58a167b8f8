//! Result cursor and fetch shapes
//!
//! A cursor is a lazy, one-shot view over the rows produced by the most
//! recent execute of a statement. It is owned by that statement and becomes
//! invalid when the statement is re-executed or its cursor is closed.

use super::error::{Error, Result};
use super::value::{Row, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Requested shape of fetched rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Column-name to value map
    Assoc,
    /// Positional value list
    Indexed,
    /// A [`Row`] answering both by-name and by-index lookups
    Both,
    /// One JSON object per row
    Object,
    /// A single column, extracted by position (`fetch_all` only)
    Column(usize),
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Assoc => write!(f, "assoc"),
            FetchMode::Indexed => write!(f, "indexed"),
            FetchMode::Both => write!(f, "both"),
            FetchMode::Object => write!(f, "object"),
            FetchMode::Column(index) => write!(f, "column({index})"),
        }
    }
}

/// One fetched row in the requested shape
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Column-name to value map
    Assoc(HashMap<String, Value>),
    /// Positional value list
    Indexed(Vec<Value>),
    /// Combined row
    Both(Row),
    /// JSON object
    Object(serde_json::Value),
    /// Single extracted column value
    Column(Value),
}

impl Fetched {
    /// The associative map, if this row was fetched in assoc shape
    pub fn as_assoc(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Fetched::Assoc(map) => Some(map),
            _ => None,
        }
    }

    /// The value list, if this row was fetched in indexed shape
    pub fn as_indexed(&self) -> Option<&[Value]> {
        match self {
            Fetched::Indexed(values) => Some(values),
            _ => None,
        }
    }

    /// The combined row, if fetched in both shape
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Fetched::Both(row) => Some(row),
            _ => None,
        }
    }

    /// The single column value, if fetched in column shape
    pub fn as_column(&self) -> Option<&Value> {
        match self {
            Fetched::Column(value) => Some(value),
            _ => None,
        }
    }
}

/// Lazy view over the rows of the most recent execute
///
/// The cursor holds the result shape; row data stays in the native layer
/// until fetched.
#[derive(Debug, Clone)]
pub struct ResultCursor {
    columns: Arc<[String]>,
    num_rows: u64,
}

impl ResultCursor {
    /// Create a cursor over a column list with a native row count
    pub(crate) fn new(columns: Vec<String>, num_rows: u64) -> Self {
        Self {
            columns: Arc::from(columns),
            num_rows,
        }
    }

    /// Number of rows the native layer reports for this result
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    /// Column names of this result, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Shape one positional row into the requested fetch shape
    ///
    /// `FetchMode::Column` is only meaningful for whole-result extraction
    /// and is rejected here.
    pub(crate) fn shape(&self, values: Vec<Value>, mode: FetchMode) -> Result<Fetched> {
        match mode {
            FetchMode::Assoc => Ok(Fetched::Assoc(
                self.columns
                    .iter()
                    .cloned()
                    .zip(values)
                    .collect(),
            )),
            FetchMode::Indexed => Ok(Fetched::Indexed(values)),
            FetchMode::Both => Ok(Fetched::Both(Row::new(Arc::clone(&self.columns), values))),
            FetchMode::Object => {
                let mut object = serde_json::Map::with_capacity(values.len());
                for (column, value) in self.columns.iter().zip(&values) {
                    object.insert(column.clone(), value.to_json());
                }
                Ok(Fetched::Object(serde_json::Value::Object(object)))
            }
            FetchMode::Column(_) => Err(Error::UnknownFetchMode {
                mode: mode.to_string(),
            }),
        }
    }

    /// Extract one column from a positional row
    pub(crate) fn extract_column(&self, values: Vec<Value>, index: usize) -> Result<Value> {
        let count = values.len();
        values
            .into_iter()
            .nth(index)
            .ok_or(Error::ColumnOutOfRange { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor() -> ResultCursor {
        ResultCursor::new(vec!["id".to_string(), "name".to_string()], 1)
    }

    fn row() -> Vec<Value> {
        vec![Value::Long(7), Value::Text("alice".to_string())]
    }

    #[test]
    fn test_shape_assoc() {
        let fetched = cursor().shape(row(), FetchMode::Assoc).unwrap();
        let map = fetched.as_assoc().unwrap();
        assert_eq!(map.get("id"), Some(&Value::Long(7)));
        assert_eq!(map.get("name"), Some(&Value::Text("alice".to_string())));
    }

    #[test]
    fn test_shape_indexed() {
        let fetched = cursor().shape(row(), FetchMode::Indexed).unwrap();
        assert_eq!(fetched.as_indexed().unwrap(), row().as_slice());
    }

    #[test]
    fn test_shape_both() {
        let fetched = cursor().shape(row(), FetchMode::Both).unwrap();
        let row = fetched.as_row().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Long(7)));
        assert_eq!(row.get_index(1), Some(&Value::Text("alice".to_string())));
    }

    #[test]
    fn test_shape_object() {
        let fetched = cursor().shape(row(), FetchMode::Object).unwrap();
        match fetched {
            Fetched::Object(json) => {
                assert_eq!(json["id"], serde_json::json!(7));
                assert_eq!(json["name"], serde_json::json!("alice"));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_rejects_column_mode() {
        let err = cursor().shape(row(), FetchMode::Column(0)).unwrap_err();
        assert!(matches!(err, Error::UnknownFetchMode { .. }));
        assert!(err.to_string().contains("column(0)"));
    }

    #[test]
    fn test_extract_column_range() {
        assert_eq!(
            cursor().extract_column(row(), 1).unwrap(),
            Value::Text("alice".to_string())
        );
        let err = cursor().extract_column(row(), 5).unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfRange { index: 5, count: 2 }));
    }
}
