use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};

use crate::error::SqlKeysetError;
use crate::types::{RowValues, format_timestamp, parse_timestamp};

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(format_timestamp(dt)),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Unified `SQLite` parameter container.
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert row values into `SQLite` values.
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Params(params.iter().map(row_value_to_sqlite_value).collect())
    }

    /// Build a borrowed params slice suitable for rusqlite execution.
    #[must_use]
    pub fn as_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.0.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
    }
}

/// Read a timestamp column written by [`RowValues::Timestamp`].
///
/// # Errors
///
/// Returns `SqlKeysetError::SqliteError` if the column is missing, not text, or
/// not a timestamp in the storage format.
pub fn timestamp_at(row: &rusqlite::Row<'_>, idx: usize) -> Result<DateTime<Utc>, SqlKeysetError> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).map_err(|e| {
        SqlKeysetError::SqliteError(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(e),
        ))
    })
}
