use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlKeysetError;

/// Storage format for timestamps bound as query parameters.
///
/// Fixed width (always nine fractional digits, always UTC) so that text
/// comparisons in SQL agree with chronological order. That holds for years
/// 0000 through 9999 only: later years gain a `+` and extra digits and sort
/// before earlier ones, so keep stored timestamps inside that range.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp previously written with [`format_timestamp`].
///
/// Second-precision values (`YYYY-MM-DD HH:MM:SS`) are accepted as well.
///
/// # Errors
///
/// Returns the `chrono` parse error if the text matches neither form.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
}

/// Values that can be used as query parameters.
///
/// ```rust
/// use sql_keyset::prelude::*;
///
/// let params = vec![
///     RowValues::Text("abc".into()),
///     RowValues::Int(1),
///     RowValues::Timestamp(chrono::Utc::now()),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value, bound in [`TIMESTAMP_FORMAT`]
    Timestamp(DateTime<Utc>),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            return parse_timestamp(s).ok();
        }
        None
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<DateTime<Utc>> for RowValues {
    fn from(value: DateTime<Utc>) -> Self {
        RowValues::Timestamp(value)
    }
}

/// The SQL dialect a configuration targets.
///
/// Only `SQLite` is supported, so pool creation and the migration engine have a
/// single arm. The name matches the dialect string used in configuration files
/// (`sqlite3`); any other name fails to parse with `ConfigError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum Dialect {
    /// `SQLite` 3
    #[default]
    #[value(name = "sqlite3")]
    #[serde(rename = "sqlite3")]
    Sqlite3,
}

impl Dialect {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite3 => "sqlite3",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = SqlKeysetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite3),
            other => Err(SqlKeysetError::ConfigError(format!(
                "DB dialect not supported: {other}"
            ))),
        }
    }
}
