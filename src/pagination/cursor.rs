use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SqlKeysetError;

use super::page::Paginateable;

const SEPARATOR: char = '|';

/// Position of one row in a `(createdAt, id)` ordered result set.
///
/// The string form is an opaque token: URL-safe base64 of
/// `"{id}|{seconds}.{nanos}"`, the timestamp as Unix seconds plus nine digits of
/// nanoseconds. That covers every `DateTime<Utc>`, including years past 9999
/// and before 1970. Parsing splits on the last separator, so ids may contain
/// `|`; an empty id is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

impl Cursor {
    #[must_use]
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }

    /// Cursor pointing at `row`.
    #[must_use]
    pub fn from_paginateable<P: Paginateable + ?Sized>(row: &P) -> Self {
        Self::new(row.id(), row.created_at())
    }

    /// Decode a token produced by [`Cursor`]'s `Display` impl.
    ///
    /// # Errors
    ///
    /// Returns `SqlKeysetError::CursorFormat` if the token is not base64, does not
    /// hold an `id|timestamp` pair, or has an unreadable timestamp.
    pub fn parse(token: &str) -> Result<Self, SqlKeysetError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| SqlKeysetError::CursorFormat(format!("not base64: {e}")))?;
        let decoded = String::from_utf8(bytes)
            .map_err(|e| SqlKeysetError::CursorFormat(format!("not utf-8: {e}")))?;
        let (id, ts) = decoded
            .rsplit_once(SEPARATOR)
            .ok_or_else(|| SqlKeysetError::CursorFormat("missing separator".into()))?;
        Ok(Self::new(id, parse_epoch_nanos(ts)?))
    }
}

fn parse_epoch_nanos(ts: &str) -> Result<DateTime<Utc>, SqlKeysetError> {
    let bad = |why: &str| SqlKeysetError::CursorFormat(format!("bad timestamp {ts:?}: {why}"));
    let (secs, nanos) = ts.split_once('.').ok_or_else(|| bad("missing fraction"))?;
    if nanos.len() != 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad("fraction must be nine digits"));
    }
    let secs: i64 = secs.parse().map_err(|_| bad("seconds are not an integer"))?;
    let nanos: u32 = nanos.parse().map_err(|_| bad("nanoseconds are not an integer"))?;
    DateTime::from_timestamp(secs, nanos).ok_or_else(|| bad("out of range"))
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = format!(
            "{}{SEPARATOR}{}.{:09}",
            self.id,
            self.timestamp.timestamp(),
            self.timestamp.timestamp_subsec_nanos()
        );
        f.write_str(&URL_SAFE_NO_PAD.encode(raw))
    }
}

impl FromStr for Cursor {
    type Err = SqlKeysetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Cursor::parse(&token).map_err(serde::de::Error::custom)
    }
}
