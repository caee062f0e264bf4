//! Row iteration helpers.
//!
//! Arguments are plain [`RowValues`]; each row is handed to a caller-supplied
//! mapping closure. Statements and row cursors live only inside the blocking
//! task, so they are released on every exit path.

use crate::error::SqlKeysetError;
use crate::pool::ConfigAndPool;
use crate::sqlite::Params;
use crate::types::RowValues;

pub(crate) fn fetch_one<T, F>(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[RowValues],
    map_row: F,
) -> Result<T, SqlKeysetError>
where
    F: FnOnce(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError>,
{
    let converted = Params::convert(params);
    let mut stmt = conn.prepare(query)?;
    let mut rows = stmt.query(&converted.as_refs()[..])?;
    match rows.next()? {
        Some(row) => map_row(row),
        None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
    }
}

pub(crate) fn fetch_many<T, F>(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[RowValues],
    mut map_row: F,
) -> Result<Vec<T>, SqlKeysetError>
where
    F: FnMut(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError>,
{
    let converted = Params::convert(params);
    let mut stmt = conn.prepare(query)?;
    let mut rows = stmt.query(&converted.as_refs()[..])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map_row(row)?);
    }
    Ok(out)
}

/// Run `query` and map its first row.
///
/// ```rust,no_run
/// # use sql_keyset::prelude::*;
/// # async fn demo(pool: &ConfigAndPool) -> Result<(), SqlKeysetError> {
/// let name: String = query_one(
///     pool,
///     "SELECT name FROM test WHERE id = ?1",
///     &[RowValues::from("a")],
///     |row| Ok(row.get(0)?),
/// )
/// .await?;
/// # let _ = name;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns `SqlKeysetError::SqliteError(rusqlite::Error::QueryReturnedNoRows)`
/// when nothing matched (see [`SqlKeysetError::is_no_rows`]), or whatever the
/// statement or `map_row` fails with.
pub async fn query_one<T, F>(
    pool: &ConfigAndPool,
    query: &str,
    params: &[RowValues],
    map_row: F,
) -> Result<T, SqlKeysetError>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError> + Send + 'static,
{
    let query = query.to_owned();
    let params = params.to_vec();
    pool.with_connection(move |conn| fetch_one(conn, &query, &params, map_row))
        .await
}

/// Run `query` and map every row, in order.
///
/// # Errors
/// Returns the first statement or mapping error; rows mapped before it are
/// discarded.
pub async fn query_many<T, F>(
    pool: &ConfigAndPool,
    query: &str,
    params: &[RowValues],
    map_row: F,
) -> Result<Vec<T>, SqlKeysetError>
where
    T: Send + 'static,
    F: FnMut(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError> + Send + 'static,
{
    let query = query.to_owned();
    let params = params.to_vec();
    pool.with_connection(move |conn| fetch_many(conn, &query, &params, map_row))
        .await
}
