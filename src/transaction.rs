//! Transaction executor.
//!
//! Operations run on the blocking pool against an open [`Tx`]. Any error, or a
//! panic, inside the operations rolls the whole transaction back; otherwise it
//! commits. Transactions begin `IMMEDIATE`, so the write lock is taken (or the
//! begin fails) before any operation runs.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::SqlKeysetError;
use crate::pool::ConfigAndPool;
use crate::query::{fetch_many, fetch_one};
use crate::sqlite::Params;
use crate::types::RowValues;

/// An open `SQLite` transaction handed to transactional operations.
///
/// Commit and rollback belong to [`run_in_transaction`]; operations only issue
/// statements.
pub struct Tx<'conn> {
    inner: rusqlite::Transaction<'conn>,
}

/// A boxed write operation for [`run_multiple_writes`].
pub type WriteOp = Box<dyn FnOnce(&Tx<'_>) -> Result<(), SqlKeysetError> + Send>;

impl Tx<'_> {
    /// The underlying connection, for statements the helpers here do not cover.
    #[must_use]
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.inner
    }

    /// Execute one statement and return the number of affected rows.
    ///
    /// # Errors
    /// Returns `SqlKeysetError` if preparing or executing the statement fails.
    pub fn execute(&self, query: &str, params: &[RowValues]) -> Result<usize, SqlKeysetError> {
        let converted = Params::convert(params);
        Ok(self.inner.execute(query, &converted.as_refs()[..])?)
    }

    /// Execute statements without parameters.
    ///
    /// # Errors
    /// Returns `SqlKeysetError` if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlKeysetError> {
        Ok(self.inner.execute_batch(sql)?)
    }

    /// Let `pre_write` adjust the arguments, execute, and check the row count.
    ///
    /// `pre_write` runs inside the transaction immediately before the statement,
    /// so values it stamps in (timestamps, generated ids) belong to this write.
    /// With `expected` set, any other number of affected rows is an error.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::NoRowsUpdated` on a row-count mismatch, or the
    /// driver error if execution fails.
    pub fn execute_expecting<P>(
        &self,
        pre_write: P,
        query: &str,
        mut params: Vec<RowValues>,
        expected: Option<usize>,
    ) -> Result<usize, SqlKeysetError>
    where
        P: FnOnce(&mut Vec<RowValues>),
    {
        pre_write(&mut params);
        let actual = self.execute(query, &params)?;
        match expected {
            Some(expected) if expected != actual => {
                Err(SqlKeysetError::NoRowsUpdated { expected, actual })
            }
            _ => Ok(actual),
        }
    }

    /// Map the first row of `query`; see [`crate::query::query_one`].
    ///
    /// # Errors
    /// Returns the driver's no-rows error when nothing matched, or whatever the
    /// statement or `map_row` fails with.
    pub fn query_one<T, F>(
        &self,
        query: &str,
        params: &[RowValues],
        map_row: F,
    ) -> Result<T, SqlKeysetError>
    where
        F: FnOnce(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError>,
    {
        fetch_one(&self.inner, query, params, map_row)
    }

    /// Map every row of `query`; see [`crate::query::query_many`].
    ///
    /// # Errors
    /// Returns the first statement or mapping error.
    pub fn query_many<T, F>(
        &self,
        query: &str,
        params: &[RowValues],
        map_row: F,
    ) -> Result<Vec<T>, SqlKeysetError>
    where
        F: FnMut(&rusqlite::Row<'_>) -> Result<T, SqlKeysetError>,
    {
        fetch_many(&self.inner, query, params, map_row)
    }

    fn rollback_logged(self, reason: &str) {
        if let Err(e) = self.inner.rollback() {
            tracing::error!(error = %e, reason, "transaction rollback failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn transact<F, R>(conn: &mut rusqlite::Connection, ops: F) -> Result<R, SqlKeysetError>
where
    F: FnOnce(&Tx<'_>) -> Result<R, SqlKeysetError>,
{
    let tx = Tx {
        inner: conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?,
    };
    match catch_unwind(AssertUnwindSafe(|| ops(&tx))) {
        Ok(Ok(value)) => {
            tx.inner.commit().map_err(|e| {
                tracing::error!(error = %e, "transaction commit failed");
                SqlKeysetError::from(e)
            })?;
            Ok(value)
        }
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "transaction operation failed, rolling back");
            tx.rollback_logged("operation failed");
            Err(e)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "transaction operation panicked, rolling back");
            tx.rollback_logged("operation panicked");
            Err(SqlKeysetError::OperationPanicked(message))
        }
    }
}

/// Run `ops` inside one transaction on a pooled connection.
///
/// If the transaction cannot begin, `ops` is never called. An error from `ops`
/// rolls back and is returned; a panic in `ops` is caught, logged, rolled back
/// and reported as `SqlKeysetError::OperationPanicked`. Otherwise the
/// transaction commits.
///
/// # Errors
/// Returns the checkout, begin, operation or commit error, whichever happens
/// first. Rollback failures are logged and never replace the error being returned.
pub async fn run_in_transaction<F, R>(pool: &ConfigAndPool, ops: F) -> Result<R, SqlKeysetError>
where
    F: FnOnce(&Tx<'_>) -> Result<R, SqlKeysetError> + Send + 'static,
    R: Send + 'static,
{
    pool.with_connection(move |conn| transact(conn, ops)).await
}

/// A write operation that expects exactly one affected row.
#[must_use]
pub fn single_write_op<P>(pre_write: P, query: impl Into<String>, params: Vec<RowValues>) -> WriteOp
where
    P: FnOnce(&mut Vec<RowValues>) + Send + 'static,
{
    let query = query.into();
    Box::new(move |tx: &Tx<'_>| -> Result<(), SqlKeysetError> {
        tx.execute_expecting(pre_write, &query, params, Some(1))?;
        Ok(())
    })
}

/// Execute one statement in its own transaction, requiring one affected row.
///
/// # Errors
/// Returns `SqlKeysetError::NoRowsUpdated { expected: 1, actual }` when the
/// statement touched some other number of rows; nothing is committed then.
pub async fn run_single_write<P>(
    pool: &ConfigAndPool,
    pre_write: P,
    query: &str,
    params: Vec<RowValues>,
) -> Result<(), SqlKeysetError>
where
    P: FnOnce(&mut Vec<RowValues>) + Send + 'static,
{
    run_in_transaction(pool, single_write_op(pre_write, query, params)).await
}

/// Run several write operations in one transaction.
///
/// `None` entries are skipped with a warning. The first failing operation stops
/// the rest and rolls back everything.
///
/// # Errors
/// Returns the first operation error, or the checkout/begin/commit error.
pub async fn run_multiple_writes(
    pool: &ConfigAndPool,
    ops: Vec<Option<WriteOp>>,
) -> Result<(), SqlKeysetError> {
    run_in_transaction(pool, move |tx| {
        for (index, op) in ops.into_iter().enumerate() {
            match op {
                Some(op) => op(tx)?,
                None => tracing::warn!(index, "skipping empty write operation"),
            }
        }
        Ok(())
    })
    .await
}
