use crate::error::SqlKeysetError;

use super::config::SharedSqliteConnection;

/// Run `func` against the locked connection on tokio's blocking pool.
///
/// # Errors
/// Returns whatever `func` returns, or `ExecutionError` if the blocking task
/// could not be joined.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlKeysetError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlKeysetError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlKeysetError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
