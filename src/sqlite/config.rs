use std::future::Future;
use std::sync::Arc;

use bb8::{ManageConnection, Pool, PooledConnection};
use tokio::sync::Mutex;

use crate::error::SqlKeysetError;

/// Pragmas applied to every freshly opened connection.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

/// Shared handle to a rusqlite connection guarded by a mutex for async access.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Pooled connection checked out of a [`SqlitePool`].
pub type SqlitePooledConnection<'a> = PooledConnection<'a, SqliteManager>;

/// bb8 pool of `SQLite` connections.
pub type SqlitePool = Pool<SqliteManager>;

/// bb8 manager for rusqlite connections.
///
/// `db_path` is handed to rusqlite unchanged, so `file:` URIs work as well as
/// plain paths. Every connection gets its own handle; `:memory:` therefore gives
/// each pooled connection a separate database.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlKeysetError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let db_path = self.db_path.clone();
        async move {
            let conn = tokio::task::spawn_blocking(move || {
                let conn = rusqlite::Connection::open(&db_path)?;
                conn.execute_batch(CONNECTION_PRAGMAS)?;
                Ok::<_, SqlKeysetError>(conn)
            })
            .await
            .map_err(|e| {
                SqlKeysetError::ConnectionError(format!("sqlite connect join error: {e}"))
            })??;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            super::run_blocking(handle, |guard| {
                guard
                    .execute_batch("SELECT 1")
                    .map_err(SqlKeysetError::SqliteError)
            })
            .await
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
