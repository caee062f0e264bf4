use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlKeysetError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// A pagination token could not be decoded into an id and a timestamp.
    #[error("Cursor format error: {0}")]
    CursorFormat(String),

    /// A write ran without a driver error but touched an unexpected number of rows.
    #[error("no rows updated: expected {expected} row(s) affected, got {actual}")]
    NoRowsUpdated { expected: usize, actual: usize },

    /// The one-time pool initialization failed and no pool is available.
    #[error("database connection never initialized: {0}")]
    PoolNeverInitialized(String),

    /// A transactional operation panicked; the transaction was rolled back.
    #[error("transaction operation panicked: {0}")]
    OperationPanicked(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlKeysetError {
    /// True when a single-row query matched nothing.
    ///
    /// The driver's error is passed through untouched; this only recognizes it.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        #[cfg(feature = "sqlite")]
        if let SqlKeysetError::SqliteError(rusqlite::Error::QueryReturnedNoRows) = self {
            return true;
        }
        false
    }
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<SqlKeysetError>> for SqlKeysetError {
    fn from(err: bb8::RunError<SqlKeysetError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                SqlKeysetError::ConnectionError("SQLite pool checkout timed out".into())
            }
        }
    }
}
