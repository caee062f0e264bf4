use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bb8::Pool;
use tokio::sync::OnceCell;

use crate::config::{MigrationConfig, RelationalDatabaseConfig};
use crate::error::SqlKeysetError;
use crate::migration::{MigrationOutcome, engine_for};
use crate::sqlite::{SharedSqliteConnection, SqliteManager, SqlitePool, SqlitePooledConnection, run_blocking};
use crate::types::Dialect;

/// Connection pool plus the dialect it was built for.
///
/// Cheap to clone; clones share the same underlying pool.
#[derive(Clone, Debug)]
pub struct ConfigAndPool {
    pub pool: SqlitePool,
    pub dialect: Dialect,
}

impl ConfigAndPool {
    /// Check a connection out of the pool.
    ///
    /// # Errors
    /// Returns `SqlKeysetError` if the pool times out or a new connection cannot be opened.
    pub async fn get_connection(&self) -> Result<SqlitePooledConnection<'_>, SqlKeysetError> {
        Ok(self.pool.get().await?)
    }

    /// Run `func` on a pooled connection on the blocking thread pool.
    ///
    /// The pooled connection stays checked out until `func` has finished.
    pub(crate) async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlKeysetError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlKeysetError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.get_connection().await?;
        let handle: SharedSqliteConnection = Arc::clone(&*conn);
        let result = run_blocking(handle, func).await;
        drop(conn);
        result
    }

    /// Execute a batch of statements (no parameters) in its own transaction.
    ///
    /// # Errors
    /// Returns `SqlKeysetError` if checkout or any statement fails; nothing is
    /// committed in that case.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlKeysetError> {
        let sql_owned = sql.to_owned();
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(&sql_owned)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

/// Build the connection pool described by `cfg`, without running migrations.
///
/// One connection is opened up front, outside the pool, so a bad path or URL
/// fails here with the driver's error rather than on first use. `max_idle_connections` is carried in the configuration
/// but bb8 has no cap on idle connections, so it is not enforced.
///
/// # Errors
/// Returns `SqlKeysetError` if the configuration is unusable or the first
/// connection cannot be opened.
pub async fn create_pool<C>(cfg: &C) -> Result<ConfigAndPool, SqlKeysetError>
where
    C: RelationalDatabaseConfig + ?Sized,
{
    let dialect = cfg.dialect();
    let manager = match dialect {
        Dialect::Sqlite3 => SqliteManager::new(cfg.connection_url()),
    };
    let pool: SqlitePool = Pool::builder()
        .max_size(u32::from(cfg.max_open_connections().max(1)))
        .max_lifetime(cfg.connection_max_lifetime())
        .idle_timeout(cfg.connection_max_idle_time())
        .build(manager)
        .await?;
    // bb8 retries failed connects until checkout times out; a dedicated
    // connection surfaces the driver error directly.
    drop(pool.dedicated_connection().await?);
    tracing::debug!(
        %dialect,
        url = cfg.connection_url(),
        max_open = cfg.max_open_connections(),
        "database pool created"
    );
    Ok(ConfigAndPool { pool, dialect })
}

/// Run pending migrations when `migration_cfg` enables them.
///
/// # Errors
/// Returns `SqlKeysetError` if the migration source cannot be read or a
/// migration fails. A source with nothing pending is not an error.
pub async fn run_migration<C>(
    pool: &ConfigAndPool,
    db_cfg: &C,
    migration_cfg: &MigrationConfig,
) -> Result<MigrationOutcome, SqlKeysetError>
where
    C: RelationalDatabaseConfig + ?Sized,
{
    if !migration_cfg.migration_enabled {
        tracing::debug!("schema migration disabled");
        return Ok(MigrationOutcome::Disabled);
    }
    let engine = engine_for(db_cfg.dialect(), &migration_cfg.migration_source)?;
    engine.up(pool).await
}

/// Lazily builds one pool (and runs migrations once) for the whole process.
///
/// Construct it once at startup and hand it (or an `Arc` of it) to whoever
/// needs a pool. However many callers race on [`PoolInitializer::get_pool`],
/// exactly one initialization attempt runs; the others wait for it and see its
/// result.
#[derive(Debug, Default)]
pub struct PoolInitializer {
    cell: OnceCell<Result<ConfigAndPool, String>>,
    attempts: AtomicUsize,
}

impl PoolInitializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool, creating it and migrating the schema on first use.
    ///
    /// # Errors
    /// The caller that ran a failed attempt gets the underlying error; every other
    /// caller gets `SqlKeysetError::PoolNeverInitialized` with that error's message.
    pub async fn get_pool<C>(
        &self,
        db_cfg: &C,
        migration_cfg: &MigrationConfig,
    ) -> Result<ConfigAndPool, SqlKeysetError>
    where
        C: RelationalDatabaseConfig + Sync + ?Sized,
    {
        let mut first_error: Option<SqlKeysetError> = None;
        let slot = &mut first_error;
        let outcome = self
            .cell
            .get_or_init(|| async move {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                match initialize(db_cfg, migration_cfg).await {
                    Ok(pool) => Ok(pool),
                    Err(e) => {
                        tracing::error!(error = %e, "database pool initialization failed");
                        let message = e.to_string();
                        *slot = Some(e);
                        Err(message)
                    }
                }
            })
            .await;
        match (outcome, first_error) {
            (Ok(pool), _) => Ok(pool.clone()),
            (Err(_), Some(e)) => Err(e),
            (Err(message), None) => Err(SqlKeysetError::PoolNeverInitialized(message.clone())),
        }
    }

    /// The pool if initialization already succeeded.
    #[must_use]
    pub fn get(&self) -> Option<&ConfigAndPool> {
        self.cell.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// How many initialization attempts have run (zero or one).
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

async fn initialize<C>(
    db_cfg: &C,
    migration_cfg: &MigrationConfig,
) -> Result<ConfigAndPool, SqlKeysetError>
where
    C: RelationalDatabaseConfig + ?Sized,
{
    let pool = create_pool(db_cfg).await?;
    match run_migration(&pool, db_cfg, migration_cfg).await? {
        MigrationOutcome::Applied(versions) => {
            tracing::info!(?versions, "applied schema migrations");
        }
        MigrationOutcome::NoChange => tracing::debug!("schema already up to date"),
        MigrationOutcome::Disabled => {}
    }
    Ok(pool)
}
