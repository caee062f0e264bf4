use std::path::{Path, PathBuf};

use async_trait::async_trait;
use refinery_core::{Migration, Runner};

use crate::error::SqlKeysetError;
use crate::pool::ConfigAndPool;

use super::{MigrationEngine, MigrationOutcome};

/// Migrations read from a directory of `V<version>__<name>.sql` files.
///
/// Discovery, checksums and the `refinery_schema_history` table are handled by
/// `refinery`; each migration commits in its own transaction.
#[derive(Debug, Clone)]
pub struct FileMigrationEngine {
    dir: PathBuf,
}

impl FileMigrationEngine {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Engine for a `file://<dir>` locator or a bare directory path.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::ConfigError` for an empty locator or a scheme other than `file`.
    pub fn from_source(source: &str) -> Result<Self, SqlKeysetError> {
        let source = source.trim();
        let dir = match source.split_once("://") {
            Some(("file", path)) => path,
            Some((scheme, _)) => {
                return Err(SqlKeysetError::ConfigError(format!(
                    "unsupported migration source scheme: {scheme}"
                )));
            }
            None => source,
        };
        if dir.is_empty() {
            return Err(SqlKeysetError::ConfigError(
                "migration source must name a directory".into(),
            ));
        }
        Ok(Self::new(dir))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The migrations in the directory, ordered by version.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::MigrationError` if the directory cannot be read
    /// or a file name is unusable, or when two files share a version.
    pub fn load(&self) -> Result<Vec<Migration>, SqlKeysetError> {
        let mut migrations = refinery_core::load_sql_migrations(&self.dir).map_err(|e| {
            SqlKeysetError::MigrationError(format!(
                "cannot load migrations from {}: {e}",
                self.dir.display()
            ))
        })?;
        migrations.sort_by_key(Migration::version);
        if let Some(pair) = migrations
            .windows(2)
            .find(|w| w[0].version() == w[1].version())
        {
            return Err(SqlKeysetError::MigrationError(format!(
                "duplicate migration version {}: {} and {}",
                pair[0].version(),
                pair[0].name(),
                pair[1].name()
            )));
        }
        Ok(migrations)
    }
}

fn outcome_version(migration: &Migration) -> Result<u64, SqlKeysetError> {
    let version = i64::from(migration.version());
    u64::try_from(version).map_err(|_| {
        SqlKeysetError::MigrationError(format!("negative migration version {version}"))
    })
}

fn apply_pending(
    conn: &mut rusqlite::Connection,
    migrations: &[Migration],
) -> Result<MigrationOutcome, SqlKeysetError> {
    let report = Runner::new(migrations)
        .run(conn)
        .map_err(|e| SqlKeysetError::MigrationError(e.to_string()))?;
    let applied = report
        .applied_migrations()
        .iter()
        .map(|m| {
            tracing::info!(version = m.version(), name = m.name(), "applied migration");
            outcome_version(m)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if applied.is_empty() {
        Ok(MigrationOutcome::NoChange)
    } else {
        Ok(MigrationOutcome::Applied(applied))
    }
}

#[async_trait]
impl MigrationEngine for FileMigrationEngine {
    async fn up(&self, pool: &ConfigAndPool) -> Result<MigrationOutcome, SqlKeysetError> {
        let engine = self.clone();
        pool.with_connection(move |conn| {
            let migrations = engine.load()?;
            apply_pending(conn, &migrations)
        })
        .await
    }
}
