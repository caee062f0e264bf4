//! Schema migrations run by the pool initializer.

mod file;

use async_trait::async_trait;

use crate::error::SqlKeysetError;
use crate::pool::ConfigAndPool;
use crate::types::Dialect;

pub use file::FileMigrationEngine;
pub use refinery_core::Migration;

/// Result of bringing a schema up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// These versions were applied, in order.
    Applied(Vec<u64>),
    /// Every known migration was already applied.
    NoChange,
    /// Migrations are turned off in the configuration.
    Disabled,
}

#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Apply every pending migration.
    async fn up(&self, pool: &ConfigAndPool) -> Result<MigrationOutcome, SqlKeysetError>;
}

/// Pick the migration engine for `dialect`, reading migrations from `source`.
///
/// # Errors
/// Returns `SqlKeysetError::ConfigError` if `source` is not a supported locator.
pub fn engine_for(
    dialect: Dialect,
    source: &str,
) -> Result<Box<dyn MigrationEngine>, SqlKeysetError> {
    match dialect {
        Dialect::Sqlite3 => Ok(Box::new(FileMigrationEngine::from_source(source)?)),
    }
}
