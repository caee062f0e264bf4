//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{
    AppConfig, DatabaseArgs, DatabaseConfig, DatabaseConfigBuilder, MigrationConfig,
    RelationalDatabaseConfig,
};
pub use crate::error::SqlKeysetError;
pub use crate::pagination::{
    BasePaginateable, Cursor, Direction, PageQuery, PageSize, Paginateable, Pagination,
    build_page_args, build_page_fragment, build_regular_page_fragment, pagination_from_url,
    pagination_links,
};
pub use crate::types::{Dialect, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::migration::{MigrationEngine, MigrationOutcome};
#[cfg(feature = "sqlite")]
pub use crate::pool::{ConfigAndPool, PoolInitializer, create_pool, run_migration};
#[cfg(feature = "sqlite")]
pub use crate::query::{query_many, query_one};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::timestamp_at;
#[cfg(feature = "sqlite")]
pub use crate::transaction::{
    Tx, WriteOp, run_in_transaction, run_multiple_writes, run_single_write, single_write_op,
};
