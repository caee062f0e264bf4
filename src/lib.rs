//! Keyset pagination and transactional data access for `SQLite`.
//!
//! - [`pagination`]: opaque cursors, page-size tiers, SQL fragments and links
//!   for paging over a `(createdAt, id)` ordering
//! - [`query`]: map the first or every row of a query
//! - [`transaction`]: run operations atomically, with rollback on error or panic
//! - [`pool`]: pool creation, migrations and one-time initialization
//! - [`config`]: layered settings files and `clap` flags
//!
//! `SQLite` is the only supported dialect. [`Dialect`] has the single variant
//! `sqlite3`; other dialect names (`mysql`, `postgres`) are rejected as
//! configuration errors, and migrations run through `refinery` on the pooled
//! `rusqlite` connection.
//!
//! ```rust,no_run
//! use sql_keyset::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlKeysetError> {
//! let init = PoolInitializer::new();
//! let cfg = DatabaseConfig::builder().connection_url("app.db").finish();
//! let pool = init
//!     .get_pool(&cfg, &MigrationConfig::enabled("file://./migrations"))
//!     .await?;
//!
//! let page = Pagination::default();
//! let query = PageQuery::new("SELECT id FROM test", vec![], &page, false, PageSize::Regular);
//! let ids: Vec<String> =
//!     query_many(&pool, &query.sql, &query.args, |row| Ok(row.get(0)?)).await?;
//! # let _ = ids;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pagination;
pub mod prelude;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod migration;
#[cfg(feature = "sqlite")]
pub mod pool;
#[cfg(feature = "sqlite")]
pub mod query;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub mod transaction;

pub use error::SqlKeysetError;
pub use types::{Dialect, RowValues};

#[cfg(feature = "sqlite")]
pub use pool::{ConfigAndPool, PoolInitializer, create_pool, run_migration};
#[cfg(feature = "sqlite")]
pub use query::{query_many, query_one};
#[cfg(feature = "sqlite")]
pub use transaction::{
    Tx, WriteOp, run_in_transaction, run_multiple_writes, run_single_write, single_write_op,
};
