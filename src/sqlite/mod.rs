// SQLite backend plumbing
//
// - config: bb8 connection manager and pool aliases
// - params: binding `RowValues` and reading timestamps back
// - connection: the spawn_blocking bridge every statement goes through

pub mod config;
pub mod connection;
pub mod params;

pub(crate) use connection::run_blocking;

pub use config::{SharedSqliteConnection, SqliteManager, SqlitePool, SqlitePooledConnection};
pub use params::{Params, row_value_to_sqlite_value, timestamp_at};
