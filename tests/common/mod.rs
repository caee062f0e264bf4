#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sql_keyset::prelude::*;
use tempfile::TempDir;

pub const MIGRATION_COUNT: i64 = 2;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn migration_source() -> String {
    format!("file://{}/tests/migrations", env!("CARGO_MANIFEST_DIR"))
}

pub fn database_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::builder()
        .connection_url(dir.path().join("test.sqlite3").to_string_lossy())
        .max_open_connections(4)
        .finish()
}

/// A migrated pool on a fresh database file inside `dir`.
pub async fn migrated_pool(dir: &TempDir) -> Result<ConfigAndPool, SqlKeysetError> {
    init_tracing();
    PoolInitializer::new()
        .get_pool(
            &database_config(dir),
            &MigrationConfig::enabled(migration_source()),
        )
        .await
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Insert `count` rows named `name`; ids and creation times both increase with
/// the row number, starting at `offset`.
pub async fn seed_rows(
    pool: &ConfigAndPool,
    name: &'static str,
    offset: i64,
    count: i64,
) -> Result<(), SqlKeysetError> {
    run_in_transaction(pool, move |tx| {
        for i in offset..offset + count {
            let created = base_time() + Duration::seconds(i);
            tx.execute(
                "INSERT INTO test (id, name, note, createdAt, updatedAt) VALUES (?1, ?2, NULL, ?3, ?3)",
                &[
                    RowValues::from(format!("{i:020}")),
                    RowValues::from(name),
                    RowValues::Timestamp(created),
                ],
            )?;
        }
        Ok(())
    })
    .await
}

pub async fn count_rows(pool: &ConfigAndPool) -> Result<i64, SqlKeysetError> {
    query_one(pool, "SELECT COUNT(*) FROM test", &[], |row| Ok(row.get(0)?)).await
}
