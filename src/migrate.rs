//! Schema setup and versioning for the `man` database.
//!
//! The schema version lives in SQLite's `PRAGMA user_version`. When the
//! stored version is below [`SCHEMA_VERSION`], the `files` table and its
//! secondary indexes are created and the version is bumped. Running the
//! migration again is a no-op.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Schema version this build expects.
pub const SCHEMA_VERSION: i64 = 1;

/// Read the schema version stored in the database (0 for a new file).
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Bring the schema up to [`SCHEMA_VERSION`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;
    if current >= SCHEMA_VERSION {
        tracing::debug!(version = current, "schema up to date");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    // AUTOINCREMENT keeps ids from being reused after deletes.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            "type" TEXT NOT NULL DEFAULT '',
            size INTEGER NOT NULL,
            category TEXT NOT NULL,
            data TEXT NOT NULL,
            date TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_category ON files(category)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_name ON files(name)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_date ON files(date)")
        .execute(&mut *tx)
        .await?;

    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(from = current, to = SCHEMA_VERSION, "schema upgraded");
    Ok(())
}

/// Open the configured database, migrate it, and close it again.
pub async fn init(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    Ok(())
}
