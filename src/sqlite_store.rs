//! SQLite-backed [`RecordStore`] implementation.
//!
//! Maps each [`RecordStore`] operation to a single statement against the
//! `files` table created by [`migrate`](crate::migrate).

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use file_vault_core::models::{Category, FileRecord, NewFileRecord};
use file_vault_core::store::{RecordStore, StoreError, StoreResult};

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`RecordStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if absent) and migrate the configured database.
    ///
    /// Any failure is reported as [`StoreError::Unavailable`].
    pub async fn open(config: &Config) -> StoreResult<Self> {
        let pool = db::connect(config)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        migrate::run_migrations(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("schema setup failed: {:#}", e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_record(row: &SqliteRow) -> StoreResult<FileRecord> {
    let category: String = row.get("category");
    let category = category
        .parse::<Category>()
        .map_err(StoreError::QueryFailed)?;
    let size: i64 = row.get("size");
    Ok(FileRecord {
        id: row.get("id"),
        name: row.get("name"),
        mime_type: row.get("type"),
        size: u64::try_from(size)
            .map_err(|_| StoreError::QueryFailed(format!("negative size: {}", size)))?,
        category,
        data: row.get("data"),
        date: row.get("date"),
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, record: &NewFileRecord) -> StoreResult<FileRecord> {
        let size = i64::try_from(record.size)
            .map_err(|_| StoreError::WriteFailed(format!("size too large: {}", record.size)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO files (name, "type", size, category, data, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.mime_type)
        .bind(size)
        .bind(record.category.as_str())
        .bind(&record.data)
        .bind(&record.date)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, name = %record.name, "record inserted");
        Ok(FileRecord::from_new(id, record))
    }

    async fn list_all(&self) -> StoreResult<Vec<FileRecord>> {
        let rows = sqlx::query(
            r#"SELECT id, name, "type", size, category, data, date FROM files ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<FileRecord>> {
        let row = sqlx::query(
            r#"SELECT id, name, "type", size, category, data, date FROM files WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let removed = result.rows_affected() > 0;
        tracing::debug!(id, removed, "record delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().join("man.sqlite");
        let store = SqliteStore::open(&config).await.unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn round_trip_is_byte_identical() {
        let (_tmp, store) = open_temp().await;
        let new = NewFileRecord::from_bytes("a.png", "image/png", &vec![7u8; 2_000]);
        let stored = store.insert(&new).await.unwrap();
        assert!(stored.id > 0);

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        let rec = &listed[0];
        assert_eq!(rec.id, stored.id);
        assert_eq!(rec.name, new.name);
        assert_eq!(rec.mime_type, new.mime_type);
        assert_eq!(rec.size, new.size);
        assert_eq!(rec.category, new.category);
        assert_eq!(rec.data, new.data);
        assert_eq!(rec.date, new.date);
    }

    #[tokio::test]
    async fn empty_type_survives() {
        let (_tmp, store) = open_temp().await;
        let new = NewFileRecord::from_bytes("README", "", b"plain");
        let stored = store.insert(&new).await.unwrap();
        let fetched = store.get_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.mime_type, "");
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn delete_twice_is_noop() {
        let (_tmp, store) = open_temp().await;
        let a = store
            .insert(&NewFileRecord::from_bytes("a.txt", "text/plain", b"a"))
            .await
            .unwrap();
        let b = store
            .insert(&NewFileRecord::from_bytes("b.txt", "text/plain", b"b"))
            .await
            .unwrap();

        assert!(store.delete_by_id(a.id).await.unwrap());
        assert!(!store.delete_by_id(a.id).await.unwrap());

        let remaining: Vec<i64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![b.id]);
        assert!(store.get_by_id(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_never_reused() {
        let (_tmp, store) = open_temp().await;
        let a = store
            .insert(&NewFileRecord::from_bytes("a.txt", "text/plain", b"a"))
            .await
            .unwrap();
        store.delete_by_id(a.id).await.unwrap();
        let b = store
            .insert(&NewFileRecord::from_bytes("b.txt", "text/plain", b"b"))
            .await
            .unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn open_fails_when_path_is_a_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().to_path_buf();
        match SqliteStore::open(&config).await {
            Err(StoreError::Unavailable(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening a directory as a database should fail"),
        }
    }
}
