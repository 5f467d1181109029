//! Storage abstraction for File Vault.
//!
//! The [`RecordStore`] trait defines the durable CRUD operations over the
//! file record table, enabling pluggable backends (SQLite, in-memory,
//! future browser-backed stores).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{FileRecord, NewFileRecord};

/// Failure kinds surfaced by store operations.
///
/// `Unavailable` is reported once and leaves persistence disabled.
/// `WriteFailed` is reported with no automatic retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be opened (permissions, corrupt file, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The store did not finish opening within the readiness ceiling.
    #[error("storage not ready after {0:?}")]
    NotReady(Duration),

    /// An insert or delete transaction aborted.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A read query failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored record is malformed (e.g. an undecodable data URI).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Abstract storage backend for file records.
///
/// All operations are async (via `async-trait`). In-memory implementations
/// return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](RecordStore::insert) | Persist a new record, assigning its id |
/// | [`list_all`](RecordStore::list_all) | Every record, ascending id |
/// | [`get_by_id`](RecordStore::get_by_id) | One record by id |
/// | [`delete_by_id`](RecordStore::delete_by_id) | Remove a record (absent id is a no-op) |
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record and return it with its newly assigned id.
    ///
    /// Ids are monotonic and never reused, even after deletions.
    async fn insert(&self, record: &NewFileRecord) -> StoreResult<FileRecord>;

    /// Return every stored record in ascending id order.
    async fn list_all(&self) -> StoreResult<Vec<FileRecord>>;

    /// Fetch a single record.
    async fn get_by_id(&self, id: i64) -> StoreResult<Option<FileRecord>>;

    /// Delete a record. Returns `true` if a record was removed; deleting an
    /// absent id succeeds with `false`.
    async fn delete_by_id(&self, id: i64) -> StoreResult<bool>;
}
