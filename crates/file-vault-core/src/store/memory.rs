//! In-memory [`RecordStore`] implementation for testing and WASM targets.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so listing is naturally in
//! ascending id order. Ids come from a counter that only moves forward.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::models::{FileRecord, NewFileRecord};

use super::{RecordStore, StoreError, StoreResult};

struct Inner {
    records: BTreeMap<i64, FileRecord>,
    last_id: i64,
}

/// In-memory store for testing and WASM environments.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::WriteFailed("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert(&self, record: &NewFileRecord) -> StoreResult<FileRecord> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.last_id += 1;
        let stored = FileRecord::from_new(inner.last_id, record);
        inner.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> StoreResult<Vec<FileRecord>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::QueryFailed("in-memory store lock poisoned".to_string()))?;
        Ok(inner.records.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<FileRecord>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::QueryFailed("in-memory store lock poisoned".to_string()))?;
        Ok(inner.records.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.records.remove(&id).is_some())
    }
}
