//! In-memory catalog of all stored records.
//!
//! The catalog is a point-in-time copy of the store. It is never patched:
//! after every insert or delete the caller runs [`Catalog::refresh`], which
//! reloads the full list and replaces the cached one.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::{Category, FileRecord};
use crate::store::{RecordStore, StoreResult};
use crate::view::format_file_size;

/// Last-known-complete set of records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<FileRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload every record from `store`, replacing the cache wholesale.
    ///
    /// On failure the previous contents are kept.
    pub async fn refresh<S: RecordStore + ?Sized>(&mut self, store: &S) -> StoreResult<()> {
        let records = store.list_all().await?;
        tracing::debug!(count = records.len(), "catalog refreshed");
        self.records = records;
        Ok(())
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Count and total size, overall and per category.
    pub fn summary(&self) -> StorageSummary {
        let mut per_category: BTreeMap<Category, CategoryTotals> = Category::ALL
            .iter()
            .map(|c| (*c, CategoryTotals::default()))
            .collect();
        let mut total_bytes = 0u64;
        for rec in &self.records {
            total_bytes += rec.size;
            let entry = per_category.entry(rec.category).or_default();
            entry.file_count += 1;
            entry.total_bytes += rec.size;
        }
        StorageSummary {
            file_count: self.records.len(),
            total_bytes,
            per_category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Storage readout: number of files and bytes used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSummary {
    pub file_count: usize,
    pub total_bytes: u64,
    pub per_category: BTreeMap<Category, CategoryTotals>,
}

impl fmt::Display for StorageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file{}, {}",
            self.file_count,
            if self.file_count == 1 { "" } else { "s" },
            format_file_size(self.total_bytes)
        )
    }
}
