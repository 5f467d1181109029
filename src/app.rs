//! Application state and the operations the frontend drives.
//!
//! [`App`] owns the store handle, the [`Catalog`] mirror, and the current
//! [`ViewState`]. Every successful mutation (an upload's insert, a delete)
//! is followed by a full catalog refresh; the view is always derived from
//! the catalog, never stored.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use file_vault_core::catalog::{Catalog, StorageSummary};
use file_vault_core::datauri;
use file_vault_core::models::FileRecord;
use file_vault_core::store::{RecordStore, StoreError, StoreResult};
use file_vault_core::view::{self, CategoryFilter, PreviewKind, RenderedView, ViewMode, ViewState};

use crate::config::IngestConfig;
use crate::ingest::{self, IngestError, IngestFailure, IngestReport};
use crate::progress::{UploadProgressEvent, UploadProgressReporter};

/// A record opened for preview.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub kind: PreviewKind,
    pub record: FileRecord,
}

pub struct App<S> {
    store: Arc<S>,
    catalog: Catalog,
    view: ViewState,
}

impl<S: RecordStore + 'static> App<S> {
    /// Build the app and load the catalog once the store is ready.
    pub async fn start(store: Arc<S>) -> StoreResult<Self> {
        let mut app = Self {
            store,
            catalog: Catalog::new(),
            view: ViewState::default(),
        };
        app.catalog.refresh(app.store.as_ref()).await?;
        Ok(app)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.view.category = category;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.view.search = search.into();
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        self.view.mode = mode;
    }

    /// Current visible set under the view state.
    pub fn render(&self) -> RenderedView {
        view::render(&self.catalog, &self.view)
    }

    pub fn summary(&self) -> StorageSummary {
        self.catalog.summary()
    }

    pub async fn refresh(&mut self) -> StoreResult<()> {
        self.catalog.refresh(self.store.as_ref()).await
    }

    /// Upload every file in `selection`, then clear it.
    ///
    /// Files are read and inserted concurrently, at most
    /// `config.max_in_flight` at a time. The catalog is refreshed
    /// after each successful insert; failures are collected in the report.
    pub async fn upload(
        &mut self,
        selection: &mut Vec<PathBuf>,
        config: &IngestConfig,
        reporter: &dyn UploadProgressReporter,
    ) -> Result<IngestReport> {
        let chosen = std::mem::take(selection);
        let files = ingest::expand_selection(&chosen, config)?;
        let total = files.len() as u64;
        for path in &files {
            reporter.report(UploadProgressEvent::Queued { path: path.clone() });
        }

        let mut report = IngestReport::default();
        let mut uploads = ingest::spawn_uploads(&self.store, files, config.max_in_flight);
        while let Some((path, result)) = uploads.next().await {
            let n = report.total() as u64 + 1;
            match result {
                Ok(record) => {
                    reporter.report(UploadProgressEvent::Stored {
                        name: record.name.clone(),
                        id: record.id,
                        n,
                        total,
                    });
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(error = %e, "catalog refresh after upload failed");
                    }
                    report.stored.push(record);
                }
                Err(error) => {
                    reporter.report(UploadProgressEvent::Failed {
                        path: path.clone(),
                        message: error.to_string(),
                        n,
                        total,
                    });
                    report.failures.push(IngestFailure { path, error });
                }
            }
        }

        report.stored.sort_by_key(|r| r.id);
        Ok(report)
    }

    /// Delete a record and refresh. Deleting an absent id succeeds with `false`.
    pub async fn delete(&mut self, id: i64) -> StoreResult<bool> {
        let removed = self.store.delete_by_id(id).await?;
        self.refresh().await?;
        Ok(removed)
    }

    /// Open a record for preview.
    pub async fn preview(&self, id: i64) -> StoreResult<Option<Preview>> {
        let record = match self.catalog.get(id) {
            Some(record) => Some(record.clone()),
            None => self.store.get_by_id(id).await?,
        };
        Ok(record.map(|record| Preview {
            kind: PreviewKind::for_record(&record),
            record,
        }))
    }

    /// Write a record's original bytes to `dest`.
    ///
    /// If `dest` is an existing directory the file keeps its stored name.
    /// Returns the path written, or `None` if no such record exists.
    pub async fn export(&self, id: i64, dest: &Path) -> Result<Option<PathBuf>> {
        let preview = match self.preview(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        let decoded = datauri::decode(&preview.record.data)
            .map_err(|e| StoreError::InvalidRecord(format!("record {}: {}", id, e)))?;

        let target = if dest.is_dir() {
            dest.join(&preview.record.name)
        } else {
            dest.to_path_buf()
        };
        tokio::fs::write(&target, &decoded.bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::info!(id, path = %target.display(), bytes = decoded.bytes.len(), "exported");
        Ok(Some(target))
    }
}

/// The message shown to a user for a store failure.
pub fn notice(err: &StoreError) -> String {
    match err {
        StoreError::Unavailable(msg) => format!(
            "Failed to initialize database ({}). Check that the storage location is accessible.",
            msg
        ),
        StoreError::NotReady(waited) => format!(
            "Database was not ready after {:?}. Please try again.",
            waited
        ),
        StoreError::WriteFailed(msg) => {
            format!("Failed to save changes ({}). Please try again.", msg)
        }
        StoreError::QueryFailed(msg) => format!("Failed to load files ({}).", msg),
        StoreError::InvalidRecord(msg) => format!("Stored file is corrupt: {}", msg),
    }
}

/// The message shown to a user for a file that failed to upload.
pub fn ingest_notice(err: &IngestError) -> String {
    match err {
        IngestError::Read { path, source } => {
            format!("Could not read {}: {}", path.display(), source)
        }
        IngestError::Store(e) => notice(e),
        IngestError::Aborted { path } => format!(
            "Upload of {} stopped unexpectedly. Please try again.",
            path.display()
        ),
    }
}
