//! Upload ingestion: selected files → classified records → store.
//!
//! Each selected file is read and inserted in its own task. A file that
//! cannot be read or inserted is reported and counted, and never blocks the
//! rest of the selection.
//!
//! Directories in the selection are expanded recursively (in sorted order),
//! skipping paths that match `ingest.exclude_globs`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use walkdir::WalkDir;

use file_vault_core::models::{FileRecord, NewFileRecord};
use file_vault_core::store::{RecordStore, StoreError};

use crate::config::IngestConfig;

/// Why one selected file was not stored.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The file could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store rejected the insert.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The file's upload task panicked before finishing.
    #[error("upload of {} stopped unexpectedly", .path.display())]
    Aborted { path: PathBuf },
}

/// One file that did not make it into the store.
#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: IngestError,
}

/// Outcome of one upload.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub stored: Vec<FileRecord>,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.stored.len() + self.failures.len()
    }
}

/// Expand a selection into the list of files to upload.
///
/// Plain paths are kept as given, even if they don't exist, so that a bad
/// entry fails on its own during reading. Directories are walked.
pub fn expand_selection(selection: &[PathBuf], config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let exclude_set = build_globset(&config.exclude_globs)?;
    let mut files = Vec::new();

    for root in selection {
        if !root.is_dir() {
            files.push(root.clone());
            continue;
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(relative) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// The type a file reports, derived from its extension; empty when unknown.
pub fn reported_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

/// Read a file and build the record to insert.
pub async fn read_file(path: &Path) -> Result<NewFileRecord, IngestError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(NewFileRecord::from_bytes(name, reported_type(path), &bytes))
}

async fn upload_one<S: RecordStore + ?Sized>(
    store: &S,
    path: &Path,
) -> Result<FileRecord, IngestError> {
    let record = match read_file(path).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "file read failed");
            return Err(e);
        }
    };
    Ok(store.insert(&record).await?)
}

/// Uploads in progress, one task per file.
pub struct UploadSet {
    tasks: JoinSet<Result<FileRecord, IngestError>>,
    paths: HashMap<task::Id, PathBuf>,
}

impl UploadSet {
    /// Number of uploads not yet collected.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The next upload to finish, paired with its path. `None` once every
    /// upload has been collected.
    ///
    /// A task that panicked is reported as [`IngestError::Aborted`]; the
    /// others keep running.
    pub async fn next(&mut self) -> Option<(PathBuf, Result<FileRecord, IngestError>)> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(match joined {
            Ok((id, result)) => (self.take_path(id), result),
            Err(e) => {
                let path = self.take_path(e.id());
                tracing::error!(path = %path.display(), error = %e, "upload task failed");
                (path.clone(), Err(IngestError::Aborted { path }))
            }
        })
    }

    fn take_path(&mut self, id: task::Id) -> PathBuf {
        self.paths.remove(&id).unwrap_or_default()
    }
}

/// Spawn one read-and-insert task per file.
///
/// At most `max_in_flight` files are read and held in memory at once.
pub fn spawn_uploads<S: RecordStore + 'static>(
    store: &Arc<S>,
    files: Vec<PathBuf>,
    max_in_flight: usize,
) -> UploadSet {
    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();
    let mut paths = HashMap::new();
    for path in files {
        let store = Arc::clone(store);
        let permits = Arc::clone(&permits);
        let task_path = path.clone();
        let handle = tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            upload_one(store.as_ref(), &task_path).await
        });
        paths.insert(handle.id(), path);
    }
    UploadSet { tasks, paths }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use file_vault_core::models::Category;
    use file_vault_core::store::memory::InMemoryStore;
    use file_vault_core::store::StoreResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn collect(mut set: UploadSet) -> (Vec<FileRecord>, Vec<(PathBuf, IngestError)>) {
        let mut stored = Vec::new();
        let mut failed = Vec::new();
        while let Some((path, result)) = set.next().await {
            match result {
                Ok(rec) => stored.push(rec),
                Err(e) => failed.push((path, e)),
            }
        }
        (stored, failed)
    }

    /// Panics when asked to insert `panic_on`; tracks concurrent inserts.
    #[derive(Default)]
    struct TrackingStore {
        inner: InMemoryStore,
        panic_on: Option<&'static str>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for TrackingStore {
        async fn insert(&self, record: &NewFileRecord) -> StoreResult<FileRecord> {
            if self.panic_on == Some(record.name.as_str()) {
                panic!("insert blew up");
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.insert(record).await
        }

        async fn list_all(&self) -> StoreResult<Vec<FileRecord>> {
            self.inner.list_all().await
        }

        async fn get_by_id(&self, id: i64) -> StoreResult<Option<FileRecord>> {
            self.inner.get_by_id(id).await
        }

        async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_by_id(id).await
        }
    }

    fn write_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn reported_type_from_extension() {
        assert_eq!(reported_type(Path::new("a.png")), "image/png");
        assert_eq!(reported_type(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(reported_type(Path::new("no_extension")), "");
    }

    #[tokio::test]
    async fn read_file_classifies() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        std::fs::write(&path, vec![0u8; 2_000_000]).unwrap();

        let rec = read_file(&path).await.unwrap();
        assert_eq!(rec.name, "a.png");
        assert_eq!(rec.mime_type, "image/png");
        assert_eq!(rec.size, 2_000_000);
        assert_eq!(rec.category, Category::Picture);
        assert!(rec.data.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let err = read_file(Path::new("/definitely/not/here.txt")).await.unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
        assert!(err.to_string().starts_with("could not read /definitely/not/here.txt"));
    }

    #[tokio::test]
    async fn one_bad_file_does_not_block_others() {
        let tmp = tempfile::TempDir::new().unwrap();
        let good_a = tmp.path().join("a.txt");
        let good_b = tmp.path().join("b.txt");
        std::fs::write(&good_a, "alpha").unwrap();
        std::fs::write(&good_b, "beta").unwrap();
        let missing = tmp.path().join("missing.txt");

        let store = Arc::new(InMemoryStore::new());
        let set = spawn_uploads(&store, vec![good_a, missing.clone(), good_b], 4);
        let (stored, failed) = collect(set).await;

        assert_eq!(stored.len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, missing);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn panicked_upload_is_reported_and_the_rest_finish() {
        let tmp = tempfile::TempDir::new().unwrap();
        let files = write_files(tmp.path(), &["a.txt", "boom.txt", "c.txt", "d.txt"]);
        let store = Arc::new(TrackingStore {
            panic_on: Some("boom.txt"),
            ..Default::default()
        });

        let set = spawn_uploads(&store, files, 1);
        assert_eq!(set.len(), 4);
        let (stored, failed) = collect(set).await;

        assert_eq!(stored.len(), 3);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, tmp.path().join("boom.txt"));
        assert!(matches!(failed[0].1, IngestError::Aborted { .. }));
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn uploads_in_flight_are_bounded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let names: Vec<String> = (0..8).map(|i| format!("f{}.txt", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let files = write_files(tmp.path(), &names);
        let store = Arc::new(TrackingStore::default());

        let (stored, failed) = collect(spawn_uploads(&store, files, 2)).await;

        assert_eq!(stored.len(), 8);
        assert!(failed.is_empty());
        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak in-flight inserts: {}", peak);
    }

    #[test]
    fn expand_walks_directories_and_excludes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("photos");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("b.jpg"), "b").unwrap();
        std::fs::write(root.join("nested").join("a.jpg"), "a").unwrap();
        std::fs::write(root.join(".git").join("HEAD"), "ref").unwrap();
        let single = tmp.path().join("single.txt");
        std::fs::write(&single, "s").unwrap();

        let files =
            expand_selection(&[single.clone(), root.clone()], &IngestConfig::default()).unwrap();
        assert_eq!(
            files,
            vec![single, root.join("b.jpg"), root.join("nested").join("a.jpg")]
        );
    }
}
