//! Readiness gate for the record store.
//!
//! Opening the database is asynchronous, and callers may issue operations
//! before it finishes. [`ReadyStore`] runs the open sequence once in a
//! background task and publishes the outcome on a `watch` channel. Every
//! store operation awaits that signal first, so early callers wait instead
//! of failing, and the wait is capped by a ceiling:
//!
//! ```text
//!   Opening ──ok──▶ Ready(store)   operations delegate to the store
//!      │
//!      ├──err──▶ Failed(message)   operations return Unavailable
//!      │
//!      └─ceiling elapsed─────────▶ operations return NotReady
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use file_vault_core::models::{FileRecord, NewFileRecord};
use file_vault_core::store::{RecordStore, StoreError, StoreResult};

enum Readiness<S> {
    Opening,
    Ready(Arc<S>),
    Failed(String),
}

/// A [`RecordStore`] that becomes usable once its opener completes.
pub struct ReadyStore<S> {
    state: watch::Receiver<Readiness<S>>,
    ceiling: Duration,
}

impl<S: RecordStore + 'static> ReadyStore<S> {
    /// Start opening the store in the background.
    ///
    /// `open` is invoked exactly once. Operations wait at most `ceiling`
    /// for it to finish.
    pub fn spawn<F, Fut>(open: F, ceiling: Duration) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<S>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Readiness::Opening);
        let opening = open();
        tokio::spawn(async move {
            let outcome = match opening.await {
                Ok(store) => {
                    tracing::debug!("store ready");
                    Readiness::Ready(Arc::new(store))
                }
                Err(e) => {
                    tracing::error!(error = %e, "store failed to open");
                    Readiness::Failed(e.to_string())
                }
            };
            let _ = tx.send(outcome);
        });
        Self { state: rx, ceiling }
    }

    /// Wrap a store that is already open.
    pub fn ready(store: S) -> Self {
        let (_tx, rx) = watch::channel(Readiness::Ready(Arc::new(store)));
        Self {
            state: rx,
            ceiling: Duration::ZERO,
        }
    }

    /// True once the open sequence has succeeded.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), Readiness::Ready(_))
    }

    /// Wait for the open sequence and return the underlying store.
    pub async fn wait_ready(&self) -> StoreResult<Arc<S>> {
        if let Some(resolved) = resolve(&self.state.borrow()) {
            return resolved;
        }

        let mut rx = self.state.clone();
        let waited = tokio::time::timeout(
            self.ceiling,
            rx.wait_for(|s| !matches!(s, Readiness::Opening)),
        )
        .await;

        match waited {
            Err(_) => Err(StoreError::NotReady(self.ceiling)),
            Ok(Err(_)) => Err(StoreError::Unavailable(
                "store opener stopped without a result".to_string(),
            )),
            Ok(Ok(state)) => {
                resolve(&state).unwrap_or(Err(StoreError::NotReady(self.ceiling)))
            }
        }
    }
}

fn resolve<S>(state: &Readiness<S>) -> Option<StoreResult<Arc<S>>> {
    match state {
        Readiness::Opening => None,
        Readiness::Ready(store) => Some(Ok(Arc::clone(store))),
        Readiness::Failed(message) => Some(Err(StoreError::Unavailable(message.clone()))),
    }
}

#[async_trait]
impl<S: RecordStore + 'static> RecordStore for ReadyStore<S> {
    async fn insert(&self, record: &NewFileRecord) -> StoreResult<FileRecord> {
        self.wait_ready().await?.insert(record).await
    }

    async fn list_all(&self) -> StoreResult<Vec<FileRecord>> {
        self.wait_ready().await?.list_all().await
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<FileRecord>> {
        self.wait_ready().await?.get_by_id(id).await
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        self.wait_ready().await?.delete_by_id(id).await
    }
}
