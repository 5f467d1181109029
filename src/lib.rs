//! # File Vault
//!
//! **A local-first file manager backed by an embedded database.**
//!
//! File Vault stores whole files (images, videos, documents) as records in
//! a local SQLite database, classifies them into categories at upload time,
//! and serves filtered, searchable grid or list views with preview and
//! export.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Upload    │──▶│ ReadyStore   │──▶│ SQLite "man"  │
//! │ (ingest)   │   │  (gate)      │   │  files table  │
//! └────────────┘   └──────┬───────┘   └───────────────┘
//!                         │ list_all after every mutation
//!                         ▼
//!                  ┌──────────────┐   ┌───────────────┐
//!                  │   Catalog    │──▶│ filter/render │──▶ CLI (vault)
//!                  └──────────────┘   └───────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. **Ingestion** ([`ingest`]) reads each selected file, derives its type
//!    and [`Category`](file_vault_core::models::Category), and inserts a
//!    record through the store.
//! 2. The **store** ([`sqlite_store`]) assigns ids and persists records;
//!    the **gate** ([`gate`]) makes early callers wait for the database to
//!    open, up to a ceiling.
//! 3. After every insert or delete the **catalog** is reloaded wholesale.
//! 4. The **view pipeline** filters the catalog by category and search term
//!    and projects it for display.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Schema setup and versioning (`PRAGMA user_version`) |
//! | [`sqlite_store`] | SQLite `RecordStore` implementation |
//! | [`gate`] | Readiness gate around the store |
//! | [`ingest`] | Upload ingestion: selection → records |
//! | [`app`] | Application state: catalog, view state, operations |
//! | [`progress`] | Upload progress reporting on stderr |
//! | [`logging`] | `tracing` subscriber setup |

pub mod app;
pub mod config;
pub mod db;
pub mod gate;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod progress;
pub mod sqlite_store;

pub use app::App;
pub use file_vault_core::{catalog, datauri, models, store, view};
pub use gate::ReadyStore;
pub use sqlite_store::SqliteStore;
