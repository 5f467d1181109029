//! # File Vault Core
//!
//! Shared, WASM-safe logic for File Vault: the file record model and
//! category classification, the data URI codec, the record store
//! abstraction, the catalog cache, and the filter/render pipeline.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. It compiles to both native targets and
//! `wasm32-unknown-unknown`.

pub mod catalog;
pub mod datauri;
pub mod models;
pub mod store;
pub mod view;
