//! Configuration parsing and validation.
//!
//! File Vault reads an optional TOML file (default `./config/vault.toml`).
//! Every section and key has a default, so an absent file is equivalent to
//! an empty one.
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/man.sqlite"
//!
//! [store]
//! ready_timeout_ms = 10000
//!
//! [ingest]
//! exclude_globs = ["**/.git/**"]
//! follow_symlinks = false
//! max_in_flight = 4
//! ```

use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Location of the `man` database file.
#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/man.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// How long an operation waits for the store to finish opening.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

impl StoreConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Glob patterns skipped when a directory is uploaded.
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Files read and held in memory at the same time during an upload.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            exclude_globs: default_exclude_globs(),
            follow_symlinks: false,
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    4
}

fn default_exclude_globs() -> Vec<String> {
    vec!["**/.git/**".to_string()]
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.store.ready_timeout_ms == 0 {
        anyhow::bail!("store.ready_timeout_ms must be > 0");
    }

    if config.ingest.max_in_flight == 0 {
        anyhow::bail!("ingest.max_in_flight must be > 0");
    }

    for pattern in &config.ingest.exclude_globs {
        Glob::new(pattern)
            .with_context(|| format!("ingest.exclude_globs: invalid pattern '{}'", pattern))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.db.path, PathBuf::from("./data/man.sqlite"));
        assert_eq!(config.store.ready_timeout(), Duration::from_secs(10));
        assert_eq!(config.ingest.exclude_globs, vec!["**/.git/**"]);
        assert_eq!(config.ingest.max_in_flight, 4);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config: Config = toml::from_str("[store]\nready_timeout_ms = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_zero_max_in_flight() {
        let config: Config = toml::from_str("[ingest]\nmax_in_flight = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_bad_glob() {
        let config: Config = toml::from_str("[ingest]\nexclude_globs = [\"a/[\"]\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_or_default(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config.store.ready_timeout_ms, 10_000);
    }

    #[test]
    fn reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vault.toml");
        std::fs::write(&path, "[db]\npath = \"/tmp/x/man.sqlite\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.db.path, PathBuf::from("/tmp/x/man.sqlite"));
    }
}
