//! Core data models used throughout File Vault.
//!
//! A [`FileRecord`] is the only persisted entity. Records are created from a
//! [`NewFileRecord`] by the store, which assigns the `id`; they are never
//! updated afterwards, only deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Files at or above this size that are neither images nor videos are
/// labelled [`Category::Large`]. The label never causes a rejection.
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Category assigned once at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Picture,
    Video,
    Large,
    File,
}

impl Category {
    /// All categories, in sidebar order.
    pub const ALL: [Category; 4] = [
        Category::Picture,
        Category::Video,
        Category::Large,
        Category::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Picture => "picture",
            Category::Video => "video",
            Category::Large => "large",
            Category::File => "file",
        }
    }

    /// Classify a file by its reported type and size.
    ///
    /// The type check is case-insensitive and wins over size: a 2 GiB
    /// `image/png` is still a picture.
    pub fn classify(mime_type: &str, size: u64) -> Category {
        let mime = mime_type.to_ascii_lowercase();
        if mime.starts_with("image/") {
            Category::Picture
        } else if mime.starts_with("video/") {
            Category::Video
        } else if size >= LARGE_FILE_THRESHOLD {
            Category::Large
        } else {
            Category::File
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "picture" => Ok(Category::Picture),
            "video" => Ok(Category::Video),
            "large" => Ok(Category::Large),
            "file" => Ok(Category::File),
            other => Err(format!(
                "Unknown category: '{}'. Use picture, video, large, or file.",
                other
            )),
        }
    }
}

/// A record as submitted for insertion, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub category: Category,
    /// Full content as a `data:` URI.
    pub data: String,
    /// ISO-8601 creation timestamp.
    pub date: String,
}

impl NewFileRecord {
    /// Build a record from raw file content, classifying it and stamping
    /// the current time.
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::from_bytes_at(name, mime_type, bytes, Utc::now())
    }

    /// Like [`from_bytes`](Self::from_bytes) with an explicit creation time.
    pub fn from_bytes_at(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
        created: DateTime<Utc>,
    ) -> Self {
        let mime_type = mime_type.into();
        let size = bytes.len() as u64;
        Self {
            name: name.into(),
            category: Category::classify(&mime_type, size),
            data: crate::datauri::encode(&mime_type, bytes),
            mime_type,
            size,
            date: format_iso(created),
        }
    }
}

/// A persisted file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub category: Category,
    pub data: String,
    pub date: String,
}

impl FileRecord {
    /// Attach a store-assigned id to a submitted record.
    pub fn from_new(id: i64, new: &NewFileRecord) -> Self {
        Self {
            id,
            name: new.name.clone(),
            mime_type: new.mime_type.clone(),
            size: new.size,
            category: new.category,
            data: new.data.clone(),
            date: new.date.clone(),
        }
    }

    /// Parsed creation time, if `date` is valid RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Creation time in the local time zone, which is what users are shown.
    pub fn created_local(&self) -> Option<DateTime<Local>> {
        self.created_at().map(|dt| dt.with_timezone(&Local))
    }
}

/// Format a timestamp the way records store it: RFC 3339, millisecond
/// precision, `Z` suffix.
pub fn format_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
