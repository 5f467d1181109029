//! Upload progress reporting.
//!
//! Reports per-file progress during `vault upload` so users see which files
//! were stored and which failed. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// A single progress event for an upload.
#[derive(Clone, Debug)]
pub enum UploadProgressEvent {
    /// A file was queued for reading.
    Queued { path: PathBuf },
    /// A file was read and inserted; `n` of `total` files are finished.
    Stored {
        name: String,
        id: i64,
        n: u64,
        total: u64,
    },
    /// A file could not be read or inserted; `n` of `total` files are finished.
    Failed {
        path: PathBuf,
        message: String,
        n: u64,
        total: u64,
    },
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the upload loop.
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload  stored  3 / 10  photo.png (#42)".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Queued { path } => {
                format!("upload  queued  {}\n", path.display())
            }
            UploadProgressEvent::Stored { name, id, n, total } => {
                format!(
                    "upload  stored  {} / {}  {} (#{})\n",
                    format_number(*n),
                    format_number(*total),
                    name,
                    id
                )
            }
            UploadProgressEvent::Failed {
                path,
                message,
                n,
                total,
            } => format!(
                "upload  failed  {} / {}  {}: {}\n",
                format_number(*n),
                format_number(*total),
                path.display(),
                message
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let obj = match &event {
            UploadProgressEvent::Queued { path } => serde_json::json!({
                "event": "progress",
                "phase": "queued",
                "path": path.display().to_string(),
            }),
            UploadProgressEvent::Stored { name, id, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "stored",
                "name": name,
                "id": id,
                "n": n,
                "total": total
            }),
            UploadProgressEvent::Failed {
                path,
                message,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "failed",
                "path": path.display().to_string(),
                "error": message,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "Unknown progress mode: '{}'. Use off, human, or json.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_progress_mode() {
        assert_eq!("json".parse::<ProgressMode>().unwrap(), ProgressMode::Json);
        assert_eq!("OFF".parse::<ProgressMode>().unwrap(), ProgressMode::Off);
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
