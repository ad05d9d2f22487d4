//! Content directory scanning.
//!
//! Stage 1 of the build. Reads one level of the content directory and turns
//! every subdirectory holding an `index.html` into a [`FileRecord`].
//!
//! ## Directory Structure
//!
//! ```text
//! content/                      # Content root (given with -d)
//! ├── 2019-poster/
//! │   ├── index.html            # → one record, dir = "2019-poster"
//! │   └── style.css             # ignored
//! ├── notes/
//! │   └── index.html            # → one record, dir = "notes"
//! ├── drafts/                   # no index.html → skipped silently
//! │   └── todo.txt
//! └── README.md                 # not a directory → ignored
//! ```
//!
//! Nested directories are never visited. Subdirectories are scanned in file
//! name order, which is also the tie-break order for the ordering stage.
//!
//! ## Record fields from the filesystem
//!
//! - `url`: the content directory exactly as the user typed it, joined with
//!   the subdirectory name and `index.html` using `/`
//! - `dir`: the subdirectory name
//! - `last_modified_raw` / `last_modified_formatted`: from a stat of
//!   `index.html`. If the stat fails the record is kept without them and a
//!   warning is logged.
//!
//! ## Failure policy
//!
//! A document without a usable title aborts the scan under
//! [`ScanErrorPolicy::Abort`] (the default). Under [`ScanErrorPolicy::Skip`]
//! the document is left out, listed in [`ScanReport::skipped`], and the scan
//! goes on.

use crate::metadata::{self, ExtractError};
use crate::types::FileRecord;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

pub const DOCUMENT_FILENAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot list content directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("Cannot read {path}: {source}")]
    ReadDocument { path: PathBuf, source: io::Error },
    #[error("No usable <title> in {0}")]
    MissingTitle(PathBuf),
}

/// What to do with a document that cannot be turned into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorPolicy {
    /// Stop the build on the first bad document
    #[default]
    Abort,
    /// Leave bad documents out and report them
    Skip,
}

/// A document left out under [`ScanErrorPolicy::Skip`].
#[derive(Debug)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub error: ScanError,
}

/// Scan stage output, in scan order.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<FileRecord>,
    pub skipped: Vec<SkippedDocument>,
}

/// Scan `content_root` one level deep.
///
/// `url_base` is the content directory as the user wrote it; it prefixes every
/// record's `url` so links resolve relative to the working directory.
pub fn scan(
    content_root: &Path,
    url_base: &str,
    policy: ScanErrorPolicy,
) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();

    for dir in collect_subdirs(content_root)? {
        let index_path = dir.join(DOCUMENT_FILENAME);
        if !index_path.is_file() {
            debug!(dir = %dir.display(), "no {DOCUMENT_FILENAME}, skipping");
            continue;
        }

        match read_record(&dir, &index_path, url_base) {
            Ok(record) => {
                debug!(dir = %record.dir, title = %record.name, "document found");
                report.records.push(record);
            }
            Err(error) if policy == ScanErrorPolicy::Skip => {
                warn!(path = %index_path.display(), "skipping document: {error}");
                report.skipped.push(SkippedDocument {
                    path: index_path,
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(report)
}

/// Immediate subdirectories of `root`, sorted by name.
fn collect_subdirs(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let read_dir = |source| ScanError::ReadDir {
        path: root.to_path_buf(),
        source,
    };
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(read_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    dirs.sort();
    Ok(dirs)
}

fn read_record(dir: &Path, index_path: &Path, url_base: &str) -> Result<FileRecord, ScanError> {
    let bytes = fs::read(index_path).map_err(|source| ScanError::ReadDocument {
        path: index_path.to_path_buf(),
        source,
    })?;
    let html = String::from_utf8_lossy(&bytes);

    let meta = metadata::extract_str(&html).map_err(|e| match e {
        ExtractError::MissingTitle => ScanError::MissingTitle(index_path.to_path_buf()),
    })?;

    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let (last_modified_raw, last_modified_formatted) = match modified_time(index_path) {
        Ok(time) => {
            let (raw, formatted) = format_timestamp(time);
            (Some(raw), Some(formatted))
        }
        Err(e) => {
            warn!(path = %index_path.display(), "cannot read modification time: {e}");
            (None, None)
        }
    };

    Ok(FileRecord {
        name: meta.name,
        keywords: meta.keywords,
        description: meta.description,
        author: meta.author,
        url: document_url(url_base, &dir_name),
        dir: dir_name,
        last_modified_formatted,
        last_modified_raw,
    })
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Epoch seconds plus an `asctime`-style local rendering:
/// `Sun Oct  5 09:05:03 2026`.
pub fn format_timestamp(time: SystemTime) -> (i64, String) {
    let local: DateTime<Local> = time.into();
    (
        local.timestamp(),
        local.format("%a %b %e %H:%M:%S %Y").to_string(),
    )
}

/// `<url_base>/<dir>/index.html`, always with forward slashes.
pub fn document_url(url_base: &str, dir: &str) -> String {
    let base = url_base.trim_end_matches(['/', '\\']);
    if base.is_empty() {
        format!("{dir}/{DOCUMENT_FILENAME}")
    } else {
        format!("{base}/{dir}/{DOCUMENT_FILENAME}")
    }
}
