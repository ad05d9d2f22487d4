//! Shared test utilities for the simple-index test suite.
//!
//! Builders write small gallery documents into a temp content directory;
//! lookups find records by directory name and panic with the available
//! names on a miss.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_document(tmp.path(), "a", "Alpha", &[("author", "Zed")]);
//! let report = scan(tmp.path(), "content", ScanErrorPolicy::Abort).unwrap();
//! assert_eq!(find_record(&report.records, "a").author, "Zed");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::types::FileRecord;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `<root>/<dir>/index.html` with a title and the given `<meta>` pairs.
///
/// Returns the path of the written document.
pub fn write_document(root: &Path, dir: &str, title: &str, metas: &[(&str, &str)]) -> PathBuf {
    let dir_path = root.join(dir);
    fs::create_dir_all(&dir_path).unwrap();

    let meta_tags: String = metas
        .iter()
        .map(|(name, content)| format!(r#"<meta name="{name}" content="{content}">"#))
        .collect();
    let html = format!(
        "<!DOCTYPE html><html><head><title>{title}</title>{meta_tags}</head>\
         <body><h1>{title}</h1></body></html>"
    );

    let path = dir_path.join("index.html");
    fs::write(&path, html).unwrap();
    path
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(time))
        .unwrap();
}

// =========================================================================
// Record lookups
// =========================================================================

/// Find a record by directory name. Panics if not found.
pub fn find_record<'a>(records: &'a [FileRecord], dir: &str) -> &'a FileRecord {
    records.iter().find(|r| r.dir == dir).unwrap_or_else(|| {
        let dirs = record_dirs(records);
        panic!("record '{dir}' not found. Available: {dirs:?}")
    })
}

/// All record directory names in order.
pub fn record_dirs(records: &[FileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.dir.as_str()).collect()
}
