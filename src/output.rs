//! CLI output formatting for `build` and `check`.
//!
//! # Information-First Display
//!
//! Each entry is shown by what a reader of the index page sees: its position
//! and title. The document path, author, keywords and modification time follow
//! as indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Entries (by author)
//! 001 Beta
//!     Source: content/b/index.html
//!     Author: Amy
//!     Keywords: art, paper
//!     Modified: Sun Oct  5 09:05:03 2026
//! 002 Alpha
//!     Source: content/a/index.html
//!     Author: Zed
//!
//! Skipped
//!     content/z/index.html: No usable <title> in content/z/index.html
//! ```
//!
//! ## Build
//!
//! The check inventory, followed by the written files:
//!
//! ```text
//! Palette color_palette_4
//!     head #ffffff  body #393e46  text #76ead7  accent #ffffff
//!
//! Output
//!     Replaced existing staticfiles/
//!     index.html
//!     staticfiles/index.css
//!     staticfiles/main_image.svg
//!     staticfiles/filelist.js
//!     staticfiles/ (3 assets)
//!
//! Generated 2 entries
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` and do no I/O; `print_*` wrappers
//! write them to stdout.

use crate::generate::OUTPUT_DIR;
use crate::order::OrderBy;
use crate::palette::PaletteEntry;
use crate::pipeline::{BuildSummary, CheckSummary};
use crate::scan::SkippedDocument;
use crate::types::FileRecord;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `base` when possible.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Header plus context lines for one record.
fn record_lines(index: usize, record: &FileRecord) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), record.name)];
    let ctx = indent(1);
    lines.push(format!("{ctx}Source: {}", record.url));
    if !record.author.is_empty() {
        lines.push(format!("{ctx}Author: {}", record.author));
    }
    if !record.keywords.is_none() {
        let keywords = record.keywords.as_slice().join(", ");
        lines.push(format!("{ctx}Keywords: {keywords}"));
    }
    if let Some(modified) = &record.last_modified_formatted {
        lines.push(format!("{ctx}Modified: {modified}"));
    }
    lines
}

/// Numbered entries followed by any skipped documents.
pub fn format_records(
    records: &[FileRecord],
    skipped: &[SkippedDocument],
    order_by: OrderBy,
) -> Vec<String> {
    let mut lines = vec![format!("Entries (by {order_by})")];
    if records.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, record) in records.iter().enumerate() {
        lines.extend(record_lines(i + 1, record));
    }

    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for doc in skipped {
            lines.push(format!("{}{}: {}", indent(1), doc.path.display(), doc.error));
        }
    }
    lines
}

pub fn format_check_output(summary: &CheckSummary) -> Vec<String> {
    format_records(&summary.records, &summary.skipped, summary.order_by)
}

pub fn print_check_output(summary: &CheckSummary) {
    for line in format_check_output(summary) {
        println!("{}", line);
    }
}

fn palette_lines(name: &str, palette: &PaletteEntry) -> Vec<String> {
    vec![
        format!("Palette {name}"),
        format!(
            "{}head {}  body {}  text {}  accent {}",
            indent(1),
            palette.head.hex(),
            palette.body.hex(),
            palette.text_1.hex(),
            palette.text_2.hex()
        ),
    ]
}

pub fn format_build_output(summary: &BuildSummary, work_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !summary.test_documents.is_empty() {
        lines.push(format!(
            "Wrote {} into {}",
            plural(summary.test_documents.len(), "test document", "test documents"),
            summary.content_dir.display()
        ));
        lines.push(String::new());
    }

    lines.extend(format_records(
        &summary.records,
        &summary.skipped,
        summary.order_by,
    ));
    lines.push(String::new());
    lines.extend(palette_lines(&summary.palette_name, &summary.palette));
    lines.push(String::new());

    let generated = &summary.generated;
    lines.push("Output".to_string());
    if summary.replaced_output {
        lines.push(format!("{}Replaced existing {OUTPUT_DIR}/", indent(1)));
    }
    for path in [
        &generated.page,
        &generated.stylesheet,
        &generated.icon,
        &generated.file_list,
    ] {
        lines.push(format!("{}{}", indent(1), display_path(path, work_dir)));
    }
    lines.push(format!(
        "{}{}/ ({})",
        indent(1),
        OUTPUT_DIR,
        plural(generated.assets.copied.len(), "asset", "assets")
    ));
    for failure in &generated.assets.failures {
        lines.push(format!("{}Failed: {failure}", indent(2)));
    }
    lines.push(String::new());

    lines.push(format!(
        "Generated {}",
        plural(generated.record_count, "entry", "entries")
    ));
    lines
}

pub fn print_build_output(summary: &BuildSummary, work_dir: &Path) {
    for line in format_build_output(summary, work_dir) {
        println!("{}", line);
    }
}
