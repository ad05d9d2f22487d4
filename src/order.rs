//! Record ordering.
//!
//! The index page lists entries in one of four orders, all ascending and all
//! stable: records that tie on the key keep their scan order.
//!
//! Each record's keyword list is sorted as a side effect, so keyword chips
//! render alphabetically regardless of the chosen order.

use crate::types::FileRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort key for the index page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum OrderBy {
    /// Oldest modification time first; entries without a timestamp lead
    #[default]
    LastModified,
    /// Document title, case-sensitive
    Title,
    /// Author name; documents without an author lead
    Author,
    /// Subdirectory name
    DirectoryName,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderBy::LastModified => "last_modified",
            OrderBy::Title => "title",
            OrderBy::Author => "author",
            OrderBy::DirectoryName => "directory_name",
        })
    }
}

/// Sort keywords inside every record, then sort the records by `key`.
pub fn order_records(mut records: Vec<FileRecord>, key: OrderBy) -> Vec<FileRecord> {
    for record in &mut records {
        record.keywords.sort();
    }

    match key {
        OrderBy::LastModified => records.sort_by_key(|r| r.last_modified_raw),
        OrderBy::Title => records.sort_by(|a, b| a.name.cmp(&b.name)),
        OrderBy::Author => records.sort_by(|a, b| a.author.cmp(&b.author)),
        OrderBy::DirectoryName => records.sort_by(|a, b| a.dir.cmp(&b.dir)),
    }
    records
}
