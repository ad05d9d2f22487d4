//! Shared types passed between the scan, order and generate stages.
//!
//! [`FileRecord`] is also the wire format of `staticfiles/filelist.js`, so its
//! field order and serialized shape are what the client script reads.

use serde::{Serialize, Serializer};

/// Keywords of one document.
///
/// `None` is the "no keywords" marker. It is kept distinct from an empty list
/// and serializes as `""` because the page script tests `keywords === ''`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keywords {
    #[default]
    None,
    List(Vec<String>),
}

impl Keywords {
    /// Build from the raw `content` attribute of `<meta name="keywords">`.
    ///
    /// Tokens are comma-split and trimmed. A split that yields nothing but
    /// empty tokens (`""`, `","`, `" , "`) collapses to [`Keywords::None`].
    pub fn parse(content: &str) -> Self {
        let tokens: Vec<String> = content.split(',').map(|t| t.trim().to_string()).collect();
        if tokens.iter().all(String::is_empty) {
            Keywords::None
        } else {
            Keywords::List(tokens)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Keywords::None)
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            Keywords::None => &[],
            Keywords::List(list) => list,
        }
    }

    /// Sort the list in place. The marker stays a marker.
    pub fn sort(&mut self) {
        if let Keywords::List(list) = self {
            list.sort();
        }
    }
}

impl Serialize for Keywords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Keywords::None => serializer.serialize_str(""),
            Keywords::List(list) => list.serialize(serializer),
        }
    }
}

/// Metadata for one `<content_dir>/<dir>/index.html` document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FileRecord {
    /// Trimmed `<title>` text
    pub name: String,
    pub keywords: Keywords,
    pub description: String,
    pub author: String,
    /// `<content_dir>/<dir>/index.html`, as typed by the user
    pub url: String,
    /// Subdirectory name
    pub dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_formatted: Option<String>,
    /// Seconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_raw: Option<i64>,
}
