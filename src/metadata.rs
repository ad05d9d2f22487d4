//! Document metadata extraction.
//!
//! Every gallery entry is an ordinary HTML document. Its card on the index
//! page is built from four pieces of the document head:
//!
//! | Field         | Source                                  | Missing      |
//! |---------------|-----------------------------------------|--------------|
//! | `name`        | first `<title>` text, trimmed           | error        |
//! | `keywords`    | `<meta name="keywords">`, comma-split   | no-keywords  |
//! | `description` | `<meta name="description">`, trimmed    | `""`         |
//! | `author`      | `<meta name="author">`, trimmed         | `""`         |
//!
//! When a meta name appears more than once the last occurrence wins.
//! A matching `<meta>` without a `content` attribute counts as empty content.
//!
//! ## Parsing tolerance
//!
//! Documents are parsed with html5ever (through `scraper`), which recovers
//! from unclosed tags, stray end tags and a missing doctype the same way a
//! browser does. Parsing itself never fails; only a missing title does.

use crate::types::Keywords;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector must parse"));
static NAMED_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name]").expect("static selector must parse"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("document has no <title>, or its title is empty")]
    MissingTitle,
}

/// The head-derived part of a [`FileRecord`](crate::types::FileRecord).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub name: String,
    pub keywords: Keywords,
    pub description: String,
    pub author: String,
}

/// Parse `html` leniently and extract its metadata.
pub fn extract_str(html: &str) -> Result<DocumentMetadata, ExtractError> {
    extract(&Html::parse_document(html))
}

/// Extract metadata from an already parsed document.
pub fn extract(document: &Html) -> Result<DocumentMetadata, ExtractError> {
    let name = document
        .select(&TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(ExtractError::MissingTitle)?;

    let mut keywords = None;
    let mut description = None;
    let mut author = None;

    for meta in document.select(&NAMED_META) {
        let element = meta.value();
        let content = element.attr("content").unwrap_or("");
        match element.attr("name") {
            Some("keywords") => keywords = Some(Keywords::parse(content)),
            Some("description") => description = Some(content.trim().to_string()),
            Some("author") => author = Some(content.trim().to_string()),
            _ => {}
        }
    }

    Ok(DocumentMetadata {
        name,
        keywords: keywords.unwrap_or_default(),
        description: description.unwrap_or_default(),
        author: author.unwrap_or_default(),
    })
}
