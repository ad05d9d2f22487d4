//! Synthetic gallery documents for trying out layouts and palettes.
//!
//! `simple-index build --test-data 40` writes forty small documents into the
//! content directory before scanning, as `staticpage0/index.html`,
//! `staticpage1/index.html`, and so on. Each one has a random sentence for a
//! title, zero to six keywords, a random paragraph as description and a random
//! author, so every card variant shows up on the page: with and without
//! keywords, short and long descriptions, and the occasional empty one.
//!
//! Existing `staticpageN` directories are reused and their documents replaced.

use maud::{DOCTYPE, html};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WORDS: &[&str] = &[
    "amber", "anchor", "atlas", "autumn", "beacon", "birch", "canvas", "cedar", "cinder",
    "cobalt", "comet", "copper", "coral", "delta", "drift", "echo", "ember", "fable", "fern",
    "field", "flint", "frost", "garden", "glacier", "harbor", "hollow", "horizon", "indigo",
    "island", "juniper", "lantern", "lichen", "marble", "meadow", "mirror", "monsoon", "moss",
    "nebula", "north", "orbit", "orchard", "paper", "pebble", "prism", "quartz", "quiet",
    "raven", "river", "saffron", "signal", "silver", "slate", "summit", "thistle", "tide",
    "timber", "umber", "valley", "velvet", "willow", "winter", "zenith",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Amir", "Beatrix", "Chen", "Dario", "Elena", "Farah", "Gustav", "Hana", "Ines",
    "Jonas", "Kofi", "Lena", "Mateo", "Noor", "Oskar", "Priya", "Rafael", "Sofia", "Tomas",
];

const LAST_NAMES: &[&str] = &[
    "Abebe", "Bergström", "Castillo", "Dubois", "Eriksen", "Fischer", "García", "Haddad",
    "Ivanova", "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov",
    "Quinn", "Rossi", "Sato", "Tanaka",
];

#[derive(Error, Debug)]
#[error("Cannot write test document {path}: {source}")]
pub struct TestDataError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// One randomly generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticDocument {
    pub title: String,
    pub keywords: Vec<String>,
    pub description: String,
    pub author: String,
}

impl SyntheticDocument {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let keyword_count = rng.gen_range(0..=6);
        let sentence_count = rng.gen_range(0..=10);
        Self {
            title: sentence(rng),
            keywords: (0..keyword_count).map(|_| word(rng).to_string()).collect(),
            description: (0..sentence_count)
                .map(|_| sentence(rng))
                .collect::<Vec<_>>()
                .join(" "),
            author: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
        }
    }

    pub fn to_html(&self) -> String {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    meta name="keywords" content=(self.keywords.join(", "));
                    meta name="description" content=(self.description);
                    meta name="author" content=(self.author);
                }
                body {
                    main {
                        h1 { (self.title) }
                        @if !self.description.is_empty() {
                            p { (self.description) }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

/// Write `count` random documents into `content_dir`.
///
/// Returns the paths of the written `index.html` files.
pub fn generate<R: Rng + ?Sized>(
    content_dir: &Path,
    count: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>, TestDataError> {
    let mut written = Vec::with_capacity(count);
    for i in 0..count {
        let dir = content_dir.join(format!("staticpage{i}"));
        let path = dir.join("index.html");
        let document = SyntheticDocument::random(rng);

        fs::create_dir_all(&dir)
            .and_then(|()| fs::write(&path, document.to_html()))
            .map_err(|source| TestDataError {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&'static str]) -> &'static str {
    list.choose(rng).copied().unwrap_or("")
}

fn word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, WORDS)
}

/// 4–9 words, capitalized, with a full stop.
fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=9);
    let words: Vec<&str> = (0..len).map(|_| word(rng)).collect();
    let text = words.join(" ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
