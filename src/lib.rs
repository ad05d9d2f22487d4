//! # Simple Index
//!
//! Builds a single static index page for a folder of independently written
//! HTML pages. Each page lives in its own subdirectory as `index.html`; its
//! `<title>` and `<meta>` tags become an entry on the index.
//!
//! # Architecture: One Run, Five Stages
//!
//! ```text
//! 1. Validate   content dir below the working dir, staticfiles/ free
//! 2. Palette    preset or custom palette + per-slot overrides
//! 3. Scan       content/*/index.html  →  records
//! 4. Order      records sorted by one key, keywords sorted in place
//! 5. Render     index.html + staticfiles/{index.css, main_image.svg, filelist.js}
//! ```
//!
//! The page itself is a shell: `staticfiles/filelist.js` assigns the records to
//! `FILE_LIST` and a small script renders them. Everything written is static
//! and works from any file server.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Runs the stages; directory checks and overwrite confirmation |
//! | [`scan`] | Walks the content directory one level deep and builds records |
//! | [`metadata`] | Pulls title, keywords, description and author out of a document |
//! | [`order`] | The four sort orders |
//! | [`palette`] | Preset and custom palettes, hex parsing, color overrides |
//! | [`generate`] | Renders the templates and writes the output files |
//! | [`config`] | `simple-index.toml` loading, merging and validation |
//! | [`testdata`] | Random documents for trying out the page |
//! | [`types`] | `FileRecord` and `Keywords`, as serialized into the file list |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! The page, stylesheet and icon are [minijinja] templates so a site can ship
//! its own look with `template_dir` and no rebuild. The built-in set is
//! compiled into the binary. HTML auto-escaping is on for every template.
//!
//! ## Forgiving Parsing
//!
//! Documents are parsed with `scraper` (html5ever), which never rejects markup.
//! The only hard requirement on a document is a non-empty `<title>`.

pub mod config;
pub mod generate;
pub mod metadata;
pub mod order;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod scan;
pub mod testdata;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
