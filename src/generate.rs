//! Index page generation.
//!
//! Final stage of the build. Takes the ordered records and the resolved
//! palette and writes the page, its stylesheet and icon, the client script,
//! and the data file the script reads.
//!
//! ## Output Structure
//!
//! ```text
//! ./                              # working directory
//! ├── index.html                  # index.html.jinja
//! └── staticfiles/
//!     ├── index.css               # index.css.jinja
//!     ├── main_image.svg          # main_image.svg.jinja
//!     ├── index.js                # built-in client script
//!     ├── filelist.js             # var FILE_LIST = [ ...records... ]
//!     └── ...                     # files from assets_dir, if configured
//! ```
//!
//! ## Templates
//!
//! The three templates are rendered with [minijinja]. Every template sees the
//! eight palette variables (`color_page_head_hex`, `color_page_head_rgb`, ...)
//! and `page` (`title`, `description`, `footer`). HTML auto-escaping is on for
//! all three, whatever their extension, so palette or page text cannot inject
//! markup.
//!
//! The built-in templates are compiled into the binary. A configured template
//! directory replaces them wholesale; a template missing from it fails the
//! build with the template's name and the file it was to be rendered into.
//!
//! ## Failure handling
//!
//! Copying static assets is best-effort: failures are logged and generation
//! continues. Failing to render a template or write an output file aborts.
//! Files already written are left in place.

use crate::config::PageConfig;
use crate::palette::PaletteEntry;
use crate::types::FileRecord;
use minijinja::{AutoEscape, Environment, path_loader};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const OUTPUT_DIR: &str = "staticfiles";
pub const PAGE_TEMPLATE: &str = "index.html.jinja";
pub const STYLESHEET_TEMPLATE: &str = "index.css.jinja";
pub const ICON_TEMPLATE: &str = "main_image.svg.jinja";
pub const FILE_LIST: &str = "filelist.js";
pub const FILE_LIST_VARIABLE: &str = "FILE_LIST";

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    (PAGE_TEMPLATE, include_str!("../templates/index.html.jinja")),
    (
        STYLESHEET_TEMPLATE,
        include_str!("../templates/index.css.jinja"),
    ),
    (ICON_TEMPLATE, include_str!("../templates/main_image.svg.jinja")),
];

const BUILTIN_ASSETS: [(&str, &str); 1] = [("index.js", include_str!("../static/index.js"))];

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Template {name}: {source}")]
    Template {
        name: String,
        source: minijinja::Error,
    },
    #[error("Template {name} (rendering {path}): {source}")]
    Render {
        name: String,
        path: PathBuf,
        source: minijinja::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Variables visible to every template.
#[derive(Serialize)]
struct TemplateContext<'a> {
    #[serde(flatten)]
    palette: &'a PaletteEntry,
    page: &'a PageConfig,
}

/// The three named templates, ready to render.
pub struct Templates {
    env: Environment<'static>,
    source: TemplateSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Builtin,
    Directory(PathBuf),
}

impl Templates {
    /// Templates compiled into the binary.
    pub fn builtin() -> Result<Self, GenerateError> {
        let mut env = escaping_env();
        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source)
                .map_err(|source| GenerateError::Template {
                    name: name.to_string(),
                    source,
                })?;
        }
        Ok(Self {
            env,
            source: TemplateSource::Builtin,
        })
    }

    /// Templates loaded lazily from `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let mut env = escaping_env();
        env.set_loader(path_loader(dir.to_path_buf()));
        Self {
            env,
            source: TemplateSource::Directory(dir.to_path_buf()),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String, minijinja::Error> {
        let mut rendered = self.env.get_template(name)?.render(context)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

fn escaping_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

/// Files produced by [`generate`].
#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub page: PathBuf,
    pub stylesheet: PathBuf,
    pub icon: PathBuf,
    pub file_list: PathBuf,
    pub assets: AssetReport,
    pub record_count: usize,
}

/// Outcome of the best-effort asset copy.
#[derive(Debug, Default)]
pub struct AssetReport {
    pub copied: Vec<PathBuf>,
    pub failures: Vec<String>,
}

/// Write the index page and everything in `staticfiles/` under `work_dir`.
pub fn generate(
    work_dir: &Path,
    records: &[FileRecord],
    palette: &PaletteEntry,
    page: &PageConfig,
    templates: &Templates,
    assets_dir: Option<&Path>,
) -> Result<GenerateSummary, GenerateError> {
    let output_dir = work_dir.join(OUTPUT_DIR);
    fs::create_dir_all(&output_dir).map_err(|source| GenerateError::Write {
        path: output_dir.clone(),
        source,
    })?;

    info!(dir = %output_dir.display(), "copying static assets");
    let assets = copy_assets(&output_dir, assets_dir);

    let context = TemplateContext { palette, page };
    let targets = [
        (PAGE_TEMPLATE, work_dir.join("index.html")),
        (STYLESHEET_TEMPLATE, output_dir.join("index.css")),
        (ICON_TEMPLATE, output_dir.join("main_image.svg")),
    ];
    for (name, path) in &targets {
        let rendered = templates
            .render(name, &context)
            .map_err(|source| GenerateError::Render {
                name: name.to_string(),
                path: path.clone(),
                source,
            })?;
        write_file(path, &rendered)?;
        debug!(template = *name, path = %path.display(), "rendered");
    }

    let file_list = output_dir.join(FILE_LIST);
    info!(path = %file_list.display(), records = records.len(), "writing file list");
    write_file(&file_list, &render_file_list(records)?)?;

    let [page_path, stylesheet, icon] = targets.map(|(_, path)| path);
    Ok(GenerateSummary {
        page: page_path,
        stylesheet,
        icon,
        file_list,
        assets,
        record_count: records.len(),
    })
}

/// `var FILE_LIST = [...]` with the records as 4-space-indented JSON.
pub fn render_file_list(records: &[FileRecord]) -> Result<String, GenerateError> {
    let mut json = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
    records.serialize(&mut serializer)?;
    Ok(format!(
        "var {FILE_LIST_VARIABLE} = {}\n",
        String::from_utf8_lossy(&json)
    ))
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenerateError> {
    fs::write(path, contents).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the built-in client script and copy `assets_dir` into `output_dir`.
///
/// Never fails; every problem is logged and listed in the report.
pub fn copy_assets(output_dir: &Path, assets_dir: Option<&Path>) -> AssetReport {
    let mut report = AssetReport::default();

    for (name, contents) in BUILTIN_ASSETS {
        let path = output_dir.join(name);
        match fs::write(&path, contents) {
            Ok(()) => report.copied.push(path),
            Err(e) => report.fail(format!("{}: {e}", path.display())),
        }
    }

    let Some(src) = assets_dir else {
        return report;
    };
    if same_dir(src, output_dir) {
        report.fail(format!(
            "{}: source and destination are the same directory",
            src.display()
        ));
        return report;
    }

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.fail(format!("{}: {e}", src.display()));
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let dst = output_dir.join(rel);
        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&dst)
        } else {
            fs::copy(entry.path(), &dst).map(|_| ())
        };
        match result {
            Ok(()) if entry.file_type().is_dir() => {}
            Ok(()) => report.copied.push(dst),
            Err(e) => report.fail(format!("{}: {e}", entry.path().display())),
        }
    }

    report
}

impl AssetReport {
    fn fail(&mut self, message: String) {
        warn!("asset copy failed: {message}");
        self.failures.push(message);
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{ColorOverrides, PaletteRegistry};
    use crate::types::Keywords;
    use tempfile::TempDir;

    fn palette(name: &str) -> PaletteEntry {
        PaletteRegistry::with_presets()
            .resolve(name, &ColorOverrides::default())
            .unwrap()
    }

    fn record(dir: &str, name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            keywords: Keywords::List(vec!["a".into(), "b".into()]),
            description: "desc".to_string(),
            author: "Amy".to_string(),
            url: format!("content/{dir}/index.html"),
            dir: dir.to_string(),
            last_modified_formatted: Some("Thu Jan  1 00:00:10 1970".to_string()),
            last_modified_raw: Some(10),
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    // =========================================================================
    // File list
    // =========================================================================

    #[test]
    fn file_list_is_variable_assignment() {
        let js = render_file_list(&[record("a", "Alpha")]).unwrap();
        assert!(js.starts_with("var FILE_LIST = [\n    {\n"));

        let json = js.trim_start_matches("var FILE_LIST = ");
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value[0]["name"], "Alpha");
        assert_eq!(value[0]["last_modified_raw"], 10);
        assert_eq!(value[0]["keywords"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn file_list_preserves_order() {
        let js = render_file_list(&[record("b", "Beta"), record("a", "Alpha")]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(js.trim_start_matches("var FILE_LIST = ")).unwrap();
        assert_eq!(value[0]["dir"], "b");
        assert_eq!(value[1]["dir"], "a");
    }

    #[test]
    fn empty_file_list() {
        assert_eq!(render_file_list(&[]).unwrap(), "var FILE_LIST = []\n");
    }

    // =========================================================================
    // Templates
    // =========================================================================

    #[test]
    fn builtin_templates_compile() {
        let templates = Templates::builtin().unwrap();
        assert_eq!(templates.source(), &TemplateSource::Builtin);
    }

    #[test]
    fn stylesheet_uses_palette() {
        let templates = Templates::builtin().unwrap();
        let p = palette("color_palette_1");
        let css = templates
            .render(
                STYLESHEET_TEMPLATE,
                &TemplateContext {
                    palette: &p,
                    page: &PageConfig::default(),
                },
            )
            .unwrap();
        assert!(css.contains("--color-page-head: #717171;"));
        assert!(css.contains("rgba(137, 57, 168, 0.7)"));
    }

    #[test]
    fn page_text_is_escaped() {
        let templates = Templates::builtin().unwrap();
        let p = palette("color_palette_4");
        let page = PageConfig {
            title: "<script>alert(1)</script>".to_string(),
            ..Default::default()
        };
        let html = templates
            .render(
                PAGE_TEMPLATE,
                &TemplateContext {
                    palette: &p,
                    page: &page,
                },
            )
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn custom_template_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(STYLESHEET_TEMPLATE),
            "body { color: {{ color_page_text_2_hex }}; } /* {{ page.footer }} */",
        )
        .unwrap();
        let templates = Templates::from_dir(tmp.path());
        let p = palette("color_palette_1");
        let page = PageConfig {
            footer: "a & b".to_string(),
            ..Default::default()
        };
        let css = templates
            .render(
                STYLESHEET_TEMPLATE,
                &TemplateContext {
                    palette: &p,
                    page: &page,
                },
            )
            .unwrap();
        assert!(css.contains("color: #000000;"));
        assert!(css.contains("a &amp; b"));
    }

    #[test]
    fn missing_template_names_template() {
        let tmp = TempDir::new().unwrap();
        let templates = Templates::from_dir(tmp.path());
        let p = palette("color_palette_1");
        let err = templates
            .render(
                ICON_TEMPLATE,
                &TemplateContext {
                    palette: &p,
                    page: &PageConfig::default(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), minijinja::ErrorKind::TemplateNotFound);
        assert!(err.to_string().contains(ICON_TEMPLATE));
    }

    // =========================================================================
    // generate()
    // =========================================================================

    #[test]
    fn generate_writes_all_outputs() {
        let tmp = TempDir::new().unwrap();
        let templates = Templates::builtin().unwrap();
        let summary = generate(
            tmp.path(),
            &[record("a", "Alpha")],
            &palette("color_palette_2"),
            &PageConfig::default(),
            &templates,
            None,
        )
        .unwrap();

        assert_eq!(summary.page, tmp.path().join("index.html"));
        assert!(read(&summary.page).contains("staticfiles/filelist.js"));
        assert!(read(&summary.stylesheet).contains("#616161"));
        assert!(read(&summary.icon).starts_with("<svg"));
        assert!(read(&summary.file_list).contains("\"Alpha\""));
        assert!(tmp.path().join("staticfiles/index.js").is_file());
        assert_eq!(summary.record_count, 1);
        assert!(summary.assets.failures.is_empty());
    }

    #[test]
    fn generate_fails_on_missing_template() {
        let tmp = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        let templates = Templates::from_dir(empty.path());
        let result = generate(
            tmp.path(),
            &[],
            &palette("color_palette_1"),
            &PageConfig::default(),
            &templates,
            None,
        );
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Render { ref name, ref path, .. }
                if name == PAGE_TEMPLATE && *path == tmp.path().join("index.html")
        ));
        let message = err.to_string();
        assert!(message.contains(PAGE_TEMPLATE));
        assert!(message.contains("index.html"));
        assert!(message.contains(&tmp.path().display().to_string()));
    }

    #[test]
    fn assets_dir_copied_recursively() {
        let out = TempDir::new().unwrap();
        let assets = TempDir::new().unwrap();
        fs::create_dir_all(assets.path().join("fonts")).unwrap();
        fs::write(assets.path().join("logo.png"), "png").unwrap();
        fs::write(assets.path().join("fonts/a.woff2"), "font").unwrap();

        let report = copy_assets(out.path(), Some(assets.path()));
        assert!(report.failures.is_empty());
        assert!(out.path().join("logo.png").is_file());
        assert!(out.path().join("fonts/a.woff2").is_file());
        assert_eq!(report.copied.len(), 3);
    }

    #[test]
    fn missing_assets_dir_is_not_fatal() {
        let out = TempDir::new().unwrap();
        let report = copy_assets(out.path(), Some(&out.path().join("nope")));
        assert_eq!(report.failures.len(), 1);
        assert!(out.path().join("index.js").is_file());
    }

    #[test]
    fn assets_dir_equal_to_output_is_refused() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("keep.txt"), "keep").unwrap();
        let report = copy_assets(out.path(), Some(out.path()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(read(&out.path().join("keep.txt")), "keep");
    }
}
