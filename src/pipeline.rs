//! Build orchestration.
//!
//! Runs the stages in a fixed order, each to completion before the next:
//!
//! ```text
//! ValidatingTarget → ResolvingPalette → ScanningContent → Ordering → Rendering → Done
//!        │
//!        └─→ Aborted   (content dir missing, not below the working directory,
//!                       or existing staticfiles/ not to be overwritten)
//! ```
//!
//! Nothing is retried and nothing is rolled back. The palette is resolved
//! while validating, ahead of any change to the filesystem, so a bad palette
//! name leaves an existing `staticfiles/` and the content directory alone.
//! Scan failures happen before any output is written; a failure while
//! rendering leaves whatever was already written in place.
//!
//! ## Working directory
//!
//! The page is written to the working directory, which is an explicit input
//! ([`BuildOptions::work_dir`]) rather than the process's current directory.
//! The content directory must resolve to a directory strictly below it, since
//! every `url` in the file list is relative to the page.
//!
//! ## Overwriting `staticfiles/`
//!
//! An existing output directory is removed only after a [`Confirm`] says so.
//! The CLI passes a [`TerminalPrompt`] or a [`Fixed`] answer depending on
//! `--overwrite`.

use crate::config::{IndexConfig, PageConfig};
use crate::generate::{self, GenerateError, GenerateSummary, OUTPUT_DIR, Templates};
use crate::order::{OrderBy, order_records};
use crate::palette::{ColorOverrides, PaletteEntry, PaletteError, PaletteRegistry};
use crate::scan::{self, ScanError, ScanErrorPolicy, SkippedDocument};
use crate::testdata::{self, TestDataError};
use crate::types::FileRecord;
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Content directory {0} does not exist")]
    ContentDirMissing(PathBuf),
    #[error("Content directory {content_dir} must be inside the working directory {work_dir}")]
    NotDescendant {
        content_dir: PathBuf,
        work_dir: PathBuf,
    },
    #[error("Cannot resolve working directory {path}: {source}")]
    WorkDir { path: PathBuf, source: io::Error },
    #[error("Template directory {0} does not exist")]
    TemplateDirMissing(PathBuf),
    #[error("{0} already exists and was not overwritten")]
    OutputDirDeclined(PathBuf),
    #[error("Cannot ask about overwriting {path}: {source}")]
    Prompt { path: PathBuf, source: io::Error },
    #[error("Cannot remove {path}: {source}")]
    RemoveOutput { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Palette(#[from] PaletteError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    TestData(#[from] TestDataError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingTarget,
    ResolvingPalette,
    ScanningContent,
    Ordering,
    Rendering,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ValidatingTarget => "validating target",
            Stage::ResolvingPalette => "resolving palette",
            Stage::ScanningContent => "scanning content",
            Stage::Ordering => "ordering",
            Stage::Rendering => "rendering",
            Stage::Done => "done",
        })
    }
}

fn enter(stage: Stage) {
    info!(%stage, "stage");
}

// ============================================================================
// Overwrite confirmation
// ============================================================================

/// Decides whether an existing output directory may be deleted.
pub trait Confirm {
    fn confirm_overwrite(&mut self, dir: &Path) -> io::Result<bool>;
}

/// A fixed answer, for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub bool);

impl Confirm for Fixed {
    fn confirm_overwrite(&mut self, _dir: &Path) -> io::Result<bool> {
        Ok(self.0)
    }
}

/// Asks on a terminal (or any reader/writer pair).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm_overwrite(&mut self, dir: &Path) -> io::Result<bool> {
        write!(
            self.output,
            "{} already exists. Delete it and continue? [y/N] ",
            dir.display()
        )?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(parse_answer(&line) == Some(true))
    }
}

/// `yes`/`true`/`t`/`y`/`1` and `no`/`false`/`f`/`n`/`0`, case-insensitive.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Some(true),
        "no" | "false" | "f" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// How `--overwrite` answers the [`Confirm`] question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OverwritePolicy {
    #[default]
    Prompt,
    Always,
    Never,
}

impl OverwritePolicy {
    pub fn confirmer(self) -> Box<dyn Confirm> {
        match self {
            OverwritePolicy::Prompt => Box::new(TerminalPrompt::stdio()),
            OverwritePolicy::Always => Box::new(Fixed(true)),
            OverwritePolicy::Never => Box::new(Fixed(false)),
        }
    }
}

// ============================================================================
// Options and results
// ============================================================================

/// Everything one run needs, after config and flags are merged.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Where `index.html` and `staticfiles/` are written.
    pub work_dir: PathBuf,
    /// Content directory as given, relative to `work_dir` or absolute. Also
    /// the prefix of every record's `url`.
    pub content_dir: String,
    /// Synthetic documents to write before scanning.
    pub test_documents: usize,
    pub order_by: OrderBy,
    pub color_palette: String,
    pub colors: ColorOverrides,
    pub palettes: BTreeMap<String, ColorOverrides>,
    pub template_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub on_scan_error: ScanErrorPolicy,
    pub page: PageConfig,
}

impl BuildOptions {
    pub fn from_config(
        work_dir: impl Into<PathBuf>,
        content_dir: impl Into<String>,
        config: IndexConfig,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            content_dir: content_dir.into(),
            test_documents: 0,
            order_by: config.order_by,
            color_palette: config.color_palette,
            colors: config.colors,
            palettes: config.palettes,
            template_dir: config.template_dir,
            assets_dir: config.assets_dir,
            on_scan_error: config.on_scan_error,
            page: config.page,
        }
    }

    fn content_path(&self) -> PathBuf {
        self.work_dir.join(&self.content_dir)
    }
}

#[derive(Debug)]
pub struct BuildSummary {
    pub content_dir: PathBuf,
    pub palette_name: String,
    pub palette: PaletteEntry,
    pub order_by: OrderBy,
    pub test_documents: Vec<PathBuf>,
    pub replaced_output: bool,
    pub records: Vec<FileRecord>,
    pub skipped: Vec<SkippedDocument>,
    pub generated: GenerateSummary,
}

#[derive(Debug)]
pub struct CheckSummary {
    pub content_dir: PathBuf,
    pub order_by: OrderBy,
    pub records: Vec<FileRecord>,
    pub skipped: Vec<SkippedDocument>,
}

// ============================================================================
// Stages
// ============================================================================

/// Run the full build.
pub fn build(
    options: &BuildOptions,
    confirm: &mut dyn Confirm,
) -> Result<BuildSummary, PipelineError> {
    enter(Stage::ValidatingTarget);
    let content_dir = validate_content_dir(options)?;
    let template_dir = validate_template_dir(options)?;
    // Before anything on disk changes.
    let palette = resolve_palette(options)?;
    let replaced_output = prepare_output_dir(&options.work_dir, confirm)?;
    let test_documents = if options.test_documents > 0 {
        info!(
            count = options.test_documents,
            dir = %content_dir.display(),
            "writing test documents"
        );
        testdata::generate(&content_dir, options.test_documents, &mut rand::thread_rng())?
    } else {
        Vec::new()
    };

    enter(Stage::ResolvingPalette);
    debug!(name = %options.color_palette, head = palette.head.hex(), "using palette");

    enter(Stage::ScanningContent);
    let report = scan::scan(&content_dir, &options.content_dir, options.on_scan_error)?;
    warn_skipped(&report.skipped);

    enter(Stage::Ordering);
    let records = order_records(report.records, options.order_by);

    enter(Stage::Rendering);
    let templates = match &template_dir {
        Some(dir) => Templates::from_dir(dir),
        None => Templates::builtin()?,
    };
    let assets_dir = options.assets_dir.as_ref().map(|p| options.work_dir.join(p));
    let generated = generate::generate(
        &options.work_dir,
        &records,
        &palette,
        &options.page,
        &templates,
        assets_dir.as_deref(),
    )?;

    enter(Stage::Done);
    Ok(BuildSummary {
        content_dir,
        palette_name: options.color_palette.clone(),
        palette,
        order_by: options.order_by,
        test_documents,
        replaced_output,
        records,
        skipped: report.skipped,
        generated,
    })
}

/// Validate, scan and order without writing anything.
pub fn check(options: &BuildOptions) -> Result<CheckSummary, PipelineError> {
    enter(Stage::ValidatingTarget);
    let content_dir = validate_content_dir(options)?;
    validate_template_dir(options)?;

    enter(Stage::ResolvingPalette);
    resolve_palette(options)?;

    enter(Stage::ScanningContent);
    let report = scan::scan(&content_dir, &options.content_dir, options.on_scan_error)?;
    warn_skipped(&report.skipped);

    enter(Stage::Ordering);
    let records = order_records(report.records, options.order_by);

    Ok(CheckSummary {
        content_dir,
        order_by: options.order_by,
        records,
        skipped: report.skipped,
    })
}

/// The content directory must exist (unless test documents will create it)
/// and lie strictly below the working directory.
fn validate_content_dir(options: &BuildOptions) -> Result<PathBuf, ValidationError> {
    let content_dir = options.content_path();
    if !content_dir.is_dir() && options.test_documents == 0 {
        return Err(ValidationError::ContentDirMissing(content_dir));
    }

    let work_dir = options
        .work_dir
        .canonicalize()
        .map_err(|source| ValidationError::WorkDir {
            path: options.work_dir.clone(),
            source,
        })?;
    let resolved = resolve_path(&work_dir, Path::new(&options.content_dir));
    debug!(content_dir = %resolved.display(), work_dir = %work_dir.display(), "resolved");

    if !is_strict_descendant(&resolved, &work_dir) {
        return Err(ValidationError::NotDescendant {
            content_dir: resolved,
            work_dir,
        });
    }
    Ok(content_dir)
}

fn validate_template_dir(options: &BuildOptions) -> Result<Option<PathBuf>, ValidationError> {
    let Some(dir) = &options.template_dir else {
        return Ok(None);
    };
    let dir = options.work_dir.join(dir);
    if !dir.is_dir() {
        return Err(ValidationError::TemplateDirMissing(dir));
    }
    Ok(Some(dir))
}

/// Remove an existing `staticfiles/` if `confirm` allows it.
///
/// Returns whether something was removed.
fn prepare_output_dir(work_dir: &Path, confirm: &mut dyn Confirm) -> Result<bool, ValidationError> {
    let output_dir = work_dir.join(OUTPUT_DIR);
    if !output_dir.exists() {
        return Ok(false);
    }

    let approved = confirm
        .confirm_overwrite(&output_dir)
        .map_err(|source| ValidationError::Prompt {
            path: output_dir.clone(),
            source,
        })?;
    if !approved {
        return Err(ValidationError::OutputDirDeclined(output_dir));
    }

    info!(dir = %output_dir.display(), "removing existing output directory");
    let removed = if output_dir.is_dir() {
        fs::remove_dir_all(&output_dir)
    } else {
        fs::remove_file(&output_dir)
    };
    removed.map_err(|source| ValidationError::RemoveOutput {
        path: output_dir,
        source,
    })?;
    Ok(true)
}

/// Register custom palettes, then resolve the selected one with overrides.
fn resolve_palette(options: &BuildOptions) -> Result<PaletteEntry, ValidationError> {
    let mut registry = PaletteRegistry::with_presets();
    for (name, colors) in &options.palettes {
        registry.patch(name, colors)?;
    }
    let palette = registry.resolve(&options.color_palette, &options.colors)?;
    debug!(name = %options.color_palette, "palette resolved");
    Ok(palette)
}

fn warn_skipped(skipped: &[SkippedDocument]) {
    if !skipped.is_empty() {
        warn!(count = skipped.len(), "documents left out of the index");
    }
}

/// Canonical path if it exists, otherwise `base.join(path)` with `.` and `..`
/// folded lexically.
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let joined = base.join(path);
    joined.canonicalize().unwrap_or_else(|_| normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_strict_descendant(path: &Path, ancestor: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{record_dirs, write_document};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn options(work_dir: &Path, content_dir: &str) -> BuildOptions {
        BuildOptions::from_config(work_dir, content_dir, IndexConfig::default())
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write_document(&content, "a", "Alpha", &[("author", "Zed")]);
        write_document(&content, "b", "Beta", &[("author", "Amy")]);
        tmp
    }

    /// Fails the test if asked.
    struct NeverAsked;

    impl Confirm for NeverAsked {
        fn confirm_overwrite(&mut self, dir: &Path) -> io::Result<bool> {
            panic!("unexpected prompt for {}", dir.display());
        }
    }

    // =========================================================================
    // Confirmation
    // =========================================================================

    #[test]
    fn parse_answer_values() {
        for yes in ["yes", "Y", "true", "t", "1", " y\n"] {
            assert_eq!(parse_answer(yes), Some(true), "{yes:?}");
        }
        for no in ["no", "N", "false", "f", "0"] {
            assert_eq!(parse_answer(no), Some(false), "{no:?}");
        }
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn terminal_prompt_reads_answer() {
        let mut out = Vec::new();
        let mut prompt = TerminalPrompt::new(Cursor::new("yes\n"), &mut out);
        assert!(prompt.confirm_overwrite(Path::new("staticfiles")).unwrap());
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.starts_with("staticfiles already exists"));
    }

    #[test]
    fn terminal_prompt_declines_unclear_answer() {
        let mut prompt = TerminalPrompt::new(Cursor::new("sure\n"), io::sink());
        assert!(!prompt.confirm_overwrite(Path::new("x")).unwrap());
        let mut eof = TerminalPrompt::new(Cursor::new(""), io::sink());
        assert!(!eof.confirm_overwrite(Path::new("x")).unwrap());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn missing_content_dir_aborts() {
        let tmp = TempDir::new().unwrap();
        let err = build(&options(tmp.path(), "content"), &mut NeverAsked).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::ContentDirMissing(_))
        ));
        assert!(!tmp.path().join("index.html").exists());
    }

    #[test]
    fn content_dir_must_be_below_work_dir() {
        let tmp = site();
        let work = tmp.path().join("content/a");
        let err = build(&options(&work, ".."), &mut NeverAsked).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::NotDescendant { .. })
        ));
    }

    #[test]
    fn work_dir_itself_is_rejected() {
        let tmp = site();
        let err = check(&options(tmp.path(), ".")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::NotDescendant { .. })
        ));
    }

    #[test]
    fn dotted_content_path_is_accepted() {
        let tmp = site();
        let summary = check(&options(tmp.path(), "./content/../content")).unwrap();
        assert_eq!(record_dirs(&summary.records).len(), 2);
    }

    #[test]
    fn missing_template_dir_aborts() {
        let tmp = site();
        let mut opts = options(tmp.path(), "content");
        opts.template_dir = Some(PathBuf::from("nope"));
        let err = build(&opts, &mut NeverAsked).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::TemplateDirMissing(_))
        ));
    }

    #[test]
    fn existing_output_declined() {
        let tmp = site();
        let output = tmp.path().join(OUTPUT_DIR);
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("old.css"), "old").unwrap();

        let err = build(&options(tmp.path(), "content"), &mut Fixed(false)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::OutputDirDeclined(_))
        ));
        assert!(output.join("old.css").exists());
        assert!(!tmp.path().join("index.html").exists());
    }

    #[test]
    fn existing_output_replaced() {
        let tmp = site();
        let output = tmp.path().join(OUTPUT_DIR);
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("old.css"), "old").unwrap();

        let summary = build(&options(tmp.path(), "content"), &mut Fixed(true)).unwrap();
        assert!(summary.replaced_output);
        assert!(!output.join("old.css").exists());
        assert!(output.join("index.css").is_file());
    }

    // =========================================================================
    // Palette and scan failures write nothing
    // =========================================================================

    #[test]
    fn unknown_palette_aborts_before_writing() {
        let tmp = site();
        let mut opts = options(tmp.path(), "content");
        opts.color_palette = "color_palette_9".to_string();
        let err = build(&opts, &mut NeverAsked).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::Palette(
                PaletteError::UnknownPalette { .. }
            ))
        ));
        assert!(!tmp.path().join(OUTPUT_DIR).exists());
    }

    #[test]
    fn unknown_palette_keeps_existing_output() {
        let tmp = site();
        let output = tmp.path().join(OUTPUT_DIR);
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("index.css"), "/* previous */").unwrap();

        let mut opts = options(tmp.path(), "content");
        opts.color_palette = "color_palette_5".to_string();
        opts.test_documents = 2;
        let err = build(&opts, &mut Fixed(true)).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::Palette(
                PaletteError::UnknownPalette { .. }
            ))
        ));
        assert_eq!(
            fs::read_to_string(output.join("index.css")).unwrap(),
            "/* previous */"
        );
        assert!(!tmp.path().join("content/staticpage0").exists());
    }

    #[test]
    fn custom_palette_is_selectable() {
        let tmp = site();
        let mut opts = options(tmp.path(), "content");
        let night = ColorOverrides {
            color1: Some("#000".into()),
            color2: Some("#111111".into()),
            color3: Some("#eee".into()),
            color4: Some("#ffcc00".into()),
        };
        opts.palettes.insert("night".into(), night);
        opts.color_palette = "night".into();
        opts.colors.color4 = Some("#00ff00".into());

        let summary = build(&opts, &mut NeverAsked).unwrap();
        let css = fs::read_to_string(&summary.generated.stylesheet).unwrap();
        assert!(css.contains("--color-page-head: #000000;"));
        assert!(css.contains("--color-page-text-2: #00ff00;"));
    }

    #[test]
    fn missing_title_aborts_scan() {
        let tmp = site();
        let bad = tmp.path().join("content/z");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("index.html"), "<html><body>untitled</body></html>").unwrap();

        let err = build(&options(tmp.path(), "content"), &mut NeverAsked).unwrap_err();
        assert!(matches!(err, PipelineError::Scan(ScanError::MissingTitle(_))));
        assert!(!tmp.path().join(OUTPUT_DIR).exists());
    }

    #[test]
    fn skip_policy_builds_without_bad_document() {
        let tmp = site();
        let bad = tmp.path().join("content/z");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("index.html"), "<title>  </title>").unwrap();

        let mut opts = options(tmp.path(), "content");
        opts.on_scan_error = ScanErrorPolicy::Skip;
        opts.order_by = OrderBy::DirectoryName;
        let summary = build(&opts, &mut NeverAsked).unwrap();
        assert_eq!(record_dirs(&summary.records), vec!["a", "b"]);
        assert_eq!(summary.skipped.len(), 1);
    }

    // =========================================================================
    // Test documents
    // =========================================================================

    #[test]
    fn test_documents_create_missing_content_dir() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path(), "generated");
        opts.test_documents = 4;

        let summary = build(&opts, &mut NeverAsked).unwrap();
        assert_eq!(summary.test_documents.len(), 4);
        assert_eq!(summary.records.len(), 4);
        assert!(summary.records.iter().all(|r| r.url.starts_with("generated/staticpage")));
    }

    #[test]
    fn check_writes_nothing() {
        let tmp = site();
        let summary = check(&options(tmp.path(), "content")).unwrap();
        assert_eq!(summary.records.len(), 2);
        assert!(!tmp.path().join(OUTPUT_DIR).exists());
        assert!(!tmp.path().join("index.html").exists());
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/w/./content/../content/x")),
            PathBuf::from("/w/content/x")
        );
    }

    #[test]
    fn strict_descendant() {
        assert!(is_strict_descendant(Path::new("/w/c"), Path::new("/w")));
        assert!(!is_strict_descendant(Path::new("/w"), Path::new("/w")));
        assert!(!is_strict_descendant(Path::new("/"), Path::new("/w")));
        assert!(!is_strict_descendant(Path::new("/wx"), Path::new("/w")));
    }
}
