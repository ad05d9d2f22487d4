//! Build configuration.
//!
//! Handles loading, validating, and merging `simple-index.toml`. The file is
//! optional and lives in the working directory (the directory the index page
//! is written to). Command-line flags override anything set here.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! order_by = "last_modified"      # last_modified | title | author | directory_name
//! color_palette = "color_palette_4"
//! on_scan_error = "abort"         # abort | skip
//! # template_dir = "my-templates" # replaces the built-in templates
//! # assets_dir = "my-assets"      # copied into staticfiles/
//!
//! [colors]                        # per-slot overrides, "#rgb" or "#rrggbb"
//! # color1 = "#717171"            # header and footer background
//! # color2 = "#ffffff"            # body background
//! # color3 = "#8939a8"            # title, description and footer text
//! # color4 = "#000000"            # icon and item titles
//!
//! [page]
//! title = "Index"
//! description = "A collection of static pages."
//! footer = ""
//!
//! # Custom palettes need all four colors
//! [palettes.night]
//! color1 = "#000000"
//! color2 = "#111111"
//! color3 = "#eeeeee"
//! color4 = "#ffcc00"
//! ```
//!
//! ## Partial Configuration
//!
//! The file is sparse — override just the values you want. Unknown keys are
//! rejected to catch typos early.

use crate::order::OrderBy;
use crate::palette::{Color, ColorOverrides, DEFAULT_PALETTE};
use crate::scan::ScanErrorPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "simple-index.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `simple-index.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Order of the entries on the page.
    pub order_by: OrderBy,
    /// Name of a built-in or custom palette.
    pub color_palette: String,
    /// Directory holding replacement templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    /// Extra static files copied into `staticfiles/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,
    /// What to do with documents that have no usable title.
    pub on_scan_error: ScanErrorPolicy,
    /// Per-slot overrides applied on top of `color_palette`.
    pub colors: ColorOverrides,
    /// Text shown in the page header and footer.
    pub page: PageConfig,
    /// Custom palettes, by name.
    pub palettes: BTreeMap<String, ColorOverrides>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            order_by: OrderBy::default(),
            color_palette: DEFAULT_PALETTE.to_string(),
            template_dir: None,
            assets_dir: None,
            on_scan_error: ScanErrorPolicy::default(),
            colors: ColorOverrides::default(),
            page: PageConfig::default(),
            palettes: BTreeMap::new(),
        }
    }
}

impl IndexConfig {
    /// Check every color code and that custom palettes are complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_colors("colors", &self.colors)?;
        for (name, palette) in &self.palettes {
            let section = format!("palettes.{name}");
            check_colors(&section, palette)?;
            let complete = palette.color1.is_some()
                && palette.color2.is_some()
                && palette.color3.is_some()
                && palette.color4.is_some();
            if !complete {
                return Err(ConfigError::Validation(format!(
                    "{section} must set color1, color2, color3 and color4"
                )));
            }
        }
        if self.color_palette.trim().is_empty() {
            return Err(ConfigError::Validation(
                "color_palette must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn check_colors(section: &str, colors: &ColorOverrides) -> Result<(), ConfigError> {
    let slots = [
        ("color1", &colors.color1),
        ("color2", &colors.color2),
        ("color3", &colors.color3),
        ("color4", &colors.color4),
    ];
    for (key, code) in slots {
        if let Some(code) = code {
            Color::parse(code)
                .map_err(|e| ConfigError::Validation(format!("{section}.{key}: {e}")))?;
        }
    }
    Ok(())
}

/// Header and footer text, handed to the page template as `page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub title: String,
    pub description: String,
    pub footer: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Index".to_string(),
            description: "A collection of static pages.".to_string(),
            footer: String::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(IndexConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `simple-index.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<IndexConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IndexConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `simple-index.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<IndexConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully commented stock `simple-index.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-index configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Order of the entries on the index page:
#   last_modified  - oldest first
#   title          - by document <title>
#   author         - by <meta name="author">, anonymous first
#   directory_name - by subdirectory name
order_by = "last_modified"

# Built-in palettes: color_palette_1, color_palette_2, color_palette_3,
# color_palette_4. Custom palettes from [palettes.*] can be named here too.
color_palette = "color_palette_4"

# What to do with a document that has no <title>:
#   abort - stop the build (nothing is written)
#   skip  - leave it out and print a warning
on_scan_error = "abort"

# Directory with replacement templates. It must provide index.html.jinja,
# index.css.jinja and main_image.svg.jinja.
# template_dir = "templates"

# Directory whose files are copied into staticfiles/ next to the built-ins.
# assets_dir = "assets"

# ---------------------------------------------------------------------------
# Color overrides (applied on top of color_palette)
# ---------------------------------------------------------------------------
# Colors are written as "#rgb" or "#rrggbb"; the leading # is required.
[colors]
# color1 = "#717171"   # header and footer background
# color2 = "#ffffff"   # body background
# color3 = "#8939a8"   # title, description and footer text
# color4 = "#000000"   # icon and item titles

# ---------------------------------------------------------------------------
# Page text
# ---------------------------------------------------------------------------
[page]
title = "Index"
description = "A collection of static pages."
footer = ""

# ---------------------------------------------------------------------------
# Custom palettes (all four colors required)
# ---------------------------------------------------------------------------
# [palettes.night]
# color1 = "#000000"
# color2 = "#111111"
# color3 = "#eeeeee"
# color4 = "#ffcc00"
"##
}
