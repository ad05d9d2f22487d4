//! Color palettes for the generated page.
//!
//! A palette is four colors, each kept in two forms: a normalized `#rrggbb`
//! string for CSS and the decoded byte triple for `rgba()` expressions.
//!
//! | Slot      | Override  | Used for                                   |
//! |-----------|-----------|--------------------------------------------|
//! | `head`    | `color1`  | header and footer background               |
//! | `body`    | `color2`  | page body background                       |
//! | `text_1`  | `color3`  | title, description, footer text            |
//! | `text_2`  | `color4`  | icon color and grid item titles            |
//!
//! Templates see a palette as eight flat variables: `color_page_head_hex`,
//! `color_page_head_rgb`, ..., `color_page_text_2_rgb`.
//!
//! ## Registry
//!
//! [`PaletteRegistry`] starts with the four built-in presets. Patching a
//! palette merges slot by slot: overriding `color1` leaves the other three
//! colors as they were. The registry is a plain value owned by the pipeline
//! for the duration of one build.

use serde::Deserialize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaletteError {
    #[error("'{0}' is not a valid hex color code (expected #rgb or #rrggbb)")]
    InvalidHex(String),
    #[error("Unknown color palette '{name}' (available: {available})")]
    UnknownPalette { name: String, available: String },
    #[error("Palette '{0}' must define all four colors")]
    Incomplete(String),
}

pub const DEFAULT_PALETTE: &str = "color_palette_4";

const PRESETS: [(&str, [[u8; 3]; 4]); 4] = [
    (
        "color_palette_1",
        [
            [0x71, 0x71, 0x71],
            [0xff, 0xff, 0xff],
            [0x89, 0x39, 0xa8],
            [0x00, 0x00, 0x00],
        ],
    ),
    (
        "color_palette_2",
        [
            [0xff, 0xff, 0xff],
            [0x61, 0x61, 0x61],
            [0x36, 0xe6, 0x34],
            [0xff, 0xff, 0xff],
        ],
    ),
    (
        "color_palette_3",
        [
            [0x3b, 0x69, 0x78],
            [0x20, 0x40, 0x51],
            [0x84, 0xa9, 0xac],
            [0xff, 0xff, 0xff],
        ],
    ),
    (
        "color_palette_4",
        [
            [0xff, 0xff, 0xff],
            [0x39, 0x3e, 0x46],
            [0x76, 0xea, 0xd7],
            [0xff, 0xff, 0xff],
        ],
    ),
];

/// `#` followed by 3 or 6 hex digits. The only accepted color syntax, for
/// flags and config alike.
pub fn is_hex(code: &str) -> bool {
    code.strip_prefix('#').is_some_and(is_hex_digits)
}

fn is_hex_digits(digits: &str) -> bool {
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// One color in both hex and rgb form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color {
    hex: String,
    rgb: [u8; 3],
}

impl Color {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            hex: format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]),
            rgb,
        }
    }

    /// Parse `#rgb` or `#rrggbb`. Short forms are expanded.
    pub fn parse(code: &str) -> Result<Self, PaletteError> {
        let digits = match code.strip_prefix('#') {
            Some(digits) if is_hex_digits(digits) => digits,
            _ => return Err(PaletteError::InvalidHex(code.to_string())),
        };
        let full: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let channel = |i: usize| {
            u8::from_str_radix(&full[i..i + 2], 16)
                .map_err(|_| PaletteError::InvalidHex(code.to_string()))
        };
        Ok(Self::from_rgb([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }
}

/// A fully populated palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub head: Color,
    pub body: Color,
    pub text_1: Color,
    pub text_2: Color,
}

impl PaletteEntry {
    fn from_rgb(colors: [[u8; 3]; 4]) -> Self {
        let [head, body, text_1, text_2] = colors.map(Color::from_rgb);
        Self {
            head,
            body,
            text_1,
            text_2,
        }
    }

    fn slots(&self) -> [(&'static str, &Color); 4] {
        [
            ("color_page_head", &self.head),
            ("color_page_body", &self.body),
            ("color_page_text_1", &self.text_1),
            ("color_page_text_2", &self.text_2),
        ]
    }
}

impl Serialize for PaletteEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        for (prefix, color) in self.slots() {
            map.serialize_entry(&format!("{prefix}_hex"), color.hex())?;
            map.serialize_entry(&format!("{prefix}_rgb"), &color.rgb())?;
        }
        map.end()
    }
}

/// Per-slot color overrides. `None` leaves the slot untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color4: Option<String>,
}

impl ColorOverrides {
    /// Slot-wise merge: values in `over` win.
    pub fn layered(&self, over: &ColorOverrides) -> ColorOverrides {
        ColorOverrides {
            color1: over.color1.clone().or_else(|| self.color1.clone()),
            color2: over.color2.clone().or_else(|| self.color2.clone()),
            color3: over.color3.clone().or_else(|| self.color3.clone()),
            color4: over.color4.clone().or_else(|| self.color4.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(Option::is_none)
    }

    fn slots(&self) -> [Option<&str>; 4] {
        [
            self.color1.as_deref(),
            self.color2.as_deref(),
            self.color3.as_deref(),
            self.color4.as_deref(),
        ]
    }

    /// Parse every present slot, failing on the first malformed code.
    fn parse(&self) -> Result<[Option<Color>; 4], PaletteError> {
        let [c1, c2, c3, c4] = self.slots();
        let parse = |code: Option<&str>| code.map(Color::parse).transpose();
        Ok([parse(c1)?, parse(c2)?, parse(c3)?, parse(c4)?])
    }
}

/// Named palettes available to one build.
#[derive(Debug, Clone)]
pub struct PaletteRegistry {
    palettes: BTreeMap<String, PaletteEntry>,
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl PaletteRegistry {
    pub fn with_presets() -> Self {
        let palettes = PRESETS
            .iter()
            .map(|(name, colors)| (name.to_string(), PaletteEntry::from_rgb(*colors)))
            .collect();
        Self { palettes }
    }

    pub fn get(&self, name: &str) -> Option<&PaletteEntry> {
        self.palettes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }

    /// Merge `overrides` into the palette called `name`.
    ///
    /// An existing palette is patched slot by slot. A new name is accepted
    /// only when all four colors are given.
    pub fn patch(&mut self, name: &str, overrides: &ColorOverrides) -> Result<(), PaletteError> {
        let [head, body, text_1, text_2] = overrides.parse()?;

        if let Some(entry) = self.palettes.get_mut(name) {
            let slots = [
                (&mut entry.head, head),
                (&mut entry.body, body),
                (&mut entry.text_1, text_1),
                (&mut entry.text_2, text_2),
            ];
            for (slot, color) in slots {
                if let Some(color) = color {
                    *slot = color;
                }
            }
            return Ok(());
        }

        match (head, body, text_1, text_2) {
            (Some(head), Some(body), Some(text_1), Some(text_2)) => {
                self.palettes.insert(
                    name.to_string(),
                    PaletteEntry {
                        head,
                        body,
                        text_1,
                        text_2,
                    },
                );
                Ok(())
            }
            _ => Err(PaletteError::Incomplete(name.to_string())),
        }
    }

    /// Apply `overrides` to the named palette and return the result.
    pub fn resolve(
        &mut self,
        name: &str,
        overrides: &ColorOverrides,
    ) -> Result<PaletteEntry, PaletteError> {
        if !self.palettes.contains_key(name) {
            return Err(PaletteError::UnknownPalette {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            });
        }
        self.patch(name, overrides)?;
        self.palettes
            .get(name)
            .cloned()
            .ok_or_else(|| PaletteError::Incomplete(name.to_string()))
    }
}
