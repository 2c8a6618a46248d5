//! Theme store: named colors and style classes parsed from a section-based source
//!
//! ```text
//! [@colors]
//! lightmin = rgb(255,240,0)
//! lightmax = rgb(255,0,0)
//!
//! [@screen]
//! body = margin: 0; font-family: sans-serif;
//!
//! [td]
//! background = rgb(220,220,220)
//! border = 1px solid @grid
//! ```

use indexmap::{IndexMap, IndexSet};

use super::color::Rgb;
use super::error::ThemeError;

/// Section holding the color table
pub const COLOR_SECTION: &str = "@colors";

/// Section holding page-level rules emitted by [`Theme::header_css`]
pub const SCREEN_SECTION: &str = "@screen";

/// Ordered property declarations of one style class
pub type ClassProperties = IndexMap<String, String>;

/// Theme used when none is supplied
const DEFAULT_THEME: &str = r##"
[@colors]
lightmin = rgb(255,240,0)
lightmax = rgb(255,0,0)
darkmin = rgb(120,160,255)
darkmax = rgb(0,0,140)
grid = rgb(160,160,160)
header = rgb(200,200,200)

[@screen]
body = margin: 0; padding: 0; font-family: sans-serif;
a = color: rgb(0,0,160);

[table]
border-collapse = collapse
margin = 0.5em 0

[th]
background = @header
border = 1px solid @grid
padding = 2px 4px
text-align = center

[td]
background = rgb(220,220,220)
border = 1px solid @grid
padding = 2px 4px
text-align = right

[number]
text-align = right
white-space = nowrap

[highlight]
font-weight = bold
"##;

/// All colors and style classes loaded from one theme source.
///
/// Immutable once loaded; share it behind an `Arc` across renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Theme {
    colors: IndexMap<String, Rgb>,
    classes: IndexMap<String, ClassProperties>,
    screen: Option<IndexMap<String, String>>,
    properties: IndexSet<String>,
}

enum Section {
    Colors,
    Screen,
    Class(String),
}

impl Theme {
    /// Parse a theme source
    pub fn load(source: &str) -> Result<Self, ThemeError> {
        let mut theme = Theme::default();
        let mut section: Option<Section> = None;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| ThemeError::syntax(line_no, "section header is missing ']'"))?
                    .trim();
                if name.is_empty() {
                    return Err(ThemeError::syntax(line_no, "empty section name"));
                }
                section = Some(match name {
                    COLOR_SECTION => Section::Colors,
                    SCREEN_SECTION => {
                        theme.screen.get_or_insert_with(IndexMap::new);
                        Section::Screen
                    }
                    _ => {
                        theme.classes.entry(name.to_string()).or_default();
                        Section::Class(name.to_string())
                    }
                });
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ThemeError::syntax(line_no, "expected 'key = value'"))?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                return Err(ThemeError::syntax(line_no, "empty key"));
            }

            match &section {
                None => {
                    return Err(ThemeError::syntax(
                        line_no,
                        "key/value line before any section header",
                    ))
                }
                Some(Section::Colors) => {
                    let color = value
                        .parse::<Rgb>()
                        .map_err(|e| ThemeError::syntax(line_no, e.to_string()))?;
                    theme.colors.insert(key.to_string(), color);
                }
                Some(Section::Screen) => {
                    if let Some(rules) = theme.screen.as_mut() {
                        rules.insert(key.to_string(), value.to_string());
                    }
                }
                Some(Section::Class(name)) => {
                    theme.properties.insert(key.to_string());
                    theme
                        .classes
                        .entry(name.clone())
                        .or_default()
                        .insert(key.to_string(), value.to_string());
                }
            }
        }

        log::debug!(
            "loaded theme with {} classes and {} colors",
            theme.classes.len(),
            theme.colors.len()
        );
        Ok(theme)
    }

    /// Declared properties of a class, in declaration order
    pub fn class_properties(&self, name: &str) -> Result<&ClassProperties, ThemeError> {
        self.classes
            .get(name)
            .ok_or_else(|| ThemeError::unknown_class(name))
    }

    /// Look up a named color
    pub fn color(&self, name: &str) -> Result<Rgb, ThemeError> {
        self.colors
            .get(name)
            .copied()
            .ok_or_else(|| ThemeError::unknown_color(name))
    }

    /// Interpolate between two named colors
    pub fn gradient(&self, from: &str, to: &str, ratio: f64) -> Result<Rgb, ThemeError> {
        Ok(self.color(from)?.interpolate(self.color(to)?, ratio))
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Whether any class of this theme declares `name`
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn colors(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.colors.iter().map(|(name, color)| (name.as_str(), *color))
    }

    /// Replace `@name` color references inside a property value.
    ///
    /// An `@` not followed by a name character is kept as-is.
    pub fn expand_color_refs(&self, value: &str) -> Result<String, ThemeError> {
        if !value.contains('@') {
            return Ok(value.to_string());
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(at) = rest.find('@') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(after.len());
            if name_len == 0 {
                out.push('@');
            } else {
                out.push_str(&self.color(&after[..name_len])?.to_hex());
            }
            rest = &after[name_len..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Page-level rules from the `@screen` section, one per line
    pub fn header_css(&self) -> String {
        match &self.screen {
            Some(rules) => rules
                .iter()
                .map(|(selector, declarations)| format!("\n{} {{{}}}", selector, declarations))
                .collect(),
            None => {
                log::warn!("theme has no '{}' section", SCREEN_SECTION);
                String::new()
            }
        }
    }
}

/// The built-in report theme
pub fn default_theme() -> Theme {
    Theme::load(DEFAULT_THEME).expect("Default theme should be valid")
}
