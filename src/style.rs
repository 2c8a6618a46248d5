//! Style resolution: merging theme classes and per-call overrides
//!
//! Classes are applied in the order given, each one over the properties
//! accumulated so far. Overrides are applied last. A property that is
//! overwritten keeps its first position, so output order is deterministic.

use std::fmt;

use indexmap::IndexMap;

use crate::theme::{Rgb, Theme, ThemeError};

/// Value that removes a property instead of setting it
pub const INHERIT: &str = "inherit";

/// A single override value: plain text or a computed color
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    Text(String),
    Color(Rgb),
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideValue::Text(s) => write!(f, "{}", s),
            OverrideValue::Color(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for OverrideValue {
    fn from(s: &str) -> Self {
        OverrideValue::Text(s.to_string())
    }
}

impl From<String> for OverrideValue {
    fn from(s: String) -> Self {
        OverrideValue::Text(s)
    }
}

impl From<Rgb> for OverrideValue {
    fn from(c: Rgb) -> Self {
        OverrideValue::Color(c)
    }
}

/// Per-call property overrides, applied after all class properties.
///
/// Never merged back into the theme. Keys must name a property that some
/// class of the theme declares, otherwise resolution fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideMap {
    entries: IndexMap<String, OverrideValue>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override, returning the map for chaining
    pub fn with(mut self, property: impl Into<String>, value: impl Into<OverrideValue>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<OverrideValue>) {
        self.entries.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&OverrideValue> {
        self.entries.get(property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<OverrideValue>> FromIterator<(K, V)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OverrideMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Resolves class names and overrides against one theme
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    theme: &'a Theme,
}

impl<'a> StyleResolver<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    /// Merged property declarations in their final order
    pub fn declarations<S: AsRef<str>>(
        &self,
        classes: &[S],
        overrides: Option<&OverrideMap>,
    ) -> Result<IndexMap<String, String>, ThemeError> {
        if let Some(overrides) = overrides {
            if let Some((unknown, _)) = overrides
                .iter()
                .find(|(property, _)| !self.theme.has_property(property))
            {
                return Err(ThemeError::unknown_property(unknown));
            }
        }

        let mut resolved = IndexMap::new();
        for class in classes {
            for (property, value) in self.theme.class_properties(class.as_ref())? {
                let value = self.theme.expand_color_refs(value)?;
                apply(&mut resolved, property, value);
            }
        }
        if let Some(overrides) = overrides {
            for (property, value) in overrides.iter() {
                apply(&mut resolved, property, value.to_string());
            }
        }
        Ok(resolved)
    }

    /// `property: value;` pairs suitable for a style attribute
    pub fn resolve<S: AsRef<str>>(
        &self,
        classes: &[S],
        overrides: Option<&OverrideMap>,
    ) -> Result<String, ThemeError> {
        Ok(self
            .declarations(classes, overrides)?
            .iter()
            .map(|(property, value)| format!("{}: {};", property, value))
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// The resolved declarations as ` style="..."`, or nothing when empty
    pub fn style_attribute<S: AsRef<str>>(
        &self,
        classes: &[S],
        overrides: Option<&OverrideMap>,
    ) -> Result<String, ThemeError> {
        let declarations = self.resolve(classes, overrides)?;
        if declarations.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" style=\"{}\"", declarations))
        }
    }
}

fn apply(resolved: &mut IndexMap<String, String>, property: &str, value: String) {
    if value == INHERIT {
        resolved.shift_remove(property);
    } else {
        resolved.insert(property.to_string(), value);
    }
}
