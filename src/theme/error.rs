//! Error types for theme loading and style lookups

use thiserror::Error;

/// Errors raised by the theme store and everything that resolves against it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    /// Malformed section header or key/value line
    #[error("theme syntax error on line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    /// A class name that no section declares
    #[error("unknown style class '{name}'")]
    UnknownClass { name: String },

    /// A color name missing from the `@colors` section
    #[error("unknown color '{name}'")]
    UnknownColor { name: String },

    /// An override key that no class of the theme declares
    #[error("unknown style property '{name}'")]
    UnknownProperty { name: String },
}

impl ThemeError {
    pub fn syntax(line: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            reason: reason.into(),
        }
    }

    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    pub fn unknown_color(name: impl Into<String>) -> Self {
        Self::UnknownColor { name: name.into() }
    }

    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }
}
