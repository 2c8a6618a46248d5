//! Templar - theme-aware HTML template rendering
//!
//! A theme names colors and style classes; templates embed expressions and
//! control flow in literal text and call theme helpers to produce inline CSS.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use templar::{render_str, RenderContext, Theme};
//!
//! let theme = Theme::load(
//!     "[@colors]\nlow = rgb(255,240,0)\nhigh = rgb(255,0,0)\n[cell]\nbackground = @low\npadding = 2px\n",
//! )
//! .unwrap();
//! let mut context = RenderContext::with_theme(Arc::new(theme)).with_value("n", 1);
//!
//! let html = render_str(
//!     r#"<td#{{ style("cell", {"background": gradient("low", "high", 0.5)}) }}>#{{ n }}</td>"#,
//!     &mut context,
//! )
//! .unwrap();
//! assert_eq!(html, r##"<td style="background: #ff7800; padding: 2px;">1</td>"##);
//! ```

pub mod engine;
pub mod error;
pub mod render;
pub mod style;
pub mod template;
pub mod theme;

pub use engine::Engine;
pub use error::TemplateSyntaxError;
pub use render::{EvalError, RenderContext, RenderError, Value};
pub use style::{OverrideMap, OverrideValue, StyleResolver};
pub use template::{compile, CompileConfig, CompiledTemplate, Compiler};
pub use theme::{default_theme, Rgb, Theme, ThemeError};

use thiserror::Error;

/// Errors that can occur anywhere between loading a theme and rendering
#[derive(Debug, Error)]
pub enum Error {
    /// Theme source could not be loaded
    #[error("theme error: {0}")]
    Theme(#[from] ThemeError),

    /// Template source could not be compiled
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),

    /// Rendering failed; no output was produced
    #[error(transparent)]
    Render(#[from] RenderError),

    /// No template registered under this name
    #[error("template '{0}' not found")]
    TemplateNotFound(String),
}

/// Compile and render `source` in one step
///
/// # Example
///
/// ```rust
/// use templar::{render_str, RenderContext};
///
/// let mut context = RenderContext::new().with_value("xs", vec![1, 2, 3]);
/// let out = render_str("<% for x in xs %>[#{{ x * 2 }}]<% end %>", &mut context).unwrap();
/// assert_eq!(out, "[2][4][6]");
/// ```
pub fn render_str(source: &str, context: &mut RenderContext) -> Result<String, Error> {
    let template = compile(source)?;
    Ok(render::render(&template, context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_str() {
        let mut context = RenderContext::new();
        assert_eq!(render_str("<b>#{{1+1}}</b>", &mut context).unwrap(), "<b>2</b>");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = render_str("<b>#{{ 1 +", &mut RenderContext::new()).unwrap_err();
        assert!(matches!(err, Error::Syntax(TemplateSyntaxError { position: 3, .. })));
    }

    #[test]
    fn test_render_error_is_reported() {
        let err = render_str("#{{ missing }}", &mut RenderContext::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "render error at byte 4: name 'missing' is not defined"
        );
    }
}
