//! Rendering compiled templates
//!
//! A [`RenderContext`] carries the variables and helpers of one render call;
//! [`render`] walks a [`CompiledTemplate`](crate::template::CompiledTemplate)
//! against it and returns the complete output or an error, never a prefix.

mod context;
mod error;
mod executor;
mod helpers;
mod value;

pub use context::{Args, Helper, RenderContext};
pub use error::{EvalError, RenderError};
pub use executor::render;
pub use helpers::escape_html;
pub use value::{Value, MAX_SEQUENCE_LEN};
