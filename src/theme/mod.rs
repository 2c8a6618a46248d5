//! Theme system: named colors and style classes
//!
//! A theme source is organized in sections. `[@colors]` declares the color
//! table, `[@screen]` declares page-level rules, and every other section
//! declares (or extends) a style class.

mod color;
mod error;
mod store;

pub use color::{heat_ratio, ColorParseError, Rgb};
pub use error::ThemeError;
pub use store::{default_theme, ClassProperties, Theme, COLOR_SECTION, SCREEN_SECTION};
