//! Theme colors and the gradient used for heat-map cells

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An opaque RGB color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Errors from parsing a color literal in a theme source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("expected rgb(r, g, b), #rrggbb or #rgb, found '{0}'")]
    Unrecognized(String),
    #[error("channel value '{0}' is out of range 0-255")]
    ChannelOutOfRange(String),
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear per-channel interpolation towards `other`.
    ///
    /// `ratio` is clamped to `[0, 1]` and NaN counts as 0, so callers may
    /// pass ratios computed from degenerate denominators without checking.
    pub fn interpolate(self, other: Rgb, ratio: f64) -> Rgb {
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        Rgb::new(
            lerp_channel(self.r, other.r, ratio),
            lerp_channel(self.g, other.g, ratio),
            lerp_channel(self.b, other.b, ratio),
        )
    }

    /// Lowercase `#rrggbb` form used in style declarations
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (f64::from(a), f64::from(b));
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Ratio used to place a count on a heat-map scale whose busiest cell is `top`.
///
/// Kept as `(value - 1) / max(1, top - 1)`: with `top <= 1` the result is
/// zero or negative and the gradient clamps it to its first color.
pub fn heat_ratio(value: f64, top: f64) -> f64 {
    (value - 1.0) / (top - 1.0).max(1.0)
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::Unrecognized(s.to_string()));
        }

        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ColorParseError::Unrecognized(s.to_string()))?;

        let channels = inner
            .split(',')
            .map(|part| {
                let part = part.trim();
                let value: u16 = part
                    .parse()
                    .map_err(|_| ColorParseError::Unrecognized(s.to_string()))?;
                u8::try_from(value).map_err(|_| ColorParseError::ChannelOutOfRange(part.to_string()))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        match channels.as_slice() {
            [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
            _ => Err(ColorParseError::Unrecognized(s.to_string())),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(Rgb::new(
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(Rgb::new(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}
