//! HSV color representation
//!
//! Hue is in degrees `[0, 360)`, saturation and value in `[0, 1]`.
//! Conversion back to RGB rounds each channel to the nearest 8-bit value
//! and rejects out-of-domain components instead of wrapping or clamping
//! them, so callers can decide how to recover.

use super::rgb::Color;

/// Error returned when an [`Hsv`] value cannot be converted to RGB.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("HSV({h}, {s}, {v}) is outside the convertible range")]
pub struct ColorConversionError {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// A color in the hue/saturation/value model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`
    pub h: f64,
    /// Saturation, `[0, 1]`
    pub s: f64,
    /// Value (brightness of the strongest channel), `[0, 1]`
    pub v: f64,
}

impl Hsv {
    #[inline]
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Convert to an 8-bit RGB color.
    ///
    /// # Errors
    ///
    /// Returns [`ColorConversionError`] when `h` is outside `[0, 360)`,
    /// `s` or `v` are outside `[0, 1]`, or any component is NaN.
    pub fn to_color(self) -> Result<Color, ColorConversionError> {
        let Self { h, s, v } = self;
        // Range checks written so that NaN fails every one of them
        if !((0.0..360.0).contains(&h) && (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&v)) {
            return Err(ColorConversionError { h, s, v });
        }

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Ok(Color::new(
            channel_to_u8(r + m),
            channel_to_u8(g + m),
            channel_to_u8(b + m),
        ))
    }
}

#[inline]
fn channel_to_u8(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

impl From<Color> for Hsv {
    fn from(color: Color) -> Self {
        let r = color.r as f64 / 255.0;
        let g = color.g as f64 / 255.0;
        let b = color.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let h = if h < 0.0 { h + 360.0 } else { h };

        let s = if max == 0.0 { 0.0 } else { delta / max };

        Self { h, s, v: max }
    }
}
