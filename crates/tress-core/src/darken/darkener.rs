//! Memoized HSV darkening.

use std::collections::HashMap;

use crate::color::{Color, ColorConversionError, Hsv};

/// Hues below this angle are treated as warm.
const WARM_HUE_LIMIT: f64 = 60.0;
/// Hues above this angle are treated as warm (they wrap around to red).
const COOL_HUE_LIMIT: f64 = 240.0;
/// Degrees each hue is rotated.
const HUE_SHIFT: f64 = 5.0;
/// Added to a hue that rotated below zero. Keeps the result below 360.
const HUE_WRAP: f64 = 359.9;
/// Colors at or below this saturation are left unsaturated.
const SATURATION_FLOOR: f64 = 0.01;
const SATURATION_CAP: f64 = 0.99;

/// Apply the hue rotation, saturation boost and value reduction to an HSV
/// color.
///
/// # Example
///
/// ```
/// use tress_core::{tress_shift, Hsv};
///
/// let shifted = tress_shift(Hsv::new(210.0, 0.5, 0.8), 0.3);
/// assert_eq!(shifted.h, 215.0);
/// assert_eq!(shifted.s, 0.75);
/// assert!((shifted.v - 0.5).abs() < 1e-12);
/// ```
pub fn tress_shift(hsv: Hsv, amount: f64) -> Hsv {
    let Hsv { mut h, mut s, mut v } = hsv;

    if h < WARM_HUE_LIMIT || h > COOL_HUE_LIMIT {
        h -= HUE_SHIFT;
        if h < 0.0 {
            h += HUE_WRAP;
        }
    } else {
        h += HUE_SHIFT;
    }

    if s > SATURATION_FLOOR {
        s = (s + (1.0 - s) / 2.0).min(SATURATION_CAP);
    }

    v -= amount;
    if v < 0.0 {
        v = 0.0;
    }

    Hsv { h, s, v }
}

/// Darken a single color without memoization.
///
/// # Errors
///
/// Returns [`ColorConversionError`] if the shifted HSV value cannot be
/// converted back to RGB (only possible with a non-finite `amount`).
pub fn darken_uncached(color: Color, amount: f64) -> Result<Color, ColorConversionError> {
    tress_shift(Hsv::from(color), amount).to_color()
}

/// Darkens colors by a fixed value reduction, remembering every result.
///
/// The memo grows with the number of distinct input colors and is never
/// evicted. It is only valid for the `amount` given at construction, which
/// is why the amount cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct ColorDarkener {
    amount: f64,
    memo: HashMap<u32, Color>,
}

impl ColorDarkener {
    /// Create a darkener that lowers the HSV value by `amount`.
    ///
    /// `amount` is expected to be in `[0, 1]`; range checking happens in
    /// [`ScanOptions::validate`](crate::ScanOptions::validate).
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            memo: HashMap::new(),
        }
    }

    /// The value reduction this darkener applies.
    #[inline]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Number of memoized colors.
    #[inline]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Darken `color`.
    ///
    /// If the HSV round trip fails the original color is returned unchanged
    /// and nothing is memoized; a single pixel must never abort a scan.
    pub fn darken(&mut self, color: Color) -> Color {
        let key = color.key();
        if let Some(&darkened) = self.memo.get(&key) {
            return darkened;
        }

        match darken_uncached(color, self.amount) {
            Ok(darkened) => {
                self.memo.insert(key, darkened);
                darkened
            }
            Err(err) => {
                tracing::debug!(%err, ?color, "Color conversion failed, keeping original color");
                color
            }
        }
    }
}
