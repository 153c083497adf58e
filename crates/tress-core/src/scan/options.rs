//! Scan configuration.

use crate::api::TressError;
use crate::finder::CacheStrategy;

/// Smallest accepted neighbourhood half-width.
pub const MIN_RADIUS: usize = 1;
/// Largest accepted neighbourhood half-width.
pub const MAX_RADIUS: usize = 100;

/// Parameters for one scan.
///
/// # Defaults
///
/// - `radius`: 1
/// - `darken_amount`: 0.0 (hue and saturation shift only)
/// - `cache`: [`CacheStrategy::Ring`] with
///   [`DEFAULT_RING_SIZE`](crate::DEFAULT_RING_SIZE) slots
///
/// # Example
///
/// ```
/// use tress_core::{CacheStrategy, ScanOptions};
///
/// let options = ScanOptions::new(3, 0.25).cache(CacheStrategy::Full);
/// assert!(options.validate().is_ok());
/// assert!(ScanOptions::new(101, 0.25).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOptions {
    /// Neighbourhood half-width, `1..=100`.
    pub radius: usize,
    /// Reduction of the HSV value channel, `0.0..=1.0`.
    pub darken_amount: f64,
    /// Column cache sizing.
    pub cache: CacheStrategy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            radius: MIN_RADIUS,
            darken_amount: 0.0,
            cache: CacheStrategy::default(),
        }
    }
}

impl ScanOptions {
    #[inline]
    pub fn new(radius: usize, darken_amount: f64) -> Self {
        Self {
            radius,
            darken_amount,
            ..Self::default()
        }
    }

    #[inline]
    pub fn radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    #[inline]
    pub fn darken_amount(mut self, amount: f64) -> Self {
        self.darken_amount = amount;
        self
    }

    #[inline]
    pub fn cache(mut self, cache: CacheStrategy) -> Self {
        self.cache = cache;
        self
    }

    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// [`TressError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TressError> {
        if !(MIN_RADIUS..=MAX_RADIUS).contains(&self.radius) {
            return Err(TressError::invalid(
                "radius",
                format!(
                    "must be within {MIN_RADIUS}..={MAX_RADIUS}, got {}",
                    self.radius
                ),
            ));
        }
        // `contains` is false for NaN
        if !(0.0..=1.0).contains(&self.darken_amount) {
            return Err(TressError::invalid(
                "darken_amount",
                format!("must be within 0.0..=1.0, got {}", self.darken_amount),
            ));
        }
        if let CacheStrategy::Ring { size: 0 } = self.cache {
            return Err(TressError::invalid("cache", "ring size must be positive"));
        }
        Ok(())
    }
}
