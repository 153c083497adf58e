//! Unified error type for the tress-core public API.

use thiserror::Error;

/// Errors reported when building scanners or pixel buffers.
///
/// # Example
///
/// ```
/// use tress_core::{RgbaImage, RasterScanner, TressError};
///
/// let image = RgbaImage::new(4, 4);
/// let err = RasterScanner::new(image, 0, 0.5).unwrap_err();
/// assert!(matches!(err, TressError::InvalidParameter { name: "radius", .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TressError {
    /// A scan parameter is outside its accepted range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A raw pixel buffer does not match the declared dimensions.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl TressError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TressError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
