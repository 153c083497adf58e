//! Color types and conversion utilities
//!
//! This module provides the 8-bit color types the scan engine works with
//! and the HSV representation used by the darkening transform.
//!
//! # Types
//!
//! - [`Color`]: An opaque 8-bit RGB triple. Use for all pixel arithmetic.
//! - [`Rgba`]: An 8-bit RGBA quadruple. Use for output buffers.
//! - [`Hsv`]: Hue/saturation/value. Use for the darkening transform only.
//!
//! # Example
//!
//! ```
//! use tress_core::{Color, Hsv};
//!
//! let color = Color::new(100, 150, 200);
//! let hsv = Hsv::from(color);
//! assert_eq!(hsv.to_color().unwrap(), color);
//! ```

mod hsv;
mod rgb;

pub use hsv::{ColorConversionError, Hsv};
pub use rgb::{Color, Luma, Rgba};
