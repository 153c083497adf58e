//! tress-core: incremental darkest-neighbour image filter
//!
//! Every output pixel is the darkest color of the square neighbourhood
//! around it, pushed further toward shadow by an HSV transform. The scan
//! runs in time-bounded slices so a single-threaded host stays responsive
//! while a multi-megapixel image is processed.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use tress_core::{RasterScanner, Rgba, RgbaImage};
//!
//! let image = RgbaImage::from_fn(16, 16, |x, y| Rgba::new((x * 16) as u8, (y * 16) as u8, 128, 255));
//! let mut scanner = RasterScanner::new(image, 3, 0.2).unwrap();
//!
//! while !scanner.is_complete() {
//!     scanner.advance(Duration::from_millis(16));
//!     // redraw, poll input, report scanner.progress() ...
//! }
//! let output = scanner.into_result();
//! assert_eq!(output.dimensions(), (16, 16));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! PixelGrid (borrowed or owned, read-only)
//!     |
//!     v
//! DarkestFinder            min luma over the clipped (2r+1)^2 square,
//!     |                    one column strip at a time, strips cached
//!     v
//! ColorDarkener            RGB -> HSV, hue +-5 deg, saturation halfway
//!     |                    to 1, value - amount, HSV -> RGB (memoized)
//!     v
//! RgbaImage output         written in raster order by RasterScanner
//! ```
//!
//! ## Brightness
//!
//! "Darkest" means lowest Rec. 709 luma `0.2126 R + 0.7152 G + 0.0722 B`
//! on the stored 8-bit values, with no gamma decoding. Luma is kept in
//! integer fixed point so equal-luma colors tie exactly; ties go to the
//! first pixel in column-major order within the square.
//!
//! ## Column cache
//!
//! Sweeping a row re-examines the same column strips `2r + 1` times. The
//! [`DarkestFinder`] reduces each strip once and keeps the result in a
//! [`ColumnCache`], dropping a row's cost from `O(W r^2)` to `O(W r)`.
//! Entries are tagged with column, row and radius; a stale or colliding
//! slot is a miss, never a wrong answer.
//!
//! ## Failure model
//!
//! Parameter validation happens once, in the scanner constructor. After
//! that nothing fails: out-of-bounds neighbours are skipped and a pixel
//! whose HSV round trip fails keeps its undarkened color.

pub mod api;
pub mod color;
pub mod darken;
pub mod finder;
pub mod scan;


pub use api::TressError;
pub use color::{Color, ColorConversionError, Hsv, Luma, Rgba};
pub use darken::{darken_uncached, tress_shift, ColorDarkener};
pub use finder::{CacheStrategy, ColumnCache, DarkestFinder, PixelGrid, RgbaImage, DEFAULT_RING_SIZE};
pub use scan::{RasterScanner, ScanOptions, ScanState, MAX_RADIUS, MIN_RADIUS};
