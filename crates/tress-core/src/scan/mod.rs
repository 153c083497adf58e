//! Incremental raster scan.
//!
//! [`RasterScanner`] walks the image in raster order, replacing every
//! pixel with the darkened darkest color of its neighbourhood. Work is
//! done in bounded slices: each [`advance()`](RasterScanner::advance) call
//! runs until its time budget is spent, then returns so a single-threaded
//! host can redraw, handle input or report progress before calling again.

mod options;
mod scanner;

pub use options::{ScanOptions, MAX_RADIUS, MIN_RADIUS};
pub use scanner::{RasterScanner, ScanState};
