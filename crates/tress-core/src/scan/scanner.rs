//! Resumable raster scan controller.

use std::time::{Duration, Instant};

use super::options::ScanOptions;
use crate::api::TressError;
use crate::darken::ColorDarkener;
use crate::finder::{DarkestFinder, PixelGrid, RgbaImage};

/// Where a scan stands after an [`advance()`](RasterScanner::advance) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Pixels remain and the current call has not used up its budget.
    /// A fresh scanner reports this until its first `advance`.
    Running,
    /// Time budget ran out; the cursor is kept for the next call.
    Paused,
    /// Every pixel has been written.
    Complete,
}

/// Incremental darkest-neighbour filter over one image.
///
/// A scanner exclusively owns its grid (or a borrow of it), both caches
/// and the output buffer. Pixels strictly before the cursor in raster
/// order hold final values; all others are still transparent black.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tress_core::{RasterScanner, Rgba, RgbaImage};
///
/// let image = RgbaImage::from_fn(8, 8, |x, _| Rgba::new(x as u8 * 30, 90, 90, 255));
/// let mut scanner = RasterScanner::new(&image, 2, 0.1).unwrap();
///
/// while !scanner.is_complete() {
///     scanner.advance(Duration::from_millis(5));
///     assert!(scanner.progress() <= 100.0);
/// }
/// assert_eq!(scanner.progress(), 100.0);
/// assert_eq!(scanner.result().dimensions(), (8, 8));
/// ```
#[derive(Debug)]
pub struct RasterScanner<G: PixelGrid> {
    grid: G,
    radius: usize,
    finder: DarkestFinder,
    darkener: ColorDarkener,
    output: RgbaImage,
    x: usize,
    y: usize,
    state: ScanState,
}

impl<G: PixelGrid> RasterScanner<G> {
    /// Start a scan with the default cache strategy.
    ///
    /// # Errors
    ///
    /// [`TressError::InvalidParameter`] if `radius` is outside `1..=100` or
    /// `darken_amount` is outside `0.0..=1.0`.
    pub fn new(grid: G, radius: usize, darken_amount: f64) -> Result<Self, TressError> {
        Self::with_options(grid, ScanOptions::new(radius, darken_amount))
    }

    /// Start a scan with explicit options.
    pub fn with_options(grid: G, options: ScanOptions) -> Result<Self, TressError> {
        Self::build(grid, options, None)
    }

    /// Start a scan, writing into `recycled` if it has the grid's
    /// dimensions. A buffer of any other size is dropped and a new one
    /// allocated.
    pub fn with_buffer(
        grid: G,
        options: ScanOptions,
        recycled: RgbaImage,
    ) -> Result<Self, TressError> {
        Self::build(grid, options, Some(recycled))
    }

    fn build(
        grid: G,
        options: ScanOptions,
        recycled: Option<RgbaImage>,
    ) -> Result<Self, TressError> {
        options.validate()?;

        let (width, height) = (grid.width(), grid.height());
        let output = match recycled {
            Some(mut buffer) if buffer.dimensions() == (width, height) => {
                tracing::debug!(width, height, "Reusing output buffer");
                buffer.clear();
                buffer
            }
            _ => RgbaImage::new(width, height),
        };

        Ok(Self {
            grid,
            radius: options.radius,
            finder: DarkestFinder::new(options.cache),
            darkener: ColorDarkener::new(options.darken_amount),
            output,
            x: 0,
            y: 0,
            state: ScanState::Running,
        })
    }

    /// Process pixels until `budget` has elapsed or the image is done.
    ///
    /// The clock is checked before every pixel, so a call overruns its
    /// budget by at most one pixel's work, and a zero budget does nothing.
    pub fn advance(&mut self, budget: Duration) -> ScanState {
        if self.state == ScanState::Complete {
            return ScanState::Complete;
        }

        let (width, height) = (self.grid.width(), self.grid.height());
        let start = Instant::now();
        let mut processed = 0usize;

        while start.elapsed() < budget {
            if self.y >= height || width == 0 {
                self.finish();
                return self.state;
            }

            let darkest = self
                .finder
                .find_darkest(&self.grid, self.x, self.y, self.radius);
            let darkened = self.darkener.darken(darkest.rgb());
            self.output.put_pixel(self.x, self.y, darkened.opaque());
            processed += 1;

            self.x += 1;
            if self.x == width {
                self.x = 0;
                self.y += 1;
                if self.y == height {
                    self.finish();
                    break;
                }
            }
        }

        if self.state != ScanState::Complete {
            self.state = ScanState::Paused;
        }
        tracing::trace!(
            processed,
            progress = self.progress(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Scan step"
        );
        self.state
    }

    fn finish(&mut self) {
        self.state = ScanState::Complete;
        tracing::debug!(
            width = self.grid.width(),
            height = self.grid.height(),
            memoized_colors = self.darkener.memo_len(),
            "Scan complete"
        );
    }

    /// Percentage of pixels written, `0.0..=100.0`.
    ///
    /// An empty image reports 100.
    pub fn progress(&self) -> f64 {
        let total = self.grid.width() * self.grid.height();
        if total == 0 {
            return 100.0;
        }
        let done = self.x + self.y * self.grid.width();
        done as f64 / total as f64 * 100.0
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == ScanState::Complete
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Cursor position `(x, y)`: the next pixel to be written.
    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub fn darken_amount(&self) -> f64 {
        self.darkener.amount()
    }

    /// The output buffer. Only final once [`is_complete()`](Self::is_complete)
    /// is true; before that it is a partial preview.
    #[inline]
    pub fn result(&self) -> &RgbaImage {
        &self.output
    }

    /// Hand the output buffer back, e.g. for [`with_buffer()`](Self::with_buffer).
    pub fn into_result(self) -> RgbaImage {
        self.output
    }
}
