//! Cooperative driving of a [`RasterScanner`] to completion.

use std::path::Path;
use std::time::{Duration, Instant};
use tress_core::{CacheStrategy, PixelGrid, RasterScanner, RgbaImage, ScanOptions, TressError};

use crate::error::FilterError;
use crate::models::FilterConfig;
use crate::rendering::{decode_image, encode_png};

/// Everything needed to run one filter pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub radius: usize,
    pub darken_amount: f64,
    /// Time budget handed to every `advance` call
    pub step_budget: Duration,
    pub cache: CacheStrategy,
}

impl FilterParams {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            radius: config.radius,
            darken_amount: config.darken_amount,
            step_budget: config.step_budget(),
            cache: config.cache_strategy(),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.radius, self.darken_amount).cache(self.cache)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        self.scan_options().validate()?;
        // A zero budget never makes progress
        if self.step_budget.is_zero() {
            return Err(TressError::InvalidParameter {
                name: "step_budget",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Build a scanner over `grid` with these parameters.
    pub fn start<G: PixelGrid>(&self, grid: G) -> Result<RasterScanner<G>, FilterError> {
        self.validate()?;
        Ok(RasterScanner::with_options(grid, self.scan_options())?)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

/// Advance `scanner` until it completes, calling `on_progress` after every
/// step. Returns the number of steps taken.
pub fn run_blocking<G, F>(scanner: &mut RasterScanner<G>, budget: Duration, mut on_progress: F) -> usize
where
    G: PixelGrid,
    F: FnMut(f64),
{
    let mut steps = 0;
    while !scanner.is_complete() {
        scanner.advance(budget);
        steps += 1;
        on_progress(scanner.progress());
    }
    steps
}

/// Filter an in-memory image to completion.
pub fn filter_image<F: FnMut(f64)>(
    image: RgbaImage,
    params: &FilterParams,
    on_progress: F,
) -> Result<RgbaImage, FilterError> {
    let mut scanner = params.start(image)?;
    let steps = run_blocking(&mut scanner, params.step_budget, on_progress);
    tracing::debug!(steps, "Filter finished");
    Ok(scanner.into_result())
}

/// Summary of a file-to-file filter run
#[derive(Debug, Clone, Copy)]
pub struct FilterReport {
    pub width: usize,
    pub height: usize,
    pub elapsed: Duration,
}

/// Read a PNG/JPEG file, filter it and write the result as PNG.
pub fn filter_file<F: FnMut(f64)>(
    input: &Path,
    output: &Path,
    params: &FilterParams,
    on_progress: F,
) -> Result<FilterReport, FilterError> {
    let started = Instant::now();
    let bytes = std::fs::read(input)?;
    let image = decode_image(&bytes)?;
    let (width, height) = image.dimensions();
    tracing::info!(input = %input.display(), width, height, "Filtering image");

    let filtered = filter_image(image, params, on_progress)?;
    std::fs::write(output, encode_png(&filtered)?)?;

    Ok(FilterReport {
        width,
        height,
        elapsed: started.elapsed(),
    })
}

/// Logs progress once per whole 10 % step.
#[derive(Debug, Default)]
pub struct ProgressLog {
    next_decile: u32,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress value; returns the decile logged, if any.
    pub fn observe(&mut self, progress: f64) -> Option<u32> {
        let decile = (progress / 10.0).floor().clamp(0.0, 10.0) as u32;
        if decile < self.next_decile || decile == 0 {
            return None;
        }
        self.next_decile = decile + 1;
        tracing::info!("{} % completed...", decile * 10);
        Some(decile * 10)
    }
}
