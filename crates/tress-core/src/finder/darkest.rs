//! Minimum-luma search over square neighbourhoods.

use std::ops::RangeInclusive;

use super::cache::{CacheStrategy, ColumnCache, Shade};
use super::grid::PixelGrid;
use crate::color::Rgba;

/// Finds the darkest color in the `(2r+1) × (2r+1)` square around a pixel.
///
/// The square is clipped to the grid; coordinates outside it are skipped.
/// Ties keep the first pixel met when scanning columns left to right and
/// each column top to bottom. The result is always opaque, or
/// [`Rgba::TRANSPARENT`] when the clipped square is empty.
///
/// A finder remembers column results for the grid it was last used with.
/// Call [`clear()`](Self::clear) before pointing it at a different image.
///
/// # Example
///
/// ```
/// use tress_core::{DarkestFinder, Rgba, RgbaImage};
///
/// let mut image = RgbaImage::from_fn(5, 5, |_, _| Rgba::new(200, 200, 200, 255));
/// image.put_pixel(4, 4, Rgba::new(10, 20, 30, 255));
///
/// let mut finder = DarkestFinder::default();
/// assert_eq!(finder.find_darkest(&image, 3, 3, 1), Rgba::new(10, 20, 30, 255));
/// assert_eq!(finder.find_darkest(&image, 1, 1, 1), Rgba::new(200, 200, 200, 255));
/// ```
#[derive(Debug, Clone)]
pub struct DarkestFinder {
    cache: ColumnCache,
}

impl DarkestFinder {
    pub fn new(strategy: CacheStrategy) -> Self {
        Self {
            cache: ColumnCache::new(strategy),
        }
    }

    #[inline]
    pub fn strategy(&self) -> CacheStrategy {
        self.cache.strategy()
    }

    /// Forget every cached column.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Darkest color around `(tx, ty)`, reusing cached column strips.
    pub fn find_darkest<G: PixelGrid + ?Sized>(
        &mut self,
        grid: &G,
        tx: usize,
        ty: usize,
        radius: usize,
    ) -> Rgba {
        let (width, height) = (grid.width(), grid.height());
        let (Some(columns), Some(rows)) = (
            clipped_span(tx, radius, width),
            clipped_span(ty, radius, height),
        ) else {
            return Rgba::TRANSPARENT;
        };
        self.cache.prepare(width, height);

        let mut darkest: Option<Shade> = None;
        for x in columns {
            let strip = match self.cache.get(x, ty, radius) {
                Some(hit) => hit,
                None => {
                    let strip = darkest_in_column(grid, x, rows.clone());
                    self.cache.insert(x, ty, radius, strip);
                    strip
                }
            };
            darkest = darker(darkest, strip);
        }

        darkest.map_or(Rgba::TRANSPARENT, |shade| shade.color.opaque())
    }

    /// Reference implementation that scans every pixel of the square.
    ///
    /// Always agrees with [`find_darkest()`](Self::find_darkest); it exists
    /// so the cached path can be checked against it.
    pub fn find_darkest_uncached<G: PixelGrid + ?Sized>(
        grid: &G,
        tx: usize,
        ty: usize,
        radius: usize,
    ) -> Rgba {
        let (Some(columns), Some(rows)) = (
            clipped_span(tx, radius, grid.width()),
            clipped_span(ty, radius, grid.height()),
        ) else {
            return Rgba::TRANSPARENT;
        };

        let mut darkest: Option<Shade> = None;
        for x in columns {
            for y in rows.clone() {
                let color = grid.color_at(x, y);
                darkest = darker(
                    darkest,
                    Some(Shade {
                        color,
                        luma: color.luma(),
                    }),
                );
            }
        }

        darkest.map_or(Rgba::TRANSPARENT, |shade| shade.color.opaque())
    }
}

impl Default for DarkestFinder {
    fn default() -> Self {
        Self::new(CacheStrategy::default())
    }
}

/// `[center - radius, center + radius]` intersected with `[0, len)`.
#[inline]
fn clipped_span(center: usize, radius: usize, len: usize) -> Option<RangeInclusive<usize>> {
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).min(len.checked_sub(1)?);
    (start <= end).then_some(start..=end)
}

fn darkest_in_column<G: PixelGrid + ?Sized>(
    grid: &G,
    x: usize,
    rows: RangeInclusive<usize>,
) -> Option<Shade> {
    let mut darkest: Option<Shade> = None;
    for y in rows {
        let color = grid.color_at(x, y);
        let luma = color.luma();
        if darkest.map_or(true, |d| luma < d.luma) {
            darkest = Some(Shade { color, luma });
        }
    }
    darkest
}

/// Keep `current` unless `candidate` is strictly darker.
#[inline]
fn darker(current: Option<Shade>, candidate: Option<Shade>) -> Option<Shade> {
    match (current, candidate) {
        (Some(c), Some(n)) if n.luma < c.luma => Some(n),
        (None, n) => n,
        (c, _) => c,
    }
}
