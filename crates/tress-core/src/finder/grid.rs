//! Readable pixel grids and the owned RGBA buffer.

use crate::api::TressError;
use crate::color::{Color, Rgba};

/// A read-only, row-major grid of RGB pixels with its origin at `(0, 0)`.
///
/// Coordinates passed to [`color_at`](Self::color_at) are always within
/// `[0, width) × [0, height)`; implementations may panic otherwise.
pub trait PixelGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn color_at(&self, x: usize, y: usize) -> Color;

    /// Total number of pixels.
    #[inline]
    fn len(&self) -> usize {
        self.width() * self.height()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: PixelGrid + ?Sized> PixelGrid for &T {
    #[inline]
    fn width(&self) -> usize {
        (**self).width()
    }

    #[inline]
    fn height(&self) -> usize {
        (**self).height()
    }

    #[inline]
    fn color_at(&self, x: usize, y: usize) -> Color {
        (**self).color_at(x, y)
    }
}

/// An owned RGBA8 image, four bytes per pixel in row-major order.
///
/// Used both as scan input (alpha is ignored when read as a
/// [`PixelGrid`]) and as scan output.
///
/// # Example
///
/// ```
/// use tress_core::{PixelGrid, Rgba, RgbaImage};
///
/// let mut image = RgbaImage::new(3, 2);
/// assert_eq!(image.pixel(2, 1), Rgba::TRANSPARENT);
///
/// image.put_pixel(2, 1, Rgba::new(10, 20, 30, 255));
/// assert_eq!(image.color_at(2, 1).to_bytes(), [10, 20, 30]);
/// assert_eq!(image.as_raw().len(), 3 * 2 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaImage {
    /// Create a fully transparent black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TressError::DimensionMismatch`] if `data.len()` is not
    /// `width * height * 4`.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Result<Self, TressError> {
        let expected = width * height * 4;
        if data.len() != expected {
            return Err(TressError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Rgba) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.put_pixel(x, y, f(x, y));
            }
        }
        image
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        (y * self.width + x) * 4
    }

    /// Read the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        let i = self.offset(x, y);
        Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
    }

    /// Write the pixel at `(x, y)`.
    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, pixel: Rgba) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&pixel.to_bytes());
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl PixelGrid for RgbaImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn color_at(&self, x: usize, y: usize) -> Color {
        self.pixel(x, y).rgb()
    }
}
