//! 8-bit RGB and RGBA color types
//!
//! Brightness comparisons use Rec. 709 luma weights applied directly to
//! the stored channel values (no gamma decoding).

/// Fixed-point luma, scaled by 10 000.
///
/// `2126·R + 7152·G + 722·B` is exact in integer arithmetic, so two colors
/// with the same luma always compare equal and ties are decided by scan
/// order alone.
pub type Luma = u32;

/// An opaque color with 8-bit red, green and blue channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel (0..=255)
    pub r: u8,
    /// Green channel (0..=255)
    pub g: u8,
    /// Blue channel (0..=255)
    pub b: u8,
}

impl Color {
    /// Pure black.
    pub const BLACK: Color = Color::new(0, 0, 0);

    /// Create a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array [R, G, B].
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array [R, G, B].
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Pack into a 24-bit key: `r << 16 | g << 8 | b`.
    ///
    /// # Example
    /// ```
    /// use tress_core::Color;
    /// assert_eq!(Color::new(0x12, 0x34, 0x56).key(), 0x123456);
    /// ```
    #[inline]
    pub const fn key(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Inverse of [`key()`](Self::key). Bits above 24 are ignored.
    #[inline]
    pub const fn from_key(key: u32) -> Self {
        Self::new((key >> 16) as u8, (key >> 8) as u8, key as u8)
    }

    /// Luma `0.2126·R + 0.7152·G + 0.0722·B`, scaled by 10 000.
    ///
    /// # Example
    /// ```
    /// use tress_core::Color;
    /// assert_eq!(Color::new(255, 255, 255).luma(), 2_550_000);
    /// assert!(Color::new(0, 0, 255).luma() < Color::new(255, 0, 0).luma());
    /// ```
    #[inline]
    pub const fn luma(self) -> Luma {
        2126 * self.r as u32 + 7152 * self.g as u32 + 722 * self.b as u32
    }

    /// Attach a fully opaque alpha channel.
    #[inline]
    pub const fn opaque(self) -> Rgba {
        Rgba::new(self.r, self.g, self.b, 255)
    }
}

/// A color with 8-bit red, green, blue and alpha channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Transparent black, the value of every unwritten output pixel.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Drop the alpha channel.
    #[inline]
    pub const fn rgb(self) -> Color {
        Color::new(self.r, self.g, self.b)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        color.opaque()
    }
}
