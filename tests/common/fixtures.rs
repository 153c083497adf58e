//! Test fixtures and constants.

use tress_core::{Color, Rgba, RgbaImage};
use tresser::rendering::encode_png;

/// Source color used by the solid-image fixtures
pub const SOLID_COLOR: Color = Color::new(100, 150, 200);

/// Uniform image of [`SOLID_COLOR`]
pub fn solid_image(width: usize, height: usize) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, _| SOLID_COLOR.opaque())
}

/// Light grey image with a dark 3x3 block centred on (cx, cy)
pub fn dark_block_image(width: usize, height: usize, cx: usize, cy: usize) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if x.abs_diff(cx) <= 1 && y.abs_diff(cy) <= 1 {
            Rgba::new(20, 30, 40, 255)
        } else {
            Rgba::new(220, 220, 220, 255)
        }
    })
}

/// Colorful gradient, large enough that a scan takes several steps
pub fn gradient_image(width: usize, height: usize) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba::new(
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
            255,
        )
    })
}

pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    encode_png(image).expect("Failed to encode fixture PNG")
}
