use image::{ImageError, ImageFormat, ImageReader, Limits};
use std::io::Cursor;
use tress_core::RgbaImage;

use crate::error::FilterError;

/// Largest accepted width or height of an uploaded image
pub const MAX_DIMENSION: u32 = 16384;

/// Decode a PNG or JPEG into an RGBA buffer.
///
/// The format is sniffed from the leading bytes; file names and content
/// types are not trusted. Dimensions are read from the header and checked
/// before any pixel data is decoded.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, FilterError> {
    let format = image::guess_format(bytes).map_err(|_| FilterError::UnsupportedFormat)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(FilterError::UnsupportedFormat);
    }

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| FilterError::Decode(e.to_string()))?;
    let too_large = FilterError::ImageTooLarge {
        width,
        height,
        max: MAX_DIMENSION,
    };
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(too_large);
    }

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(decode_limits());
    let decoded = reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => too_large,
        e => FilterError::Decode(e.to_string()),
    })?;

    let rgba = decoded.to_rgba8();
    tracing::debug!(?format, width, height, "Decoded image");
    Ok(RgbaImage::from_rgba(
        width as usize,
        height as usize,
        rgba.into_raw(),
    )?)
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    // Room for a 16-bit RGBA frame at the largest size
    limits.max_alloc = Some(u64::from(MAX_DIMENSION).pow(2) * 8);
    limits
}

/// Encode an RGBA buffer as an 8-bit RGBA PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, FilterError> {
    let (width, height) = image.dimensions();
    let width = u32::try_from(width).map_err(|e| FilterError::PngEncode(e.to_string()))?;
    let height = u32::try_from(height).map_err(|e| FilterError::PngEncode(e.to_string()))?;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| FilterError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| FilterError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}
