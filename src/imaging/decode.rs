//! Image decoding and normalization.

use crate::constants::MAX_IMAGE_PIXELS;
use crate::error::{Error, Result};
use image::RgbImage;
use std::io::Cursor;
use std::path::Path;

/// Decode an image file into an RGB8 pixel buffer.
///
/// Dimensions are read from the header and validated before the full decode
/// so corrupt or hostile files are rejected cheaply. Alpha channels and
/// palettes are flattened to RGB.
pub fn decode_image(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path).map_err(|e| Error::ImageDecode {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    decode_image_bytes(&bytes, path)
}

/// Decode an in-memory image buffer into an RGB8 pixel buffer.
pub fn decode_image_bytes(bytes: &[u8], path: &Path) -> Result<RgbImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let (width, height) = reader.into_dimensions().map_err(|e| Error::ImageDecode {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    validate_dimensions(width, height)?;

    let dynamic = image::load_from_memory(bytes).map_err(|e| Error::ImageDecode {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    Ok(dynamic.to_rgb8())
}

/// Reject empty or decompression-bomb dimensions.
fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let pixel_count = u64::from(width).saturating_mul(u64::from(height));
    if pixel_count > MAX_IMAGE_PIXELS {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_valid_png() {
        let bytes = png_bytes(8, 6);
        let img = decode_image_bytes(&bytes, Path::new("test.png")).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_image_bytes(b"not an image at all", Path::new("bogus.jpg"));
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_decode_missing_file_fails() {
        let result = decode_image(Path::new("/nonexistent/trail_cam_0001.jpg"));
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_validate_dimensions_rejects_zero() {
        assert!(validate_dimensions(0, 100).is_err());
        assert!(validate_dimensions(100, 0).is_err());
        assert!(validate_dimensions(100, 100).is_ok());
    }

    #[test]
    fn test_validate_dimensions_rejects_bomb() {
        assert!(validate_dimensions(1_000_000, 1_000_000).is_err());
    }
}
