//! Tensor preprocessing shared by both inference stages.

use image::RgbImage;

/// Resize an RGB image to `size`x`size` and convert it to an NCHW float
/// tensor normalized to [0, 1].
///
/// Returns the tensor shape and its data buffer.
pub fn image_to_nchw(image: &RgbImage, size: u32) -> ([usize; 4], Vec<f32>) {
    use image::imageops::FilterType;

    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);

    let plane = (size * size) as usize;
    let mut data = vec![0f32; 3 * plane];
    let raw = resized.as_raw();

    for idx in 0..plane {
        data[idx] = f32::from(raw[idx * 3]) / 255.0;
        data[plane + idx] = f32::from(raw[idx * 3 + 1]) / 255.0;
        data[2 * plane + idx] = f32::from(raw[idx * 3 + 2]) / 255.0;
    }

    ([1, 3, size as usize, size as usize], data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_nchw_shape_and_range() {
        let img = RgbImage::from_pixel(10, 6, Rgb([255, 0, 128]));
        let (shape, data) = image_to_nchw(&img, 4);

        assert_eq!(shape, [1, 3, 4, 4]);
        assert_eq!(data.len(), 3 * 4 * 4);

        // Uniform image survives resampling exactly.
        assert_eq!(data[0], 1.0); // R plane
        assert_eq!(data[16], 0.0); // G plane
        assert!((data[32] - 128.0 / 255.0).abs() < 1e-6); // B plane
    }
}
