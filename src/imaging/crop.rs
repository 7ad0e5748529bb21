//! In-memory cropping of detected regions.
//!
//! Crops are handed to the classification stage as pixel buffers; no
//! intermediate files are written.

use crate::output::BoundingBox;
use image::RgbImage;

/// Extract the sub-image covered by `bbox`, clipped to the image bounds.
///
/// Returns `None` when the clipped region has zero area (degenerate box or a
/// box entirely outside the image). Callers treat that as "no crop" and fall
/// back to the detector's coarse label.
pub fn crop_box(image: &RgbImage, bbox: &BoundingBox) -> Option<RgbImage> {
    let (img_w, img_h) = image.dimensions();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x1 = bbox.x1.max(0.0).floor() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let y1 = bbox.y1.max(0.0).floor() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x2 = (bbox.x2.max(0.0).ceil() as u32).min(img_w);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let y2 = (bbox.y2.max(0.0).ceil() as u32).min(img_h);

    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    let cropped = image::imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image();
    Some(cropped)
}
