//! Two-stage inference: animal detection and species classification.

mod classifier;
mod detector;
mod labels;
mod session;
mod tensor;

pub use classifier::OnnxClassifier;
pub use detector::OnnxDetector;
pub use labels::load_labels;

use crate::error::Result;
use crate::output::{BoundingBox, SpeciesLabel};
use image::RgbImage;

/// A candidate animal region produced by the detection stage.
///
/// `label` is the detector's coarse class (e.g. "animal", "deer"); the
/// classification stage refines it into a species when available.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Coarse class label from the detector.
    pub label: String,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Bounding box in source image pixel coordinates.
    pub bbox: BoundingBox,
}

/// First-pass model locating candidate animal regions in a full image.
///
/// Implementations must be safe for concurrent invocation from multiple
/// tasks; the ONNX-backed implementation serializes session access
/// internally.
pub trait AnimalDetector: Send + Sync {
    /// Detect animal regions in a decoded image.
    ///
    /// Returns boxes in the order produced by the underlying model; callers
    /// must not assume any sorting. Zero boxes is a valid result.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>>;
}

/// Second-pass model assigning a species label to a cropped region.
pub trait SpeciesClassifier: Send + Sync {
    /// Classify a cropped region, returning the top-1 species label.
    ///
    /// `None` means the model produced no usable prediction for this crop;
    /// the pipeline falls back to the detector's coarse label.
    fn classify(&self, crop: &RgbImage) -> Result<Option<SpeciesLabel>>;
}
