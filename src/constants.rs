//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "camtrap";

/// Detection confidence threshold.
///
/// Only detector boxes with confidence at or above this value are retained.
/// This is a fixed design parameter of the two-stage pipeline, not a per-call
/// setting; changing it changes what counts as a detection everywhere.
pub const DETECTION_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// IoU threshold for non-maximum suppression in the detection stage.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Detector model input size (square, pixels).
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Classifier model input size (square, pixels).
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// Default number of concurrent image workers per batch.
pub const DEFAULT_WORKERS: usize = 4;

/// Maximum allowed worker count.
///
/// The model handles are shared across workers and inference is serialized
/// per session, so worker counts beyond this only add queueing overhead.
pub const MAX_WORKERS: usize = 64;

/// Maximum decompressed pixel count accepted by the decoder.
///
/// Checked against the image header before full decode to reject
/// decompression bombs.
pub const MAX_IMAGE_PIXELS: u64 = 100_000_000;

/// Image file extensions accepted for analysis.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "gif"];

/// Combined output file names.
pub mod combined_filenames {
    /// Combined JSON report filename.
    pub const JSON: &str = "camtrap_results.json";
    /// Combined CSV report filename.
    pub const CSV: &str = "camtrap_results.csv";
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for confidence formatting.
    pub const DECIMAL_PLACES: usize = 4;
}
