//! Result type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Axis-aligned bounding box in pixel coordinates of the source image.
///
/// Invariant: `x1 < x2` and `y1 < y2` for any box produced by the detection
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Box width in pixels.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Box height in pixels.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// A species name with its classification confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesLabel {
    /// Species name.
    pub name: String,
    /// Classification confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// One detected animal: a bounding box plus its resolved species label.
///
/// When the classification stage is unavailable or its input crop is invalid,
/// `species` carries the detector's coarse class and
/// `classification_confidence` equals `detection_confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Resolved species name.
    pub species: String,
    /// Detector confidence for the bounding box (0.0 - 1.0).
    pub detection_confidence: f32,
    /// Classifier confidence for the species label (0.0 - 1.0).
    pub classification_confidence: f32,
    /// Bounding box in source image pixel coordinates.
    pub bounding_box: BoundingBox,
}

/// Terminal state of the single-image pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// The detector returned zero boxes.
    NoAnimalDetected,
    /// At least one animal was detected.
    AnimalDetected,
    /// Decoding or inference failed for this image.
    Error,
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAnimalDetected => write!(f, "no_animal_detected"),
            Self::AnimalDetected => write!(f, "animal_detected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Pipeline output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Terminal pipeline state.
    pub status: ImageStatus,
    /// Number of detection records produced.
    pub animals_detected: usize,
    /// Detection records, in detector output order.
    pub detections: Vec<DetectionRecord>,
    /// Fault description when `status` is `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageResult {
    /// Result for an image with no detected animals.
    pub fn no_animal() -> Self {
        Self {
            status: ImageStatus::NoAnimalDetected,
            animals_detected: 0,
            detections: Vec::new(),
            error: None,
        }
    }

    /// Result for an image with one or more detections.
    pub fn animals(detections: Vec<DetectionRecord>) -> Self {
        Self {
            status: ImageStatus::AnimalDetected,
            animals_detected: detections.len(),
            detections,
            error: None,
        }
    }

    /// Result for an image whose processing failed.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: ImageStatus::Error,
            animals_detected: 0,
            detections: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// One entry of a batch: the source file and its pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    /// Path to the source image file.
    pub file: PathBuf,
    /// Pipeline result for the file.
    #[serde(flatten)]
    pub result: ImageResult,
}

/// Aggregated counts for one batch invocation.
///
/// `species_count` tallies one species per image with animals (the image's
/// first detection), not one per detection record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of images submitted.
    pub total_images: usize,
    /// Images with at least one detection.
    pub animals_detected: usize,
    /// Images with zero detections.
    pub empty_images: usize,
    /// Images that failed to process.
    pub low_quality: usize,
    /// Per-species image counts, sorted by species name.
    pub species_count: BTreeMap<String, usize>,
    /// Wall-clock batch duration in seconds.
    pub processing_time: f64,
}
