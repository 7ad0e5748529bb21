//! Single-image processing: decode, detect, classify per box.

use crate::imaging::{crop_box, decode_image};
use crate::inference::{AnimalDetector, Detection, SpeciesClassifier};
use crate::output::{DetectionRecord, ImageResult};
use image::RgbImage;
use std::path::Path;
use tracing::{debug, warn};

/// Run the full pipeline for one image file.
///
/// All faults terminate in an `error` result for the image; this function
/// never fails the batch. The returned detections preserve detector output
/// order.
pub fn process_image(
    path: &Path,
    detector: &dyn AnimalDetector,
    classifier: Option<&dyn SpeciesClassifier>,
) -> ImageResult {
    let image = match decode_image(path) {
        Ok(image) => image,
        Err(e) => {
            warn!("Failed to decode {}: {e}", path.display());
            return ImageResult::failure(e.to_string());
        }
    };

    process_decoded(&image, detector, classifier)
}

/// Run detection and per-box classification on an already-decoded image.
pub fn process_decoded(
    image: &RgbImage,
    detector: &dyn AnimalDetector,
    classifier: Option<&dyn SpeciesClassifier>,
) -> ImageResult {
    let detections = match detector.detect(image) {
        Ok(detections) => detections,
        Err(e) => return ImageResult::failure(e.to_string()),
    };

    if detections.is_empty() {
        return ImageResult::no_animal();
    }

    let records = detections
        .iter()
        .map(|detection| resolve_species(image, detection, classifier))
        .collect();

    ImageResult::animals(records)
}

/// Resolve the species for one detection box.
///
/// Classification is best effort: an unusable crop, a classifier fault, or
/// an empty prediction all fall back to the detector's coarse label. The box
/// itself is always kept.
fn resolve_species(
    image: &RgbImage,
    detection: &Detection,
    classifier: Option<&dyn SpeciesClassifier>,
) -> DetectionRecord {
    let fallback = |detection: &Detection| DetectionRecord {
        species: detection.label.clone(),
        detection_confidence: detection.confidence,
        classification_confidence: detection.confidence,
        bounding_box: detection.bbox,
    };

    let Some(classifier) = classifier else {
        return fallback(detection);
    };

    let Some(crop) = crop_box(image, &detection.bbox) else {
        debug!("Detection box degenerate after clipping, keeping coarse label");
        return fallback(detection);
    };

    match classifier.classify(&crop) {
        Ok(Some(label)) => DetectionRecord {
            species: label.name,
            detection_confidence: detection.confidence,
            classification_confidence: label.confidence,
            bounding_box: detection.bbox,
        },
        Ok(None) => fallback(detection),
        Err(e) => {
            warn!("Species classification failed for a box, keeping coarse label: {e}");
            fallback(detection)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::output::{BoundingBox, ImageStatus, SpeciesLabel};

    struct FakeDetector {
        detections: Vec<Detection>,
        fail: bool,
    }

    impl AnimalDetector for FakeDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>> {
            if self.fail {
                return Err(Error::Inference {
                    reason: "detector exploded".to_string(),
                });
            }
            Ok(self.detections.clone())
        }
    }

    struct FakeClassifier {
        response: Result<Option<SpeciesLabel>>,
    }

    impl SpeciesClassifier for FakeClassifier {
        fn classify(&self, _crop: &RgbImage) -> Result<Option<SpeciesLabel>> {
            match &self.response {
                Ok(label) => Ok(label.clone()),
                Err(_) => Err(Error::Inference {
                    reason: "classifier exploded".to_string(),
                }),
            }
        }
    }

    fn detection(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox {
                x1: 2.0,
                y1: 2.0,
                x2: 12.0,
                y2: 12.0,
            },
        }
    }

    fn test_image() -> RgbImage {
        RgbImage::new(32, 32)
    }

    #[test]
    fn test_no_detections_is_no_animal() {
        let detector = FakeDetector {
            detections: vec![],
            fail: false,
        };
        let result = process_decoded(&test_image(), &detector, None);
        assert_eq!(result.status, ImageStatus::NoAnimalDetected);
        assert_eq!(result.animals_detected, 0);
    }

    #[test]
    fn test_detector_fault_is_error_result() {
        let detector = FakeDetector {
            detections: vec![],
            fail: true,
        };
        let result = process_decoded(&test_image(), &detector, None);
        assert_eq!(result.status, ImageStatus::Error);
        assert!(result.error.unwrap().contains("detector exploded"));
    }

    #[test]
    fn test_classifier_refines_species() {
        let detector = FakeDetector {
            detections: vec![detection("animal", 0.9)],
            fail: false,
        };
        let classifier = FakeClassifier {
            response: Ok(Some(SpeciesLabel {
                name: "red fox".to_string(),
                confidence: 0.8,
            })),
        };

        let result = process_decoded(&test_image(), &detector, Some(&classifier));
        assert_eq!(result.status, ImageStatus::AnimalDetected);
        assert_eq!(result.detections[0].species, "red fox");
        assert_eq!(result.detections[0].detection_confidence, 0.9);
        assert_eq!(result.detections[0].classification_confidence, 0.8);
    }

    #[test]
    fn test_missing_classifier_keeps_coarse_label() {
        let detector = FakeDetector {
            detections: vec![detection("animal", 0.9)],
            fail: false,
        };

        let result = process_decoded(&test_image(), &detector, None);
        assert_eq!(result.detections[0].species, "animal");
        assert_eq!(result.detections[0].classification_confidence, 0.9);
    }

    #[test]
    fn test_classifier_fault_keeps_box_with_coarse_label() {
        let detector = FakeDetector {
            detections: vec![detection("animal", 0.9)],
            fail: false,
        };
        let classifier = FakeClassifier {
            response: Err(Error::Internal {
                message: String::new(),
            }),
        };

        let result = process_decoded(&test_image(), &detector, Some(&classifier));
        assert_eq!(result.status, ImageStatus::AnimalDetected);
        assert_eq!(result.animals_detected, 1);
        assert_eq!(result.detections[0].species, "animal");
    }

    #[test]
    fn test_empty_prediction_keeps_coarse_label() {
        let detector = FakeDetector {
            detections: vec![detection("deer", 0.7)],
            fail: false,
        };
        let classifier = FakeClassifier { response: Ok(None) };

        let result = process_decoded(&test_image(), &detector, Some(&classifier));
        assert_eq!(result.detections[0].species, "deer");
    }

    #[test]
    fn test_degenerate_crop_keeps_coarse_label() {
        // Box entirely outside the image: crop is impossible.
        let detector = FakeDetector {
            detections: vec![Detection {
                label: "animal".to_string(),
                confidence: 0.9,
                bbox: BoundingBox {
                    x1: 100.0,
                    y1: 100.0,
                    x2: 200.0,
                    y2: 200.0,
                },
            }],
            fail: false,
        };
        let classifier = FakeClassifier {
            response: Ok(Some(SpeciesLabel {
                name: "never used".to_string(),
                confidence: 1.0,
            })),
        };

        let result = process_decoded(&test_image(), &detector, Some(&classifier));
        assert_eq!(result.detections[0].species, "animal");
    }

    #[test]
    fn test_detector_order_preserved_in_records() {
        let detector = FakeDetector {
            detections: vec![detection("deer", 0.3), detection("badger", 0.9)],
            fail: false,
        };

        let result = process_decoded(&test_image(), &detector, None);
        assert_eq!(result.detections[0].species, "deer");
        assert_eq!(result.detections[1].species, "badger");
    }

    #[test]
    fn test_two_boxes_without_classifier() {
        let detector = FakeDetector {
            detections: vec![detection("deer", 0.8), detection("deer", 0.6)],
            fail: false,
        };

        let result = process_decoded(&test_image(), &detector, None);
        assert_eq!(result.animals_detected, 2);
        for (record, confidence) in result.detections.iter().zip([0.8, 0.6]) {
            assert_eq!(record.species, "deer");
            assert_eq!(record.detection_confidence, confidence);
            assert_eq!(record.classification_confidence, confidence);
        }
    }

    #[test]
    fn test_unreadable_file_is_error_result() {
        let detector = FakeDetector {
            detections: vec![],
            fail: false,
        };
        let result = process_image(Path::new("/nonexistent/trap.jpg"), &detector, None);
        assert_eq!(result.status, ImageStatus::Error);
        assert!(result.error.is_some());
    }
}
