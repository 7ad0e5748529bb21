//! ONNX-backed animal detection stage.

use crate::config::ModelConfig;
use crate::constants::{DETECTION_CONFIDENCE_THRESHOLD, DETECTOR_INPUT_SIZE, NMS_IOU_THRESHOLD};
use crate::error::{Error, Result};
use crate::inference::{AnimalDetector, Detection, load_labels, session, tensor};
use crate::output::BoundingBox;
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// Animal detector wrapping a YOLO-style ONNX model.
///
/// The session is serialized behind a mutex so the detector can be invoked
/// concurrently from many tasks without external locking.
pub struct OnnxDetector {
    session: Mutex<Session>,
    input_name: String,
    labels: Vec<String>,
}

impl OnnxDetector {
    /// Load the detector model and its labels.
    ///
    /// A missing model file is a fatal configuration fault: the pipeline must
    /// not serve detection requests without it.
    pub fn load(config: &ModelConfig, device: crate::config::InferenceDevice) -> Result<Self> {
        if !config.path.exists() {
            return Err(Error::ModelFileNotFound {
                path: config.path.clone(),
            });
        }

        let labels = load_labels(&config.labels)?;

        let session = session::build_session(&config.path, device).map_err(|e| {
            Error::DetectorBuild {
                reason: e.to_string(),
            }
        })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| Error::DetectorBuild {
                reason: "model has no inputs".to_string(),
            })?;

        info!(
            "Loaded animal detector: {} ({} classes)",
            config.path.display(),
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            labels,
        })
    }

    /// The detector's coarse class labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl AnimalDetector for OnnxDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (img_w, img_h) = image.dimensions();

        let (shape, data) = tensor::image_to_nchw(image, DETECTOR_INPUT_SIZE);
        let input = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?
            .into_dyn();

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "detector session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let (_, output) = outputs.iter().next().ok_or_else(|| Error::Inference {
            reason: "detector produced no outputs".to_string(),
        })?;
        let (out_shape, out_data) =
            output.try_extract_tensor::<f32>().map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        // Expected layout: [1, 4 + num_classes, num_anchors].
        if out_shape.len() != 3 {
            return Err(Error::Inference {
                reason: format!("unexpected detector output shape: {out_shape:?}"),
            });
        }
        #[allow(clippy::cast_sign_loss)]
        let num_features = out_shape[1] as usize;
        #[allow(clippy::cast_sign_loss)]
        let num_anchors = out_shape[2] as usize;
        if num_features != 4 + self.labels.len() {
            return Err(Error::Inference {
                reason: format!(
                    "detector output features {} do not match {} labels",
                    num_features,
                    self.labels.len()
                ),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let scale_x = img_w as f32 / DETECTOR_INPUT_SIZE as f32;
        #[allow(clippy::cast_precision_loss)]
        let scale_y = img_h as f32 / DETECTOR_INPUT_SIZE as f32;
        #[allow(clippy::cast_precision_loss)]
        let detections = postprocess(
            out_data,
            num_anchors,
            &self.labels,
            scale_x,
            scale_y,
            img_w as f32,
            img_h as f32,
        );

        debug!("Detector found {} boxes above threshold", detections.len());
        Ok(detections)
    }
}

/// Convert raw YOLO output (column-major `[4 + C, N]`) into detections.
///
/// Boxes are filtered against the fixed confidence threshold, mapped back to
/// source pixel coordinates, clamped to the image, and de-duplicated with
/// NMS. The surviving boxes keep the model's anchor order; no re-sorting by
/// confidence happens here.
fn postprocess(
    data: &[f32],
    num_anchors: usize,
    labels: &[String],
    scale_x: f32,
    scale_y: f32,
    img_w: f32,
    img_h: f32,
) -> Vec<Detection> {
    let num_classes = labels.len();
    let mut candidates = Vec::new();

    for i in 0..num_anchors {
        // Data layout: [cx, cy, w, h, cls0_score, cls1_score, ...] stored
        // column-major across the feature rows.
        let cx = data[i];
        let cy = data[num_anchors + i];
        let w = data[2 * num_anchors + i];
        let h = data[3 * num_anchors + i];

        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..num_classes {
            let score = data[(4 + c) * num_anchors + i];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if !best_score.is_finite() || best_score < DETECTION_CONFIDENCE_THRESHOLD {
            continue;
        }
        if !cx.is_finite() || !cy.is_finite() || w <= 0.0 || h <= 0.0 {
            continue;
        }

        let x1 = ((cx - w / 2.0) * scale_x).clamp(0.0, img_w);
        let y1 = ((cy - h / 2.0) * scale_y).clamp(0.0, img_h);
        let x2 = ((cx + w / 2.0) * scale_x).clamp(0.0, img_w);
        let y2 = ((cy + h / 2.0) * scale_y).clamp(0.0, img_h);

        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        candidates.push(Detection {
            label: labels[best_class].clone(),
            confidence: best_score,
            bbox: BoundingBox { x1, y1, x2, y2 },
        });
    }

    nms_keep_order(candidates, NMS_IOU_THRESHOLD)
}

/// Greedy NMS that suppresses by confidence but emits survivors in their
/// original (model output) order.
fn nms_keep_order(candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let n = candidates.len();
    if n <= 1 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| {
        candidates[b]
            .confidence
            .partial_cmp(&candidates[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; n];
    for (rank, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        for &j in &order[rank + 1..] {
            if !suppressed[j] && iou(&candidates[i].bbox, &candidates[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(i, d)| (!suppressed[i]).then_some(d))
        .collect()
}

/// Intersection over union of two boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }
    let union = a.width() * a.height() + b.width() * b.height() - inter;
    inter / union
}
