//! ONNX-backed species classification stage.

use crate::config::ModelConfig;
use crate::constants::CLASSIFIER_INPUT_SIZE;
use crate::error::{Error, Result};
use crate::inference::{SpeciesClassifier, load_labels, session, tensor};
use crate::output::SpeciesLabel;
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// Species classifier refining detector crops into fine-grained labels.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    labels: Vec<String>,
}

impl OnnxClassifier {
    /// Load the classifier model and its labels.
    pub fn load(config: &ModelConfig, device: crate::config::InferenceDevice) -> Result<Self> {
        if !config.path.exists() {
            return Err(Error::ModelFileNotFound {
                path: config.path.clone(),
            });
        }

        let labels = load_labels(&config.labels)?;

        let session = session::build_session(&config.path, device).map_err(|e| {
            Error::ClassifierBuild {
                reason: e.to_string(),
            }
        })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| Error::ClassifierBuild {
                reason: "model has no inputs".to_string(),
            })?;

        info!(
            "Loaded species classifier: {} ({} species)",
            config.path.display(),
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            labels,
        })
    }

    /// The classifier's species labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl SpeciesClassifier for OnnxClassifier {
    fn classify(&self, crop: &RgbImage) -> Result<Option<SpeciesLabel>> {
        let (shape, data) = tensor::image_to_nchw(crop, CLASSIFIER_INPUT_SIZE);
        let input = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?
            .into_dyn();

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "classifier session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let (_, output) = outputs.iter().next().ok_or_else(|| Error::Inference {
            reason: "classifier produced no outputs".to_string(),
        })?;
        let (_, logits) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let probabilities = softmax(logits);
        let result = top1(&probabilities, &self.labels);
        if let Some(label) = &result {
            debug!("Classified crop as {} ({:.3})", label.name, label.confidence);
        }
        Ok(result)
    }
}

/// Numerically stable softmax over raw logits.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

/// Top-1 prediction paired with its label.
///
/// Returns `None` when the probability vector is empty, non-finite, or the
/// winning index has no corresponding label (model/labels mismatch).
fn top1(probabilities: &[f32], labels: &[String]) -> Option<SpeciesLabel> {
    let (index, &confidence) = probabilities
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;

    if !confidence.is_finite() || confidence <= 0.0 {
        return None;
    }

    labels.get(index).map(|name| SpeciesLabel {
        name: name.clone(),
        confidence,
    })
}
