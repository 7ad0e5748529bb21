//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::error::{Error, Result};
use tracing::warn;

/// Validate that a model's files exist on disk.
pub fn validate_model_config(name: &str, model: &ModelConfig) -> Result<()> {
    if !model.path.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.path.clone(),
        });
    }
    if !model.labels.exists() {
        return Err(Error::ConfigValidation {
            message: format!(
                "labels file for model '{name}' does not exist: {}",
                model.labels.display()
            ),
        });
    }
    Ok(())
}

/// Validate the configuration for analysis.
///
/// The detector is mandatory; the classifier is optional and its absence only
/// produces a warning since the pipeline degrades to coarse detector labels.
pub fn validate_config(config: &Config) -> Result<()> {
    let detector = config
        .models
        .detector
        .as_ref()
        .ok_or_else(|| Error::ConfigValidation {
            message: "no detector model configured (set [models.detector] or use --detector-path)"
                .to_string(),
        })?;
    validate_model_config("detector", detector)?;

    if let Some(classifier) = &config.models.classifier {
        if let Err(e) = validate_model_config("classifier", classifier) {
            warn!("Species classifier unavailable, using detector labels only: {e}");
        }
    }

    if config.batch.workers == 0 {
        return Err(Error::ConfigValidation {
            message: "batch.workers must be at least 1".to_string(),
        });
    }

    Ok(())
}
