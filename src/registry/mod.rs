//! Lazy, single-flight model loading.
//!
//! Models are loaded on first use and cached for the lifetime of the
//! registry. Concurrent first requests coalesce into one load; every caller
//! then shares the same model instance.

use crate::config::{InferenceDevice, ModelConfig};
use crate::error::{Error, Result};
use crate::inference::{AnimalDetector, OnnxClassifier, OnnxDetector, SpeciesClassifier};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::warn;

/// Source of detection and classification models.
///
/// Loading is synchronous and potentially slow (session construction reads
/// the model from disk); the registry moves it off the async runtime.
pub trait ModelLoader: Send + Sync + 'static {
    /// Load the animal detector. A failure here is fatal for the pipeline.
    fn load_detector(&self) -> Result<Arc<dyn AnimalDetector>>;

    /// Load the species classifier.
    ///
    /// `Ok(None)` means no classifier is available; the pipeline degrades to
    /// the detector's coarse labels.
    fn load_classifier(&self) -> Result<Option<Arc<dyn SpeciesClassifier>>>;
}

/// Loader backed by ONNX model files on disk.
pub struct OnnxModelLoader {
    detector: ModelConfig,
    classifier: Option<ModelConfig>,
    device: InferenceDevice,
}

impl OnnxModelLoader {
    /// Create a loader for the configured models.
    pub fn new(
        detector: ModelConfig,
        classifier: Option<ModelConfig>,
        device: InferenceDevice,
    ) -> Self {
        Self {
            detector,
            classifier,
            device,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load_detector(&self) -> Result<Arc<dyn AnimalDetector>> {
        let detector = OnnxDetector::load(&self.detector, self.device)?;
        Ok(Arc::new(detector))
    }

    fn load_classifier(&self) -> Result<Option<Arc<dyn SpeciesClassifier>>> {
        let Some(config) = &self.classifier else {
            return Ok(None);
        };

        // A broken classifier degrades the pipeline rather than failing it:
        // detection still works, species refinement is skipped.
        match OnnxClassifier::load(config, self.device) {
            Ok(classifier) => Ok(Some(Arc::new(classifier))),
            Err(e) => {
                warn!("Species classifier unavailable, using detector labels: {e}");
                Ok(None)
            }
        }
    }
}

/// Lazily-initialized cache of loaded models.
pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    detector: OnceCell<Arc<dyn AnimalDetector>>,
    classifier: OnceCell<Option<Arc<dyn SpeciesClassifier>>>,
}

impl ModelRegistry {
    /// Create a registry over the given loader. No models are loaded yet.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            detector: OnceCell::new(),
            classifier: OnceCell::new(),
        }
    }

    /// The animal detector, loading it on first call.
    ///
    /// Concurrent callers share a single load; a load failure is returned to
    /// every waiter and retried on the next call.
    pub async fn detector(&self) -> Result<Arc<dyn AnimalDetector>> {
        let detector = self
            .detector
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load_detector())
                    .await
                    .map_err(|e| Error::Internal {
                        message: format!("detector load task failed: {e}"),
                    })?
            })
            .await?;
        Ok(Arc::clone(detector))
    }

    /// The species classifier, loading it on first call.
    ///
    /// `None` (no classifier configured, or it failed to load) is cached
    /// permanently for this registry.
    pub async fn classifier(&self) -> Result<Option<Arc<dyn SpeciesClassifier>>> {
        let classifier = self
            .classifier
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load_classifier())
                    .await
                    .map_err(|e| Error::Internal {
                        message: format!("classifier load task failed: {e}"),
                    })?
            })
            .await?;
        Ok(classifier.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::inference::Detection;
    use crate::output::SpeciesLabel;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeDetector;

    impl AnimalDetector for FakeDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>> {
            Ok(Vec::new())
        }
    }

    struct FakeClassifier;

    impl SpeciesClassifier for FakeClassifier {
        fn classify(&self, _crop: &RgbImage) -> Result<Option<SpeciesLabel>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        detector_loads: AtomicUsize,
        classifier_loads: AtomicUsize,
        classifier_available: bool,
        fail_detector: bool,
    }

    impl ModelLoader for CountingLoader {
        fn load_detector(&self) -> Result<Arc<dyn AnimalDetector>> {
            self.detector_loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_detector {
                return Err(Error::Internal {
                    message: "load failed".to_string(),
                });
            }
            Ok(Arc::new(FakeDetector))
        }

        fn load_classifier(&self) -> Result<Option<Arc<dyn SpeciesClassifier>>> {
            self.classifier_loads.fetch_add(1, Ordering::SeqCst);
            if self.classifier_available {
                Ok(Some(Arc::new(FakeClassifier)))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_detector_requests_load_once() {
        let loader = Arc::new(CountingLoader::default());
        let registry = Arc::new(ModelRegistry::new(
            Arc::clone(&loader) as Arc<dyn ModelLoader>
        ));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.detector().await }));
        }

        let mut detectors = Vec::new();
        for handle in handles {
            detectors.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(loader.detector_loads.load(Ordering::SeqCst), 1);
        for detector in &detectors[1..] {
            assert!(Arc::ptr_eq(&detectors[0], detector));
        }
    }

    #[tokio::test]
    async fn test_absent_classifier_cached_permanently() {
        let loader = Arc::new(CountingLoader::default());
        let registry = ModelRegistry::new(Arc::clone(&loader) as Arc<dyn ModelLoader>);

        assert!(registry.classifier().await.unwrap().is_none());
        assert!(registry.classifier().await.unwrap().is_none());
        assert_eq!(loader.classifier_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_available_classifier_shared() {
        let loader = Arc::new(CountingLoader {
            classifier_available: true,
            ..CountingLoader::default()
        });
        let registry = ModelRegistry::new(Arc::clone(&loader) as Arc<dyn ModelLoader>);

        let first = registry.classifier().await.unwrap().unwrap();
        let second = registry.classifier().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.classifier_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detector_load_failure_propagates() {
        let loader = Arc::new(CountingLoader {
            fail_detector: true,
            ..CountingLoader::default()
        });
        let registry = ModelRegistry::new(loader as Arc<dyn ModelLoader>);

        assert!(registry.detector().await.is_err());
    }
}
