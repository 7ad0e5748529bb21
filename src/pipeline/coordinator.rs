//! Concurrent batch processing over a bounded worker pool.

use crate::constants::MAX_WORKERS;
use crate::inference::{AnimalDetector, SpeciesClassifier};
use crate::output::{BatchSummary, ImageReport, ImageResult, ImageStatus, progress};
use crate::pipeline::cache::{NoopCache, ResultCache};
use crate::pipeline::process_image;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::debug;

/// Complete output of one batch invocation.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Per-image reports, in submission order.
    pub reports: Vec<ImageReport>,
    /// Aggregated batch counts.
    pub summary: BatchSummary,
}

/// Process a batch of image files concurrently.
///
/// At most `workers` images are in flight at once; inference itself runs on
/// the blocking thread pool. Reports come back in submission order regardless
/// of completion order, with exactly one entry per submitted file. Individual
/// image faults (including worker panics) become `error` reports and never
/// abort the batch.
pub async fn process_batch(
    paths: Vec<PathBuf>,
    detector: Arc<dyn AnimalDetector>,
    classifier: Option<Arc<dyn SpeciesClassifier>>,
    workers: usize,
    progress: Option<ProgressBar>,
) -> BatchOutcome {
    process_batch_with_cache(paths, detector, classifier, workers, progress, Arc::new(NoopCache))
        .await
}

/// [`process_batch`] with an explicit result cache.
///
/// Cached results bypass decode and inference entirely but still count in the
/// summary.
pub async fn process_batch_with_cache(
    paths: Vec<PathBuf>,
    detector: Arc<dyn AnimalDetector>,
    classifier: Option<Arc<dyn SpeciesClassifier>>,
    workers: usize,
    progress: Option<ProgressBar>,
    cache: Arc<dyn ResultCache>,
) -> BatchOutcome {
    let start_time = Instant::now();
    let workers = workers.clamp(1, MAX_WORKERS);
    let semaphore = Arc::new(Semaphore::new(workers));

    debug!("Processing {} images with {} workers", paths.len(), workers);

    let mut handles = Vec::with_capacity(paths.len());
    for path in &paths {
        let path = path.clone();
        let detector = Arc::clone(&detector);
        let classifier = classifier.clone();
        let semaphore = Arc::clone(&semaphore);
        let progress = progress.clone();
        let cache = Arc::clone(&cache);

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return ImageResult::failure("worker pool shut down");
            };

            if let Some(cached) = cache.get(&path) {
                progress::inc_progress(progress.as_ref());
                return cached;
            }

            let result = tokio::task::spawn_blocking({
                let path = path.clone();
                move || process_image(&path, detector.as_ref(), classifier.as_deref())
            })
            .await
            .unwrap_or_else(|e| ImageResult::failure(format!("worker failed: {e}")));

            cache.set(&path, &result);
            progress::inc_progress(progress.as_ref());
            result
        }));
    }

    // Await in submission order so reports are deterministic.
    let mut reports = Vec::with_capacity(paths.len());
    for (path, handle) in paths.into_iter().zip(handles) {
        let result = handle
            .await
            .unwrap_or_else(|e| ImageResult::failure(format!("worker failed: {e}")));
        reports.push(ImageReport { file: path, result });
    }

    progress::finish_progress(progress, "Analysis complete");

    let summary = summarize(&reports, start_time.elapsed().as_secs_f64());
    BatchOutcome { reports, summary }
}

/// Aggregate per-image reports into batch counts.
///
/// Each image with animals contributes one tally to `species_count`, keyed by
/// its first detection's species.
fn summarize(reports: &[ImageReport], processing_time: f64) -> BatchSummary {
    let mut summary = BatchSummary {
        total_images: reports.len(),
        processing_time,
        ..BatchSummary::default()
    };

    for report in reports {
        match report.result.status {
            ImageStatus::AnimalDetected => {
                summary.animals_detected += 1;
                if let Some(first) = report.result.detections.first() {
                    *summary.species_count.entry(first.species.clone()).or_insert(0) += 1;
                }
            }
            ImageStatus::NoAnimalDetected => summary.empty_images += 1,
            ImageStatus::Error => summary.low_quality += 1,
        }
    }

    summary
}
