//! Result cache seam for the batch coordinator.

use crate::output::ImageResult;
use std::path::Path;

/// Cache of per-image pipeline results, keyed by source path.
///
/// The pipeline consults the cache before running inference and stores every
/// computed result afterwards. Correctness must never depend on hits: the
/// default implementation misses unconditionally.
pub trait ResultCache: Send + Sync {
    /// Look up a cached result for a source image.
    fn get(&self, path: &Path) -> Option<ImageResult>;

    /// Store a computed result.
    fn set(&self, path: &Path, result: &ImageResult);

    /// Drop any cached result for a source image.
    fn invalidate(&self, path: &Path);
}

/// Cache that never hits.
pub struct NoopCache;

impl ResultCache for NoopCache {
    fn get(&self, _path: &Path) -> Option<ImageResult> {
        None
    }

    fn set(&self, _path: &Path, _result: &ImageResult) {}

    fn invalidate(&self, _path: &Path) {}
}
