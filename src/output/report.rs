//! Combined JSON batch report.

use crate::error::{Error, Result};
use crate::output::{BatchSummary, ImageReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Combined report for one batch invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Analysis timestamp.
    pub analysis_date: DateTime<Utc>,
    /// Detector model file used for analysis.
    pub model: String,
    /// Aggregated batch counts.
    pub summary: BatchSummary,
    /// Per-image results, in submission order.
    pub results: Vec<ImageReport>,
}

impl BatchReport {
    /// Create a report timestamped now.
    pub fn new(model: impl Into<String>, summary: BatchSummary, results: Vec<ImageReport>) -> Self {
        Self {
            analysis_date: Utc::now(),
            model: model.into(),
            summary,
            results,
        }
    }
}

/// Write the combined report as pretty-printed JSON.
pub fn write_json_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(|e| Error::JsonWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::output::{ImageResult, ImageStatus};
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_and_read_back() {
        let file = NamedTempFile::new().unwrap();
        let report = BatchReport::new(
            "detector.onnx",
            BatchSummary {
                total_images: 1,
                empty_images: 1,
                ..BatchSummary::default()
            },
            vec![ImageReport {
                file: PathBuf::from("trap01.jpg"),
                result: ImageResult::no_animal(),
            }],
        );

        write_json_report(file.path(), &report).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let parsed: BatchReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.model, "detector.onnx");
        assert_eq!(parsed.summary.total_images, 1);
        assert_eq!(parsed.results[0].result.status, ImageStatus::NoAnimalDetected);
        // The per-image result flattens into the report entry.
        assert!(contents.contains("\"status\": \"no_animal_detected\""));
    }
}
