//! Combined CSV batch report.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::error::Result;
use crate::output::ImageReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV report writer.
///
/// Emits one row per detection; images with no detections (or with errors)
/// get a single row carrying only the status so every submitted file appears
/// in the output.
pub struct CsvReportWriter {
    writer: BufWriter<File>,
}

impl CsvReportWriter {
    /// Create a new CSV writer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Write the column header.
    pub fn write_header(&mut self) -> Result<()> {
        writeln!(
            self.writer,
            "File,Status,Species,Detection Confidence,Classification Confidence,X1,Y1,X2,Y2"
        )?;
        Ok(())
    }

    /// Write all rows for one image report.
    pub fn write_report(&mut self, report: &ImageReport) -> Result<()> {
        let file = escape_csv(&report.file.display().to_string());
        let status = report.result.status;

        if report.result.detections.is_empty() {
            writeln!(self.writer, "{file},{status},,,,,,,")?;
            return Ok(());
        }

        for record in &report.result.detections {
            writeln!(
                self.writer,
                "{file},{status},{},{:.decimal$},{:.decimal$},{:.1},{:.1},{:.1},{:.1}",
                escape_csv(&record.species),
                record.detection_confidence,
                record.classification_confidence,
                record.bounding_box.x1,
                record.bounding_box.y1,
                record.bounding_box.x2,
                record.bounding_box.y2,
                decimal = DECIMAL_PLACES,
            )?;
        }

        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write the full batch as a CSV file.
pub fn write_csv_report(path: &Path, reports: &[ImageReport]) -> Result<()> {
    let mut writer = CsvReportWriter::new(path)?;
    writer.write_header()?;
    for report in reports {
        writer.write_report(report)?;
    }
    writer.finalize()
}

/// Escape a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::output::{BoundingBox, DetectionRecord, ImageResult};
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn fox_report() -> ImageReport {
        ImageReport {
            file: PathBuf::from("/data/trap01.jpg"),
            result: ImageResult::animals(vec![DetectionRecord {
                species: "red fox".to_string(),
                detection_confidence: 0.9123,
                classification_confidence: 0.8541,
                bounding_box: BoundingBox {
                    x1: 10.0,
                    y1: 20.0,
                    x2: 110.0,
                    y2: 220.0,
                },
            }]),
        }
    }

    #[test]
    fn test_one_row_per_detection() {
        let file = NamedTempFile::new().unwrap();
        write_csv_report(file.path(), &[fox_report()]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("File,Status,Species"));
        assert!(lines[1].contains("red fox"));
        assert!(lines[1].contains("animal_detected"));
        assert!(lines[1].contains("0.9123"));
    }

    #[test]
    fn test_empty_and_error_images_get_status_rows() {
        let file = NamedTempFile::new().unwrap();
        let reports = [
            ImageReport {
                file: PathBuf::from("empty.jpg"),
                result: ImageResult::no_animal(),
            },
            ImageReport {
                file: PathBuf::from("broken.jpg"),
                result: ImageResult::failure("decode failed"),
            },
        ];
        write_csv_report(file.path(), &reports).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("empty.jpg,no_animal_detected"));
        assert!(contents.contains("broken.jpg,error"));
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
